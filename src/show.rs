// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Show management and seat inventory.
//!
//! # Example
//!
//! ```
//! use cinema_booking_rs::{Show, ShowId};
//!
//! let show = Show::new(ShowId(1), "Alien", "Sala 1", 850, 50);
//! assert_eq!(show.available_seats(), 50);
//! ```

use crate::base::ShowId;
use crate::error::BookingError;
use parking_lot::{Mutex, MutexGuard};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::time::Duration;

/// Per-show available-seat counter.
///
/// Guarded by the show's mutex, so both operations are linearizable per
/// show: no two concurrent calls against the same show can observe or
/// produce an inconsistent intermediate count.
#[derive(Debug)]
pub struct SeatInventory {
    total_seats: u32,
    available_seats: u32,
}

impl SeatInventory {
    fn new(total_seats: u32) -> Self {
        Self {
            total_seats,
            available_seats: total_seats,
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.available_seats <= self.total_seats,
            "Invariant violated: available seats {} exceed capacity {}",
            self.available_seats,
            self.total_seats
        );
    }

    pub fn total_seats(&self) -> u32 {
        self.total_seats
    }

    pub fn available_seats(&self) -> u32 {
        self.available_seats
    }

    /// Takes `count` seats out of the available pool.
    ///
    /// Returns the new available count on success.
    pub fn reserve(&mut self, count: u32) -> Result<u32, BookingError> {
        if count == 0 {
            return Err(BookingError::InvalidSeatCount);
        }
        if count > self.available_seats {
            return Err(BookingError::InsufficientSeats {
                requested: count,
                available: self.available_seats,
            });
        }
        self.available_seats -= count;
        self.assert_invariants();
        Ok(self.available_seats)
    }

    /// Returns `count` seats to the available pool.
    ///
    /// Fails with `InvalidRelease` if more seats would be freed than are
    /// currently held, which would push the counter above capacity.
    pub fn release(&mut self, count: u32) -> Result<u32, BookingError> {
        if count == 0 {
            return Err(BookingError::InvalidSeatCount);
        }
        if count > self.total_seats - self.available_seats {
            return Err(BookingError::InvalidRelease {
                released: count,
                total: self.total_seats,
            });
        }
        self.available_seats += count;
        self.assert_invariants();
        Ok(self.available_seats)
    }
}

/// A scheduled screening with a fixed seat capacity.
///
/// Identity and metadata fields are immutable after creation. The seat
/// counter lives behind a mutex; it is the serialization point for all
/// bookings and cancellations against this show.
#[derive(Debug)]
pub struct Show {
    id: ShowId,
    movie_title: String,
    room: String,
    price_cents: u32,
    inner: Mutex<SeatInventory>,
}

impl Show {
    pub fn new(
        id: ShowId,
        movie_title: &str,
        room: &str,
        price_cents: u32,
        total_seats: u32,
    ) -> Self {
        Self {
            id,
            movie_title: movie_title.to_string(),
            room: room.to_string(),
            price_cents,
            inner: Mutex::new(SeatInventory::new(total_seats)),
        }
    }

    pub fn id(&self) -> ShowId {
        self.id
    }

    pub fn movie_title(&self) -> &str {
        &self.movie_title
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn price_cents(&self) -> u32 {
        self.price_cents
    }

    pub fn total_seats(&self) -> u32 {
        self.inner.lock().total_seats
    }

    pub fn available_seats(&self) -> u32 {
        self.inner.lock().available_seats
    }

    /// Locks the seat inventory unconditionally.
    pub fn seats(&self) -> MutexGuard<'_, SeatInventory> {
        self.inner.lock()
    }

    /// Locks the seat inventory, waiting at most `timeout` for callers
    /// ahead in line. Returns `None` when the wait expires.
    pub fn try_seats_for(&self, timeout: Duration) -> Option<MutexGuard<'_, SeatInventory>> {
        self.inner.try_lock_for(timeout)
    }
}

impl Serialize for Show {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let seats = self.inner.lock();
        let mut state = serializer.serialize_struct("Show", 6)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("movie_title", &self.movie_title)?;
        state.serialize_field("room", &self.room)?;
        state.serialize_field("price_cents", &self.price_cents)?;
        state.serialize_field("total_seats", &seats.total_seats)?;
        state.serialize_field("available_seats", &seats.available_seats)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === SeatInventory Internal Tests ===
    // These test the counter arithmetic directly.

    #[test]
    fn inventory_starts_full() {
        let inventory = SeatInventory::new(50);
        assert_eq!(inventory.total_seats(), 50);
        assert_eq!(inventory.available_seats(), 50);
    }

    #[test]
    fn reserve_decrements_available() {
        let mut inventory = SeatInventory::new(10);
        assert_eq!(inventory.reserve(6), Ok(4));
        assert_eq!(inventory.available_seats(), 4);
        assert_eq!(inventory.total_seats(), 10);
    }

    #[test]
    fn reserve_beyond_available_returns_error() {
        let mut inventory = SeatInventory::new(10);
        inventory.reserve(6).unwrap();

        let result = inventory.reserve(5);
        assert_eq!(
            result,
            Err(BookingError::InsufficientSeats {
                requested: 5,
                available: 4
            })
        );
        // Count unchanged on failure
        assert_eq!(inventory.available_seats(), 4);
    }

    #[test]
    fn reserve_exact_remaining_succeeds() {
        let mut inventory = SeatInventory::new(10);
        inventory.reserve(6).unwrap();
        assert_eq!(inventory.reserve(4), Ok(0));
        assert_eq!(inventory.available_seats(), 0);
    }

    #[test]
    fn reserve_zero_returns_error() {
        let mut inventory = SeatInventory::new(10);
        assert_eq!(inventory.reserve(0), Err(BookingError::InvalidSeatCount));
    }

    #[test]
    fn release_restores_available() {
        let mut inventory = SeatInventory::new(10);
        inventory.reserve(6).unwrap();
        assert_eq!(inventory.release(6), Ok(10));
        assert_eq!(inventory.available_seats(), 10);
    }

    #[test]
    fn release_more_than_held_returns_error() {
        let mut inventory = SeatInventory::new(10);
        inventory.reserve(3).unwrap();

        let result = inventory.release(4);
        assert_eq!(
            result,
            Err(BookingError::InvalidRelease {
                released: 4,
                total: 10
            })
        );
        assert_eq!(inventory.available_seats(), 7);
    }

    #[test]
    fn release_on_full_inventory_returns_error() {
        let mut inventory = SeatInventory::new(10);
        assert_eq!(
            inventory.release(1),
            Err(BookingError::InvalidRelease {
                released: 1,
                total: 10
            })
        );
    }

    #[test]
    fn release_zero_returns_error() {
        let mut inventory = SeatInventory::new(10);
        inventory.reserve(5).unwrap();
        assert_eq!(inventory.release(0), Err(BookingError::InvalidSeatCount));
    }

    // === Show Tests ===

    #[test]
    fn show_exposes_metadata() {
        let show = Show::new(ShowId(3), "Blade Runner", "Sala 2", 1200, 80);
        assert_eq!(show.id(), ShowId(3));
        assert_eq!(show.movie_title(), "Blade Runner");
        assert_eq!(show.room(), "Sala 2");
        assert_eq!(show.price_cents(), 1200);
        assert_eq!(show.total_seats(), 80);
        assert_eq!(show.available_seats(), 80);
    }

    #[test]
    fn guarded_reserve_is_visible_through_accessors() {
        let show = Show::new(ShowId(1), "Alien", "Sala 1", 850, 50);
        {
            let mut seats = show.seats();
            seats.reserve(30).unwrap();
        }
        assert_eq!(show.available_seats(), 20);
    }

    #[test]
    fn try_seats_for_times_out_when_held() {
        use std::sync::Arc;

        let show = Arc::new(Show::new(ShowId(1), "Alien", "Sala 1", 850, 50));
        let guard = show.seats();

        let contender = Arc::clone(&show);
        let handle = std::thread::spawn(move || {
            contender.try_seats_for(Duration::from_millis(50)).is_some()
        });

        assert!(!handle.join().unwrap(), "lock should not be acquirable");
        drop(guard);

        assert!(show.try_seats_for(Duration::from_millis(50)).is_some());
    }

    // === Serialization Tests ===

    #[test]
    fn serializer_snapshots_current_availability() {
        let show = Show::new(ShowId(1), "Alien", "Sala 1", 850, 50);
        show.seats().reserve(8).unwrap();

        let json = serde_json::to_string(&show).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["id"], 1);
        assert_eq!(parsed["movie_title"], "Alien");
        assert_eq!(parsed["room"], "Sala 1");
        assert_eq!(parsed["price_cents"], 850);
        assert_eq!(parsed["total_seats"], 50);
        assert_eq!(parsed["available_seats"], 42);
    }
}
