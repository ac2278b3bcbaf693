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

//! Booking coordination engine.
//!
//! The [`Engine`] is the central component that books seats and moves
//! reservations through their lifecycle. It coordinates the show's seat
//! inventory, the reservation store, and the audit ledger so that each
//! operation commits atomically or not at all.
//!
//! # Operations
//!
//! - **Booking**: Reserve seats on a show, creating a Pending reservation.
//! - **Confirmation**: Mark a pending reservation as paid.
//! - **Cancellation**: Retire a reservation and return its seats.
//! - **Completion**: Mark a confirmed reservation as redeemed.
//!
//! # Thread Safety
//!
//! Shows and reservations live in concurrent registries ([`ShowCatalog`],
//! [`ReservationStore`]); each entity guards its mutable state with its own
//! mutex. Operations against different shows run fully in parallel, while
//! operations against one show serialize on that show's seat lock. Locks are
//! always acquired show first, reservation second, ledger last, so no cycle
//! can form.

use crate::base::{ReservationId, ShowId};
use crate::catalog::ShowCatalog;
use crate::error::BookingError;
use crate::ledger::{EventLedger, EventSink, ReservationEvent};
use crate::reservation::{EventType, Reservation};
use crate::show::Show;
use crate::store::ReservationStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Tunable engine behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Longest a booking or cancellation waits for a show's seat lock
    /// before failing with [`BookingError::Timeout`].
    pub acquire_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            acquire_timeout: Duration::from_secs(2),
        }
    }
}

/// Seat booking engine that manages shows, reservations, and their audit
/// trail.
///
/// The engine processes operations sequentially per show while allowing
/// concurrent access across different shows.
///
/// # Invariants
///
/// - A show's available seats never drop below zero or exceed its capacity.
/// - Reservation statuses change only along the closed transition table.
/// - Every committed transition has exactly one ledger event, appended
///   before the transition becomes visible.
/// - Reservation ids are unique and assigned at admission; a booking the
///   durability sink rejects leaves a gap in the sequence.
pub struct Engine {
    /// Registered shows indexed by show ID.
    catalog: ShowCatalog,
    /// Every reservation ever booked, indexed by reservation ID.
    reservations: ReservationStore,
    /// Append-only audit trail of lifecycle events.
    ledger: EventLedger,
    /// Next reservation ID to hand out.
    next_reservation_id: AtomicU64,
    config: EngineConfig,
}

impl Engine {
    /// Creates a new engine with no shows or reservations and the default
    /// configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates a new engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Engine {
            catalog: ShowCatalog::new(),
            reservations: ReservationStore::new(),
            ledger: EventLedger::new(),
            next_reservation_id: AtomicU64::new(1),
            config,
        }
    }

    /// Creates a new engine whose ledger persists every event through
    /// `sink` before committing it.
    pub fn with_sink(sink: Box<dyn EventSink>) -> Self {
        let mut engine = Self::new();
        engine.ledger = EventLedger::with_sink(sink);
        engine
    }

    /// Registers a new show with a fixed seat capacity.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidCapacity`] - `total_seats` is zero.
    /// - [`BookingError::DuplicateShow`] - A show with this id exists.
    pub fn add_show(
        &self,
        id: ShowId,
        movie_title: &str,
        room: &str,
        price_cents: u32,
        total_seats: u32,
    ) -> Result<Arc<Show>, BookingError> {
        if total_seats == 0 {
            return Err(BookingError::InvalidCapacity);
        }
        let show = self
            .catalog
            .insert(Show::new(id, movie_title, room, price_cents, total_seats))?;

        info!(
            "Added show {}: {} in {} ({} seats)",
            id, movie_title, room, total_seats
        );
        Ok(show)
    }

    /// Books `seats` seats on a show, creating a `Pending` reservation.
    ///
    /// The seat decrement, the `created` ledger event, and the reservation
    /// record commit together: on any failure nothing is reserved, stored,
    /// or logged.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ShowNotFound`] - No show with this id.
    /// - [`BookingError::Timeout`] - Seat lock not acquired within the
    ///   configured wait.
    /// - [`BookingError::InvalidSeatCount`] - `seats` is zero.
    /// - [`BookingError::InsufficientSeats`] - Fewer than `seats` seats left.
    /// - [`BookingError::DurabilityFault`] - The event sink rejected the
    ///   write; the seat decrement is rolled back.
    pub fn book_seats(
        &self,
        show_id: ShowId,
        customer_name: &str,
        seats: u32,
        source: &str,
        note: Option<&str>,
    ) -> Result<Arc<Reservation>, BookingError> {
        let show = self
            .catalog
            .get(show_id)
            .ok_or(BookingError::ShowNotFound(show_id))?;
        let mut inventory = match show.try_seats_for(self.config.acquire_timeout) {
            Some(guard) => guard,
            None => {
                warn!("Timed out waiting for show {}", show_id);
                return Err(BookingError::Timeout(show_id));
            }
        };

        let remaining = inventory.reserve(seats)?;

        // The id is assigned before the ledger write because the created
        // event must reference it.
        let reservation_id =
            ReservationId(self.next_reservation_id.fetch_add(1, Ordering::Relaxed));
        let event = match self
            .ledger
            .append(reservation_id, EventType::Created, source, note)
        {
            Ok(event) => event,
            Err(fault) => {
                // The booking never happened. Undo the seat decrement while
                // the show lock is still held, so no other caller saw it.
                let rolled_back = inventory.release(seats);
                debug_assert!(rolled_back.is_ok(), "rollback failed: {:?}", rolled_back);
                warn!("Durability fault while booking show {}: {}", show_id, fault);
                return Err(fault);
            }
        };

        let reservation = Arc::new(Reservation::new(
            reservation_id,
            show_id,
            customer_name,
            seats,
            event.occurred_at(),
        ));
        // Inserting into the store is the publish point: the id becomes
        // visible to confirm/cancel only after its created event is logged.
        self.reservations.insert(Arc::clone(&reservation));
        drop(inventory);

        info!(
            "Booked {} seat(s) on show {} for {} as reservation {} ({} left)",
            seats, show_id, customer_name, reservation_id, remaining
        );
        Ok(reservation)
    }

    /// Confirms a pending reservation.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ReservationNotFound`] - No reservation with this id.
    /// - [`BookingError::InvalidTransition`] - The reservation is not
    ///   `Pending`.
    /// - [`BookingError::DurabilityFault`] - The event sink rejected the
    ///   write; the status is unchanged.
    pub fn confirm(
        &self,
        reservation_id: ReservationId,
        source: &str,
        note: Option<&str>,
    ) -> Result<Arc<Reservation>, BookingError> {
        self.transition(reservation_id, EventType::Confirmed, source, note)
    }

    /// Completes a confirmed reservation after the show has run.
    ///
    /// Seats stay consumed: completion records that they were used, not
    /// that they became available again.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ReservationNotFound`] - No reservation with this id.
    /// - [`BookingError::InvalidTransition`] - The reservation is not
    ///   `Confirmed`.
    /// - [`BookingError::DurabilityFault`] - The event sink rejected the
    ///   write; the status is unchanged.
    pub fn complete(
        &self,
        reservation_id: ReservationId,
        source: &str,
        note: Option<&str>,
    ) -> Result<Arc<Reservation>, BookingError> {
        self.transition(reservation_id, EventType::Completed, source, note)
    }

    /// Cancels a pending or confirmed reservation, returning its seats to
    /// the show.
    ///
    /// The seat release, the `cancelled` ledger event, and the status
    /// change commit together.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ReservationNotFound`] - No reservation with this id.
    /// - [`BookingError::ShowNotFound`] - The show was removed after booking.
    /// - [`BookingError::Timeout`] - Seat lock not acquired within the
    ///   configured wait.
    /// - [`BookingError::InvalidTransition`] - The reservation is already
    ///   `Cancelled` or `Completed`.
    /// - [`BookingError::InvalidRelease`] - Releasing would exceed capacity,
    ///   which means the counter and the store disagree.
    /// - [`BookingError::DurabilityFault`] - The event sink rejected the
    ///   write; the seat release is rolled back.
    pub fn cancel(
        &self,
        reservation_id: ReservationId,
        source: &str,
        note: Option<&str>,
    ) -> Result<Arc<Reservation>, BookingError> {
        let reservation = self
            .reservations
            .get(reservation_id)
            .ok_or(BookingError::ReservationNotFound(reservation_id))?;
        let show_id = reservation.show_id();
        let show = self
            .catalog
            .get(show_id)
            .ok_or(BookingError::ShowNotFound(show_id))?;

        // Show lock first, then the reservation's, matching the global
        // acquisition order.
        let mut inventory = match show.try_seats_for(self.config.acquire_timeout) {
            Some(guard) => guard,
            None => {
                warn!("Timed out waiting for show {}", show_id);
                return Err(BookingError::Timeout(show_id));
            }
        };
        let mut state = reservation.state();

        let from = state.status();
        let next = from
            .next(EventType::Cancelled)
            .ok_or(BookingError::InvalidTransition {
                from,
                event: EventType::Cancelled,
            })?;

        let restored = inventory.release(reservation.seats())?;

        let event = match self
            .ledger
            .append(reservation_id, EventType::Cancelled, source, note)
        {
            Ok(event) => event,
            Err(fault) => {
                // The cancellation never happened. Take the seats back while
                // both locks are still held.
                let rolled_back = inventory.reserve(reservation.seats());
                debug_assert!(rolled_back.is_ok(), "rollback failed: {:?}", rolled_back);
                warn!(
                    "Durability fault while cancelling reservation {}: {}",
                    reservation_id, fault
                );
                return Err(fault);
            }
        };

        state.advance(next, event.occurred_at());
        drop(state);
        drop(inventory);

        info!(
            "Cancelled reservation {} ({} seat(s) back to show {}, {} available)",
            reservation_id,
            reservation.seats(),
            show_id,
            restored
        );
        Ok(reservation)
    }

    /// Removes a show from the catalog.
    ///
    /// This is an operator override outside the booking flow. Reservations
    /// against the show keep their records and ledger history, but
    /// cancelling one afterwards fails with `ShowNotFound`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ShowNotFound`] - No show with this id.
    pub fn remove_show(&self, id: ShowId) -> Result<Arc<Show>, BookingError> {
        let show = self
            .catalog
            .remove(id)
            .ok_or(BookingError::ShowNotFound(id))?;
        info!("Removed show {}", id);
        Ok(show)
    }

    /// Removes a reservation record without touching seats or the ledger.
    ///
    /// This is an operator override outside the booking flow; the audit
    /// trail keeps the removed reservation's events.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ReservationNotFound`] - No reservation with this id.
    pub fn remove_reservation(
        &self,
        id: ReservationId,
    ) -> Result<Arc<Reservation>, BookingError> {
        let reservation = self
            .reservations
            .remove(id)
            .ok_or(BookingError::ReservationNotFound(id))?;
        info!("Removed reservation {}", id);
        Ok(reservation)
    }

    /// Retrieves a show by ID, or `None` if it is not registered.
    pub fn get_show(&self, id: ShowId) -> Option<Arc<Show>> {
        self.catalog.get(id)
    }

    /// Returns all registered shows, sorted by ID.
    pub fn shows(&self) -> Vec<Arc<Show>> {
        self.catalog.shows()
    }

    /// Retrieves a reservation by ID, or `None` if it does not exist.
    pub fn get_reservation(&self, id: ReservationId) -> Option<Arc<Reservation>> {
        self.reservations.get(id)
    }

    /// Returns all reservations, sorted by ID.
    pub fn reservations(&self) -> Vec<Arc<Reservation>> {
        self.reservations.reservations()
    }

    /// Returns the reservations booked against one show, sorted by ID.
    pub fn reservations_for(&self, show_id: ShowId) -> Vec<Arc<Reservation>> {
        self.reservations.reservations_for(show_id)
    }

    /// Returns the audit events for one reservation, in the order they
    /// were appended.
    pub fn events_for(&self, reservation_id: ReservationId) -> Vec<ReservationEvent> {
        self.ledger.events_for(reservation_id)
    }

    /// Returns the full audit ledger, in append order.
    pub fn events(&self) -> Vec<ReservationEvent> {
        self.ledger.events()
    }

    /// Shared status-advance path for confirm and complete. Neither touches
    /// the seat inventory, so only the reservation and ledger locks are
    /// taken and bookings on the same show proceed in parallel.
    fn transition(
        &self,
        reservation_id: ReservationId,
        event_type: EventType,
        source: &str,
        note: Option<&str>,
    ) -> Result<Arc<Reservation>, BookingError> {
        let reservation = self
            .reservations
            .get(reservation_id)
            .ok_or(BookingError::ReservationNotFound(reservation_id))?;

        let mut state = reservation.state();
        let from = state.status();
        let next = from
            .next(event_type)
            .ok_or(BookingError::InvalidTransition {
                from,
                event: event_type,
            })?;

        let event = match self.ledger.append(reservation_id, event_type, source, note) {
            Ok(event) => event,
            Err(fault) => {
                warn!(
                    "Durability fault on reservation {} ({} event): {}",
                    reservation_id, event_type, fault
                );
                return Err(fault);
            }
        };

        state.advance(next, event.occurred_at());
        drop(state);

        info!("Reservation {} is now {}", reservation_id, next);
        Ok(reservation)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
