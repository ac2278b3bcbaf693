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

//! Reservation lifecycle management.
//!
//! Reservations follow a state machine; `Cancelled` and `Completed` are
//! terminal. Every legal transition is a row in [`ReservationStatus::next`];
//! anything else is rejected by the engine before any state is written.
//
//  Pending ──confirm──► Confirmed ──complete──► Completed
//     │                     │
//     └───────cancel────────┴──────► Cancelled

use crate::base::{ReservationId, ShowId};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a reservation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

/// Lifecycle event recorded in the audit ledger.
///
/// `Created` only ever produces the initial `Pending` status; it is never a
/// legal event on an existing reservation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Created,
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    /// Returns the status a reservation moves to when `event` is applied,
    /// or `None` when the event is not a legal transition from `self`.
    ///
    /// This is the closed transition table: the four `Some` rows below are
    /// the only legal transitions in the system.
    pub fn next(self, event: EventType) -> Option<ReservationStatus> {
        match (self, event) {
            (Self::Pending, EventType::Confirmed) => Some(Self::Confirmed),
            (Self::Pending, EventType::Cancelled) => Some(Self::Cancelled),
            (Self::Confirmed, EventType::Cancelled) => Some(Self::Cancelled),
            (Self::Confirmed, EventType::Completed) => Some(Self::Completed),
            _ => None,
        }
    }

    /// Whether a reservation in this status still counts against the show's
    /// available seats.
    ///
    /// Completed reservations keep their seats consumed: the show has
    /// occurred and the seats were used. Only cancellation returns seats.
    pub fn holds_seats(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Whether no further transition is possible from this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Mutable lifecycle state of a reservation, guarded by its mutex.
#[derive(Debug)]
pub struct ReservationState {
    status: ReservationStatus,
    updated_at: DateTime<Utc>,
}

impl ReservationState {
    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Records a validated transition.
    ///
    /// Callers check [`ReservationStatus::next`] before writing anything;
    /// `advance` only records the outcome. `at` comes from the ledger event
    /// that accompanies the transition, so it never moves backwards.
    pub fn advance(&mut self, to: ReservationStatus, at: DateTime<Utc>) {
        debug_assert!(
            at >= self.updated_at,
            "Invariant violated: updated_at went backwards: {} -> {}",
            self.updated_at,
            at
        );
        self.status = to;
        self.updated_at = at;
    }
}

/// A customer's claim on a number of seats for a show.
///
/// Identity fields (`id`, `show_id`, `customer_name`, `seats`, `created_at`)
/// are immutable for the lifetime of the reservation; the status pair lives
/// behind a mutex and changes only through engine-mediated transitions.
#[derive(Debug)]
pub struct Reservation {
    id: ReservationId,
    show_id: ShowId,
    customer_name: String,
    seats: u32,
    created_at: DateTime<Utc>,
    inner: Mutex<ReservationState>,
}

impl Reservation {
    /// Creates a new `Pending` reservation.
    ///
    /// `created_at` is the timestamp of the `created` ledger event, so the
    /// reservation and its first audit record always agree.
    pub fn new(
        id: ReservationId,
        show_id: ShowId,
        customer_name: &str,
        seats: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            show_id,
            customer_name: customer_name.to_string(),
            seats,
            created_at,
            inner: Mutex::new(ReservationState {
                status: ReservationStatus::Pending,
                updated_at: created_at,
            }),
        }
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn show_id(&self) -> ShowId {
        self.show_id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn seats(&self) -> u32 {
        self.seats
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> ReservationStatus {
        self.inner.lock().status
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.inner.lock().updated_at
    }

    /// Locks the lifecycle state for a transition or a coherent multi-field
    /// read. Held only for short critical sections; acquired after the
    /// show's seat lock and before the ledger lock, never the other way.
    pub fn state(&self) -> MutexGuard<'_, ReservationState> {
        self.inner.lock()
    }
}
