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

//! Error types for booking operations.

use crate::base::{ReservationId, ShowId};
use crate::reservation::{EventType, ReservationStatus};
use thiserror::Error;

/// Booking operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Referenced show ID does not exist
    #[error("show {0} not found")]
    ShowNotFound(ShowId),

    /// Referenced reservation ID does not exist
    #[error("reservation {0} not found")]
    ReservationNotFound(ReservationId),

    /// A show with this ID already exists in the catalog
    #[error("show {0} already exists")]
    DuplicateShow(ShowId),

    /// Seat count is zero
    #[error("seat count must be positive")]
    InvalidSeatCount,

    /// Show capacity is zero
    #[error("total seats must be positive")]
    InvalidCapacity,

    /// Booking would exceed the show's available seats
    #[error("insufficient seats (requested {requested}, available {available})")]
    InsufficientSeats { requested: u32, available: u32 },

    /// The event is not a legal transition from the reservation's status
    #[error("invalid transition: {event} event on {from} reservation")]
    InvalidTransition {
        from: ReservationStatus,
        event: EventType,
    },

    /// Seat release would push the counter above capacity
    #[error("invalid release: freeing {released} seats would exceed capacity {total}")]
    InvalidRelease { released: u32, total: u32 },

    /// Show serialization point not acquired within the configured wait
    #[error("timed out waiting for show {0}")]
    Timeout(ShowId),

    /// Ledger sink write could not be made persistent
    #[error("durability fault: {0}")]
    DurabilityFault(String),
}
