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

//! # Cinema Booking
//!
//! This library provides a seat-inventory booking engine for cinema shows:
//! atomic seat reservation against a fixed capacity, a reservation lifecycle
//! state machine, and an append-only audit ledger of every transition.
//!
//! ## Core Components
//!
//! - [`Engine`]: Central coordinator that books, confirms, cancels, and completes reservations
//! - [`Show`]: A screening with a mutex-guarded seat counter ([`SeatInventory`])
//! - [`Reservation`]: A customer's seats plus their lifecycle status
//! - [`EventLedger`]: Append-only, strictly ordered audit trail
//! - [`BookingError`]: Error types for rejected operations
//!
//! ## Example
//!
//! ```
//! use cinema_booking_rs::{Engine, ReservationStatus, ShowId};
//!
//! let engine = Engine::new();
//! engine.add_show(ShowId(1), "Alien", "Sala 1", 850, 50).unwrap();
//!
//! // Book two seats
//! let reservation = engine
//!     .book_seats(ShowId(1), "Ana", 2, "web", None)
//!     .unwrap();
//! assert_eq!(reservation.status(), ReservationStatus::Pending);
//!
//! // The seats come off the show immediately
//! let show = engine.get_show(ShowId(1)).unwrap();
//! assert_eq!(show.available_seats(), 48);
//!
//! // Cancelling puts them back
//! engine.cancel(reservation.id(), "web", None).unwrap();
//! assert_eq!(show.available_seats(), 50);
//! ```
//!
//! ## Thread Safety
//!
//! The engine serializes operations per show while different shows proceed
//! fully in parallel; see [`Engine`] for the lock ordering rules.

mod base;
mod catalog;
mod engine;
pub mod error;
mod ledger;
mod reservation;
pub mod show;
mod store;

pub use base::{EventId, ReservationId, ShowId};
pub use catalog::ShowCatalog;
pub use engine::{Engine, EngineConfig};
pub use error::BookingError;
pub use ledger::{EventLedger, EventSink, ReservationEvent};
pub use reservation::{EventType, Reservation, ReservationState, ReservationStatus};
pub use show::{SeatInventory, Show};
pub use store::ReservationStore;
