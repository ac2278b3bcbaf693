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

//! Concurrent registry of reservations, keyed by id.

use crate::base::{ReservationId, ShowId};
use crate::reservation::Reservation;
use dashmap::DashMap;
use std::sync::Arc;

/// Holds every reservation ever booked, terminal ones included. Ids are
/// assigned by the engine, so inserts never collide.
pub struct ReservationStore {
    reservations: DashMap<ReservationId, Arc<Reservation>>,
}

impl ReservationStore {
    pub fn new() -> Self {
        Self {
            reservations: DashMap::new(),
        }
    }

    pub fn insert(&self, reservation: Arc<Reservation>) {
        let previous = self
            .reservations
            .insert(reservation.id(), reservation);
        debug_assert!(previous.is_none(), "reservation id reused");
    }

    pub fn get(&self, id: ReservationId) -> Option<Arc<Reservation>> {
        self.reservations
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, id: ReservationId) -> Option<Arc<Reservation>> {
        self.reservations.remove(&id).map(|(_, reservation)| reservation)
    }

    /// All reservations, sorted by id.
    pub fn reservations(&self) -> Vec<Arc<Reservation>> {
        let mut reservations: Vec<Arc<Reservation>> = self
            .reservations
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        reservations.sort_by_key(|reservation| reservation.id());
        reservations
    }

    /// Reservations booked against one show, sorted by id.
    pub fn reservations_for(&self, show_id: ShowId) -> Vec<Arc<Reservation>> {
        let mut reservations: Vec<Arc<Reservation>> = self
            .reservations
            .iter()
            .filter(|entry| entry.value().show_id() == show_id)
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        reservations.sort_by_key(|reservation| reservation.id());
        reservations
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }
}

impl Default for ReservationStore {
    fn default() -> Self {
        Self::new()
    }
}
