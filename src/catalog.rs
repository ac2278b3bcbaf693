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

//! Concurrent registry of shows, keyed by id.

use crate::base::ShowId;
use crate::error::BookingError;
use crate::show::Show;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Holds every show the engine knows about. Lookups return shared
/// handles; the seat counter inside each show has its own lock, so the
/// map itself is only touched briefly.
pub struct ShowCatalog {
    shows: DashMap<ShowId, Arc<Show>>,
}

impl ShowCatalog {
    pub fn new() -> Self {
        Self {
            shows: DashMap::new(),
        }
    }

    /// Registers a show under its id. The id must be unused.
    pub fn insert(&self, show: Show) -> Result<Arc<Show>, BookingError> {
        match self.shows.entry(show.id()) {
            Entry::Occupied(entry) => Err(BookingError::DuplicateShow(*entry.key())),
            Entry::Vacant(entry) => {
                let show = Arc::new(show);
                entry.insert(Arc::clone(&show));
                Ok(show)
            }
        }
    }

    pub fn get(&self, id: ShowId) -> Option<Arc<Show>> {
        self.shows.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, id: ShowId) -> Option<Arc<Show>> {
        self.shows.remove(&id).map(|(_, show)| show)
    }

    /// All registered shows, sorted by id.
    pub fn shows(&self) -> Vec<Arc<Show>> {
        let mut shows: Vec<Arc<Show>> = self
            .shows
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        shows.sort_by_key(|show| show.id());
        shows
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }
}

impl Default for ShowCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_returns_the_same_show() {
        let catalog = ShowCatalog::new();
        let inserted = catalog
            .insert(Show::new(ShowId(1), "Alien", "Sala 1", 850, 50))
            .unwrap();

        let fetched = catalog.get(ShowId(1)).unwrap();
        assert!(Arc::ptr_eq(&inserted, &fetched));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let catalog = ShowCatalog::new();
        catalog
            .insert(Show::new(ShowId(1), "Alien", "Sala 1", 850, 50))
            .unwrap();

        let result = catalog.insert(Show::new(ShowId(1), "Aliens", "Sala 2", 900, 60));
        assert_eq!(result.unwrap_err(), BookingError::DuplicateShow(ShowId(1)));

        // The original stays registered.
        assert_eq!(catalog.get(ShowId(1)).unwrap().movie_title(), "Alien");
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn get_unknown_returns_none() {
        let catalog = ShowCatalog::new();
        assert!(catalog.get(ShowId(42)).is_none());
    }

    #[test]
    fn remove_deletes_the_entry() {
        let catalog = ShowCatalog::new();
        catalog
            .insert(Show::new(ShowId(1), "Alien", "Sala 1", 850, 50))
            .unwrap();

        let removed = catalog.remove(ShowId(1)).unwrap();
        assert_eq!(removed.id(), ShowId(1));
        assert!(catalog.get(ShowId(1)).is_none());
        assert!(catalog.is_empty());

        assert!(catalog.remove(ShowId(1)).is_none());
    }

    #[test]
    fn shows_are_sorted_by_id() {
        let catalog = ShowCatalog::new();
        for id in [3u32, 1, 2] {
            catalog
                .insert(Show::new(ShowId(id), "Alien", "Sala 1", 850, 50))
                .unwrap();
        }

        let ids: Vec<ShowId> = catalog.shows().iter().map(|show| show.id()).collect();
        assert_eq!(ids, vec![ShowId(1), ShowId(2), ShowId(3)]);
    }
}
