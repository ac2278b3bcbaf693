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

//! Append-only audit ledger of reservation lifecycle events.
//!
//! Events carry ledger-wide monotonic ids and timestamps: a later event
//! never has a smaller id or an earlier `occurred_at` than any event
//! appended before it, regardless of which reservation it belongs to.

use crate::base::{EventId, ReservationId};
use crate::error::BookingError;
use crate::reservation::EventType;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;

/// One recorded lifecycle event.
///
/// Events are immutable once appended. `source` names the channel the
/// operation came from (`"web"`, `"box-office"`), `note` is free-form
/// operator context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationEvent {
    id: EventId,
    reservation_id: ReservationId,
    event_type: EventType,
    source: String,
    note: Option<String>,
    occurred_at: DateTime<Utc>,
}

impl ReservationEvent {
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn reservation_id(&self) -> ReservationId {
        self.reservation_id
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

/// Durable destination for appended events.
///
/// The ledger persists every event through its sink before committing it
/// to memory. A sink error aborts the append: the event gets no id, is
/// not stored, and the caller sees [`BookingError::DurabilityFault`].
pub trait EventSink: Send + Sync {
    fn persist(&self, event: &ReservationEvent) -> io::Result<()>;
}

struct LedgerData {
    next_id: u64,
    last_occurred_at: DateTime<Utc>,
    events: Vec<ReservationEvent>,
    by_reservation: HashMap<ReservationId, Vec<usize>>,
}

/// The ledger itself. One mutex guards all of its state, which is what
/// makes the id sequence and timestamp ordering ledger-wide.
pub struct EventLedger {
    inner: Mutex<LedgerData>,
    sink: Option<Box<dyn EventSink>>,
}

impl EventLedger {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LedgerData {
                next_id: 1,
                last_occurred_at: DateTime::<Utc>::MIN_UTC,
                events: Vec::new(),
                by_reservation: HashMap::new(),
            }),
            sink: None,
        }
    }

    pub fn with_sink(sink: Box<dyn EventSink>) -> Self {
        let mut ledger = Self::new();
        ledger.sink = Some(sink);
        ledger
    }

    /// Appends one event, assigning the next id and a timestamp no
    /// earlier than the previous event's.
    ///
    /// With a sink attached the event is persisted first. Persist
    /// failures leave the ledger untouched: the id is not consumed and
    /// nothing is stored.
    pub fn append(
        &self,
        reservation_id: ReservationId,
        event_type: EventType,
        source: &str,
        note: Option<&str>,
    ) -> Result<ReservationEvent, BookingError> {
        let mut guard = self.inner.lock();
        let data = &mut *guard;

        // Wall clocks can step backwards; the recorded timestamp never does.
        let occurred_at = Utc::now().max(data.last_occurred_at);
        let event = ReservationEvent {
            id: EventId(data.next_id),
            reservation_id,
            event_type,
            source: source.to_string(),
            note: note.map(str::to_string),
            occurred_at,
        };

        if let Some(sink) = &self.sink {
            sink.persist(&event)
                .map_err(|err| BookingError::DurabilityFault(err.to_string()))?;
        }

        data.next_id += 1;
        data.last_occurred_at = occurred_at;
        data.by_reservation
            .entry(reservation_id)
            .or_default()
            .push(data.events.len());
        data.events.push(event.clone());

        Ok(event)
    }

    /// All events for one reservation, in append order.
    pub fn events_for(&self, reservation_id: ReservationId) -> Vec<ReservationEvent> {
        let data = self.inner.lock();
        match data.by_reservation.get(&reservation_id) {
            Some(indices) => indices.iter().map(|&i| data.events[i].clone()).collect(),
            None => Vec::new(),
        }
    }

    /// Every event in the ledger, in append order.
    pub fn events(&self) -> Vec<ReservationEvent> {
        self.inner.lock().events.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().events.is_empty()
    }
}

impl Default for EventLedger {
    fn default() -> Self {
        Self::new()
    }
}
