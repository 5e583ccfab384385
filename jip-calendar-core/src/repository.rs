//! In-memory event list for the current session.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::event::Event;

/// Authoritative event list. Every mutation swaps in a new `Arc`, so a
/// reader holding the previous list never sees it change, and pointer
/// comparison detects every mutation.
#[derive(Debug, Clone, Default)]
pub struct EventRepository {
    events: Arc<Vec<Event>>,
}

impl EventRepository {
    pub fn new(events: Vec<Event>) -> Self {
        EventRepository {
            events: Arc::new(events),
        }
    }

    pub fn events(&self) -> Arc<Vec<Event>> {
        Arc::clone(&self.events)
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Seed from the backend fetch.
    pub fn set_all(&mut self, events: Vec<Event>) {
        debug!(count = events.len(), "seeding event repository");
        self.events = Arc::new(events);
    }

    pub fn add(&mut self, event: Event) {
        let mut next = Vec::with_capacity(self.events.len() + 1);
        next.extend(self.events.iter().cloned());
        next.push(event);
        self.events = Arc::new(next);
    }

    /// Replace the event sharing `event.id`. Returns false (and leaves the
    /// list untouched) when no event has that id.
    pub fn update(&mut self, event: Event) -> bool {
        let Some(index) = self.events.iter().position(|e| e.id == event.id) else {
            debug!(id = %event.id, "update ignored, no such event");
            return false;
        };

        let mut next = self.events.as_ref().clone();
        next[index] = event;
        self.events = Arc::new(next);
        true
    }

    /// Returns false (and leaves the list untouched) when no event has `id`.
    pub fn remove(&mut self, id: &str) -> bool {
        if !self.events.iter().any(|e| e.id == id) {
            debug!(id, "remove ignored, no such event");
            return false;
        }

        let next: Vec<Event> = self.events.iter().filter(|e| e.id != id).cloned().collect();
        self.events = Arc::new(next);
        true
    }

    /// Distinct OPD names referenced by the loaded events, sorted.
    pub fn opd_names(&self) -> Vec<String> {
        self.events
            .iter()
            .map(|e| e.opd_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
