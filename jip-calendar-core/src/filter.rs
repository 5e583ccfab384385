//! Color and OPD filtering over the event repository.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::event::{Event, EventColor};
use crate::repository::EventRepository;

/// Restricts the visible events to one OPD, or none.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OpdScope {
    #[default]
    All,
    Only(String),
}

impl OpdScope {
    fn matches(&self, event: &Event) -> bool {
        match self {
            OpdScope::All => true,
            OpdScope::Only(name) => event.opd_name.eq_ignore_ascii_case(name),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColorFilter {
    selected: BTreeSet<EventColor>,
    opd: OpdScope,
}

impl ColorFilter {
    pub fn toggle(&mut self, color: EventColor) {
        if !self.selected.remove(&color) {
            self.selected.insert(color);
        }
    }

    /// Empty the color selection and reset the OPD scope to all.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.opd = OpdScope::All;
    }

    pub fn set_opd(&mut self, scope: OpdScope) {
        self.opd = scope;
    }

    pub fn opd(&self) -> &OpdScope {
        &self.opd
    }

    pub fn selected(&self) -> &BTreeSet<EventColor> {
        &self.selected
    }

    /// No color selected and no OPD scope: every event passes.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.opd == OpdScope::All
    }

    /// An empty color selection lets every color through.
    pub fn matches(&self, event: &Event) -> bool {
        let color_ok = self.selected.is_empty() || self.selected.contains(&event.color);
        color_ok && self.opd.matches(event)
    }

    pub fn apply(&self, events: &[Event]) -> Vec<Event> {
        events.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}

/// Repository plus filter, with the filtered list kept current.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    repository: EventRepository,
    filter: ColorFilter,
    visible: Arc<Vec<Event>>,
}

impl EventStore {
    pub fn new(events: Vec<Event>) -> Self {
        let mut store = EventStore {
            repository: EventRepository::new(events),
            ..EventStore::default()
        };
        store.refresh();
        store
    }

    pub fn repository(&self) -> &EventRepository {
        &self.repository
    }

    pub fn filter(&self) -> &ColorFilter {
        &self.filter
    }

    /// Every event in the repository.
    pub fn all(&self) -> Arc<Vec<Event>> {
        self.repository.events()
    }

    /// Events passing the current filter.
    pub fn visible(&self) -> Arc<Vec<Event>> {
        Arc::clone(&self.visible)
    }

    pub fn set_all(&mut self, events: Vec<Event>) {
        self.repository.set_all(events);
        self.refresh();
    }

    pub fn add(&mut self, event: Event) {
        self.repository.add(event);
        self.refresh();
    }

    pub fn update(&mut self, event: Event) -> bool {
        let changed = self.repository.update(event);
        if changed {
            self.refresh();
        }
        changed
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let changed = self.repository.remove(id);
        if changed {
            self.refresh();
        }
        changed
    }

    pub fn toggle_color(&mut self, color: EventColor) {
        self.filter.toggle(color);
        self.refresh();
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.refresh();
    }

    pub fn set_opd(&mut self, scope: OpdScope) {
        self.filter.set_opd(scope);
        self.refresh();
    }

    fn refresh(&mut self) {
        let all = self.repository.events();
        self.visible = if self.filter.is_empty() {
            all
        } else {
            Arc::new(self.filter.apply(&all))
        };
        debug!(
            total = self.repository.len(),
            visible = self.visible.len(),
            "recomputed visible events"
        );
    }
}
