//! Drag-and-drop rescheduling.
//!
//! One drag at a time: `Idle -> Dragging -> Idle`. A drop computes a shifted
//! copy of the event; committing it is the caller's job.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::event::{Event, truncate_to_minute};

/// Where an event was dropped. Month/year cells carry only a date; time-grid
/// slots also carry the hour and minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl DropTarget {
    pub fn day(date: NaiveDate) -> Self {
        DropTarget { date, time: None }
    }

    pub fn slot(date: NaiveDate, time: NaiveTime) -> Self {
        DropTarget {
            date,
            time: Some(time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(Event),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// The event with its new start/end, ready to commit
    Rescheduled(Event),
    /// Dropped where it already was
    Unchanged,
    /// No drag in progress, invalid target or cancelled
    Cancelled,
}

/// Shift `event` to `target`, keeping its duration. Without a target time the
/// original time of day is kept.
pub fn reschedule(event: &Event, target: DropTarget) -> Event {
    let time = target.time.unwrap_or_else(|| event.start.time());
    let start = truncate_to_minute(NaiveDateTime::new(target.date, time));

    Event {
        start,
        end: start + event.duration(),
        ..event.clone()
    }
}

#[derive(Debug, Default)]
pub struct Rescheduler {
    state: DragState,
}

impl Rescheduler {
    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Begin dragging `event`. Ignored (returns false) while another drag is
    /// in progress.
    pub fn start_drag(&mut self, event: Event) -> bool {
        if let DragState::Dragging(current) = &self.state {
            debug!(current = %current.id, ignored = %event.id, "drag already in progress");
            return false;
        }
        debug!(id = %event.id, "drag started");
        self.state = DragState::Dragging(event);
        true
    }

    /// Finish the drag. `None` means the pointer was released outside any
    /// valid target. Always returns to idle.
    pub fn drop_on(&mut self, target: Option<DropTarget>) -> DropOutcome {
        let DragState::Dragging(event) = std::mem::take(&mut self.state) else {
            return DropOutcome::Cancelled;
        };

        let Some(target) = target else {
            debug!(id = %event.id, "dropped outside any target");
            return DropOutcome::Cancelled;
        };

        let moved = reschedule(&event, target);
        if moved.start == event.start {
            DropOutcome::Unchanged
        } else {
            DropOutcome::Rescheduled(moved)
        }
    }

    pub fn cancel(&mut self) {
        if self.is_dragging() {
            debug!("drag cancelled");
        }
        self.state = DragState::Idle;
    }
}
