//! Calendar session state and the user actions that change it.
//!
//! Every mutation is sent to the backend first and only applied to the local
//! repository once the backend confirms it. A failed call leaves local state
//! exactly as it was and hands the error back for the caller to show.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{CalendarError, CalendarResult};
use crate::event::{Event, EventColor, EventRecord};
use crate::filter::{EventStore, OpdScope};
use crate::form::EventDraft;
use crate::grid::{CalendarCell, Direction, build_cells, navigate, visible_range};
use crate::layout::{
    AgendaGroup, MonthLayout, TimeBlock, classify, group_agenda, layout_time_grid,
    position_for_month,
};
use crate::remote::EventBackend;
use crate::reschedule::{DropOutcome, DropTarget, Rescheduler};
use crate::settings::{CalendarSettings, SettingsSlot, SettingsStore};
use crate::view::ViewMode;

struct LayoutCache {
    events: Arc<Vec<Event>>,
    reference: NaiveDate,
    layout: MonthLayout,
}

fn decode_record(raw: Value) -> Option<Event> {
    let id = raw.get("id").map(Value::to_string).unwrap_or_default();
    serde_json::from_value::<EventRecord>(raw)
        .map_err(|e| CalendarError::Serialization(e.to_string()))
        .and_then(EventRecord::into_event)
        .inspect_err(|e| warn!(%id, error = %e, "skipping unreadable event"))
        .ok()
}

pub struct CalendarController<B: EventBackend, S: SettingsSlot> {
    backend: B,
    store: EventStore,
    settings: SettingsStore<S>,
    rescheduler: Rescheduler,
    reference: NaiveDate,
    known_opds: Vec<String>,
    layout_cache: Option<LayoutCache>,
}

impl<B: EventBackend, S: SettingsSlot> CalendarController<B, S> {
    pub fn new(backend: B, settings_slot: S, reference: NaiveDate) -> Self {
        CalendarController {
            backend,
            store: EventStore::default(),
            settings: SettingsStore::open(settings_slot),
            rescheduler: Rescheduler::default(),
            reference,
            known_opds: Vec::new(),
            layout_cache: None,
        }
    }

    // LOADING:

    /// Replace the session's events with the backend's list. Records that are
    /// malformed or carry unparseable dates are skipped. Returns the number
    /// loaded.
    pub async fn load_events(&mut self) -> CalendarResult<usize> {
        let records = self.backend.fetch_events().await?;
        let events: Vec<Event> = records.into_iter().filter_map(decode_record).collect();

        let count = events.len();
        self.store.set_all(events);
        info!(count, "loaded events");
        Ok(count)
    }

    pub async fn load_opds(&mut self) -> CalendarResult<&[String]> {
        self.known_opds = self.backend.list_opd_names().await?;
        Ok(&self.known_opds)
    }

    pub fn known_opds(&self) -> &[String] {
        &self.known_opds
    }

    // MUTATIONS:

    pub async fn create(&mut self, draft: &EventDraft) -> CalendarResult<Event> {
        let valid = draft.validate(&self.known_opds)?;

        let returned_id = self
            .backend
            .create_event(valid.to_payload())
            .await
            .inspect_err(|e| warn!(error = %e, "create failed"))?;

        let id = returned_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let event = valid.into_event(id);
        self.store.add(event.clone());
        info!(id = %event.id, title = %event.title, "event created");
        Ok(event)
    }

    pub async fn update(&mut self, id: &str, draft: &EventDraft) -> CalendarResult<Event> {
        if self.store.repository().get(id).is_none() {
            return Err(CalendarError::EventNotFound(id.to_string()));
        }

        let event = draft.validate(&self.known_opds)?.into_event(id.to_string());
        self.commit_update(event).await
    }

    pub async fn delete(&mut self, id: &str) -> CalendarResult<()> {
        if self.store.repository().get(id).is_none() {
            return Err(CalendarError::EventNotFound(id.to_string()));
        }

        self.backend
            .delete_event(id)
            .await
            .inspect_err(|e| warn!(id, error = %e, "delete failed"))?;

        self.store.remove(id);
        info!(id, "event deleted");
        Ok(())
    }

    async fn commit_update(&mut self, event: Event) -> CalendarResult<Event> {
        self.backend
            .update_event(&event.id, event.to_payload())
            .await
            .inspect_err(|e| warn!(id = %event.id, error = %e, "update failed"))?;

        if !self.store.update(event.clone()) {
            // Removed locally while the request was in flight
            return Err(CalendarError::EventNotFound(event.id));
        }
        info!(id = %event.id, start = %event.start, end = %event.end, "event updated");
        Ok(event)
    }

    // DRAG AND DROP:

    /// Start dragging the event with `id`. False if it does not exist or
    /// another drag is in progress.
    pub fn begin_drag(&mut self, id: &str) -> bool {
        match self.store.repository().get(id) {
            Some(event) => self.rescheduler.start_drag(event.clone()),
            None => false,
        }
    }

    pub fn cancel_drag(&mut self) {
        self.rescheduler.cancel();
    }

    pub fn is_dragging(&self) -> bool {
        self.rescheduler.is_dragging()
    }

    /// Drop the dragged event. Returns the moved event once the backend has
    /// accepted it, or `None` when nothing moved.
    pub async fn drop_on(&mut self, target: Option<DropTarget>) -> CalendarResult<Option<Event>> {
        match self.rescheduler.drop_on(target) {
            DropOutcome::Rescheduled(moved) => self.commit_update(moved).await.map(Some),
            DropOutcome::Unchanged | DropOutcome::Cancelled => Ok(None),
        }
    }

    /// Drag-and-drop in one step, for callers without pointer events.
    pub async fn move_event(
        &mut self,
        id: &str,
        target: DropTarget,
    ) -> CalendarResult<Option<Event>> {
        if !self.begin_drag(id) {
            return Err(CalendarError::EventNotFound(id.to_string()));
        }
        self.drop_on(Some(target)).await
    }

    // FILTERS:

    pub fn toggle_color(&mut self, color: EventColor) {
        self.store.toggle_color(color);
    }

    pub fn clear_filter(&mut self) {
        self.store.clear_filter();
    }

    pub fn set_opd_scope(&mut self, scope: OpdScope) {
        self.store.set_opd(scope);
    }

    // VIEW + SETTINGS:

    pub fn settings(&self) -> CalendarSettings {
        self.settings.load()
    }

    pub fn save_settings(&mut self, next: CalendarSettings) -> CalendarResult<()> {
        self.settings.save(next)
    }

    pub fn view(&self) -> ViewMode {
        self.settings.load().view
    }

    pub fn set_view(&mut self, view: ViewMode) -> CalendarResult<()> {
        self.settings.set_view(view)
    }

    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    pub fn set_reference(&mut self, date: NaiveDate) {
        self.reference = date;
    }

    pub fn navigate(&mut self, direction: Direction) {
        self.reference = navigate(self.reference, self.view(), direction);
    }

    // DERIVED DATA:

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn visible_events(&self) -> Arc<Vec<Event>> {
        self.store.visible()
    }

    /// Visible events intersecting the current view's date range.
    pub fn events_in_view(&self) -> Vec<Event> {
        let (from, to) = visible_range(self.reference, self.view());
        self.store
            .visible()
            .iter()
            .filter(|e| e.touches_range(from, to))
            .cloned()
            .collect()
    }

    pub fn cells(&self) -> Vec<CalendarCell> {
        build_cells(self.reference, self.view())
    }

    /// Month layout for the reference date, recomputed only when the visible
    /// events or the reference date changed.
    pub fn month_layout(&mut self) -> &MonthLayout {
        let events = self.store.visible();
        let fresh = self
            .layout_cache
            .as_ref()
            .is_some_and(|c| Arc::ptr_eq(&c.events, &events) && c.reference == self.reference);

        if !fresh {
            self.layout_cache = None;
        }

        let reference = self.reference;
        let cache = self.layout_cache.get_or_insert_with(|| {
            let classified = classify(&events);
            LayoutCache {
                layout: position_for_month(
                    &classified.multi_day,
                    &classified.single_day,
                    reference,
                ),
                events,
                reference,
            }
        });
        &cache.layout
    }

    /// Blocks for everything with a time of its own on `day`: single-day
    /// events and the partial first/last days of multi-day ones. Days a
    /// multi-day event fills completely are left to the all-day row.
    pub fn time_blocks(&self, day: NaiveDate) -> Vec<TimeBlock> {
        let timed: Vec<Event> = self
            .store
            .visible()
            .iter()
            .filter(|e| !e.fills_day(day))
            .cloned()
            .collect();
        layout_time_grid(&timed, day)
    }

    pub fn agenda(&self) -> Vec<AgendaGroup> {
        group_agenda(&self.events_in_view(), self.settings.load().agenda_mode_group_by)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Field;
    use crate::event::tests::at;
    use crate::event::{EntityId, EventPayload};
    use serde_json::json;
    use crate::settings::MemorySlot;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct MockBackend {
        records: Vec<Value>,
        fail: AtomicBool,
        assign_ids: bool,
        calls: Mutex<Vec<String>>,
    }

    impl MockBackend {
        fn log(&self, call: String) -> CalendarResult<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail.load(Ordering::SeqCst) {
                Err(CalendarError::Backend("HTTP 500".into()))
            } else {
                Ok(())
            }
        }
    }

    impl EventBackend for MockBackend {
        async fn fetch_events(&self) -> CalendarResult<Vec<Value>> {
            self.log("fetch".into())?;
            Ok(self.records.clone())
        }

        async fn create_event(&self, payload: EventPayload) -> CalendarResult<Option<String>> {
            self.log(format!("create {}", payload.title))?;
            Ok(self.assign_ids.then(|| "srv-1".to_string()))
        }

        async fn update_event(&self, id: &str, payload: EventPayload) -> CalendarResult<()> {
            self.log(format!("update {} {}", id, payload.start_date))
        }

        async fn delete_event(&self, id: &str) -> CalendarResult<()> {
            self.log(format!("delete {}", id))
        }

        async fn list_opd_names(&self) -> CalendarResult<Vec<String>> {
            self.log("opds".into())?;
            Ok(vec!["Diskominfo".into(), "Bappeda".into()])
        }
    }

    fn record(id: &str, start: &str, end: &str, color: &str) -> Value {
        serde_json::to_value(EventRecord {
            id: EntityId::Text(id.into()),
            title: format!("Kegiatan {}", id),
            description: None,
            opd_name: "Diskominfo".into(),
            start_date: start.into(),
            end_date: end.into(),
            color: Some(color.into()),
        })
        .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn loaded(backend: MockBackend) -> CalendarController<MockBackend, MemorySlot> {
        let mut controller =
            CalendarController::new(backend, MemorySlot::default(), date(2025, 10, 6));
        controller.load_events().await.unwrap();
        controller
    }

    fn seeded() -> MockBackend {
        MockBackend {
            records: vec![
                record("e1", "2025-10-06T09:00:00", "2025-10-06T11:30:00", "blue"),
                record("e2", "2025-10-10T08:00:00", "2025-10-12T17:00:00", "red"),
                record("bad", "kemarin", "2025-10-12T17:00:00", "red"),
            ],
            assign_ids: true,
            ..MockBackend::default()
        }
    }

    fn draft(title: &str) -> EventDraft {
        EventDraft {
            title: title.into(),
            opd_name: "Bappeda".into(),
            description: None,
            start: Some(at(2025, 10, 20, 13, 0)),
            end: Some(at(2025, 10, 20, 15, 0)),
            color: EventColor::Orange,
        }
    }

    #[tokio::test]
    async fn load_skips_unreadable_records() {
        let controller = loaded(seeded()).await;
        assert_eq!(controller.store().all().len(), 2);
    }

    #[tokio::test]
    async fn load_keeps_numeric_ids_and_drops_records_without_title() {
        let backend = MockBackend {
            records: vec![
                json!({"id": 42, "title": "Bimtek SPBE", "opdName": "Diskominfo",
                       "startDate": "2025-10-07T09:00:00", "endDate": "2025-10-07T12:00:00"}),
                json!({"id": "e9", "opdName": "Dinkes",
                       "startDate": "2025-10-08T09:00:00", "endDate": "2025-10-08T10:00:00"}),
                json!({"id": "e10", "title": null, "opdName": null}),
            ],
            ..MockBackend::default()
        };
        let mut controller =
            CalendarController::new(backend, MemorySlot::default(), date(2025, 10, 6));

        assert_eq!(controller.load_events().await.unwrap(), 1);
        let event = controller.store().repository().get("42").unwrap();
        assert_eq!(event.title, "Bimtek SPBE");
    }

    #[tokio::test]
    async fn overnight_event_gets_a_block_on_both_days() {
        let backend = MockBackend {
            records: vec![
                record("night", "2025-10-10T23:00:00", "2025-10-11T01:00:00", "purple"),
                record("e2", "2025-10-09T08:00:00", "2025-10-12T17:00:00", "red"),
            ],
            ..MockBackend::default()
        };
        let controller = loaded(backend).await;

        let friday = controller.time_blocks(date(2025, 10, 10));
        let night = friday.iter().find(|b| b.event_id == "night").unwrap();
        assert_eq!((night.start_minute, night.end_minute), (23 * 60, 24 * 60));
        // e2 fills the 10th, so it stays out of the time grid there
        assert!(friday.iter().all(|b| b.event_id != "e2"));

        let saturday = controller.time_blocks(date(2025, 10, 11));
        let night = saturday.iter().find(|b| b.event_id == "night").unwrap();
        assert_eq!((night.start_minute, night.end_minute), (0, 60));

        let sunday = controller.time_blocks(date(2025, 10, 12));
        let last_day = sunday.iter().find(|b| b.event_id == "e2").unwrap();
        assert_eq!((last_day.start_minute, last_day.end_minute), (0, 17 * 60));
    }

    #[tokio::test]
    async fn create_commits_after_backend_confirms() {
        let mut controller = loaded(seeded()).await;
        let created = controller.create(&draft("Survey titik JIP")).await.unwrap();
        assert_eq!(created.id, "srv-1");
        assert_eq!(controller.store().all().len(), 3);
    }

    #[tokio::test]
    async fn create_falls_back_to_generated_id() {
        let mut controller = loaded(MockBackend::default()).await;
        let created = controller.create(&draft("Survey")).await.unwrap();
        assert!(uuid::Uuid::parse_str(&created.id).is_ok());
    }

    #[tokio::test]
    async fn failed_create_leaves_repository_untouched() {
        let mut controller = loaded(seeded()).await;
        let before = controller.store().all();
        controller.backend.fail.store(true, Ordering::SeqCst);

        let result = controller.create(&draft("Survey")).await;
        assert!(matches!(result, Err(CalendarError::Backend(_))));
        assert!(Arc::ptr_eq(&before, &controller.store().all()));
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_backend() {
        let mut controller = loaded(seeded()).await;
        let mut bad = draft("");
        bad.end = Some(at(2025, 10, 20, 12, 0));

        let Err(CalendarError::Validation(errors)) = controller.create(&bad).await else {
            panic!("expected validation error");
        };
        assert!(errors.has(Field::Title));
        assert!(errors.has(Field::EndDate));
        assert_eq!(controller.backend.calls.lock().unwrap().as_slice(), ["fetch"]);
    }

    #[tokio::test]
    async fn known_opds_constrain_the_form() {
        let mut controller = loaded(seeded()).await;
        controller.load_opds().await.unwrap();

        let mut d = draft("Rapat");
        d.opd_name = "Dinas Entah".into();
        assert!(matches!(
            controller.create(&d).await,
            Err(CalendarError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn failed_update_and_delete_keep_local_state() {
        let mut controller = loaded(seeded()).await;
        controller.backend.fail.store(true, Ordering::SeqCst);

        let original = controller.store().repository().get("e1").unwrap().clone();
        let mut edit = EventDraft::from_event(&original);
        edit.title = "Changed".into();

        assert!(controller.update("e1", &edit).await.is_err());
        assert!(controller.delete("e1").await.is_err());
        assert_eq!(controller.store().repository().get("e1"), Some(&original));
    }

    #[tokio::test]
    async fn update_of_unknown_event_is_an_error() {
        let mut controller = loaded(seeded()).await;
        let result = controller.update("nope", &draft("x")).await;
        assert!(matches!(result, Err(CalendarError::EventNotFound(_))));
        assert!(matches!(
            controller.delete("nope").await,
            Err(CalendarError::EventNotFound(_))
        ));
    }

    #[tokio::test]
    async fn drag_and_drop_reschedules_through_backend() {
        let mut controller = loaded(seeded()).await;
        assert!(controller.begin_drag("e1"));
        assert!(!controller.begin_drag("e2"));

        let moved = controller
            .drop_on(Some(DropTarget::day(date(2025, 10, 7))))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.start, at(2025, 10, 7, 9, 0));
        assert_eq!(moved.end, at(2025, 10, 7, 11, 30));

        let stored = controller.store().repository().get("e1").unwrap();
        assert_eq!(stored.start, at(2025, 10, 7, 9, 0));
        assert_eq!(stored.color, EventColor::Blue);
        assert!(
            controller
                .backend
                .calls
                .lock()
                .unwrap()
                .contains(&"update e1 2025-10-07T09:00:00".to_string())
        );
        assert!(!controller.is_dragging());
    }

    #[tokio::test]
    async fn failed_reschedule_does_not_move_event() {
        let mut controller = loaded(seeded()).await;
        controller.backend.fail.store(true, Ordering::SeqCst);

        let result = controller
            .move_event("e1", DropTarget::day(date(2025, 10, 8)))
            .await;
        assert!(result.is_err());
        assert_eq!(
            controller.store().repository().get("e1").unwrap().start,
            at(2025, 10, 6, 9, 0)
        );
        assert!(!controller.is_dragging());
    }

    #[tokio::test]
    async fn cancelled_drag_makes_no_calls() {
        let mut controller = loaded(seeded()).await;
        controller.begin_drag("e1");
        controller.cancel_drag();
        assert_eq!(controller.drop_on(None).await.unwrap(), None);
        assert_eq!(controller.backend.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn month_layout_is_memoized_until_inputs_change() {
        let mut controller = loaded(seeded()).await;
        let first = controller.month_layout().clone();
        assert_eq!(first.row_in_week("e2", 1), Some(0));

        let cached = controller.month_layout() as *const MonthLayout;
        assert_eq!(cached, controller.month_layout() as *const MonthLayout);

        controller.toggle_color(EventColor::Blue);
        let filtered = controller.month_layout();
        assert!(filtered.positions.is_empty());
    }

    #[tokio::test]
    async fn view_changes_are_persisted() {
        let mut controller = loaded(seeded()).await;
        controller.set_view(ViewMode::Week).unwrap();
        assert_eq!(controller.view(), ViewMode::Week);
        assert_eq!(controller.cells().len(), 7);

        controller.navigate(Direction::Next);
        assert_eq!(controller.reference(), date(2025, 10, 13));
    }

    #[tokio::test]
    async fn agenda_lists_events_in_reference_month() {
        let mut controller = loaded(seeded()).await;
        controller.set_view(ViewMode::Agenda).unwrap();
        let groups = controller.agenda();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].events[0].id, "e1");
    }
}
