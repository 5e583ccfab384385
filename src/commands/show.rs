use anyhow::Result;
use chrono::NaiveDate;
use jip_calendar_core::ViewMode;
use jip_calendar_core::filter::{ColorFilter, EventStore, OpdScope};
use jip_calendar_core::grid::{Direction, build_year};
use jip_calendar_core::layout::TimeBlock;
use jip_calendar_core::settings::CalendarSettings;
use owo_colors::OwoColorize;
use tracing::debug;

use super::Controller;
use crate::render::{
    Render, month_title, render_agenda, render_days, render_month, render_year,
};
use crate::utils::tui::with_spinner;

/// Load the events and print the current view. Passing a view switches to it
/// and persists the choice, like selecting a tab.
pub async fn run(
    controller: &mut Controller,
    view: Option<ViewMode>,
    step: i32,
    today: NaiveDate,
) -> Result<()> {
    if let Some(view) = view {
        controller.set_view(view)?;
    }

    let direction = if step < 0 {
        Direction::Previous
    } else {
        Direction::Next
    };
    for _ in 0..step.unsigned_abs() {
        controller.navigate(direction);
    }

    let count = with_spinner("Loading events...", controller.load_events()).await?;
    debug!(count, view = %controller.view(), reference = %controller.reference(), "rendering");

    if let Some(summary) = filter_summary(controller.store().filter()) {
        println!("{}", summary);
    }
    if let Some(hint) = unknown_opd_hint(controller.store()) {
        println!("{}", hint.dimmed());
    }

    let settings = controller.settings();
    println!("{}", render_view(controller, &settings, today));
    Ok(())
}

fn render_view(
    controller: &mut Controller,
    settings: &CalendarSettings,
    today: NaiveDate,
) -> String {
    let reference = controller.reference();

    match controller.view() {
        ViewMode::Month => {
            let events = controller.visible_events();
            let layout = controller.month_layout();
            render_month(layout, &events, settings, reference, today)
        }
        ViewMode::Week | ViewMode::Day => {
            let days = controller.cells();
            let blocks: Vec<Vec<TimeBlock>> =
                days.iter().map(|cell| controller.time_blocks(cell.date)).collect();
            render_days(&days, &blocks, &controller.events_in_view(), settings, today)
        }
        ViewMode::Year => render_year(&build_year(reference), &controller.visible_events(), today),
        ViewMode::Agenda => format!(
            "{}\n{}",
            month_title(reference).bold(),
            render_agenda(&controller.agenda(), settings)
        ),
    }
}

/// "Filter: ● ● · Bappeda", or nothing when every event is shown.
fn filter_summary(filter: &ColorFilter) -> Option<String> {
    if filter.is_empty() {
        return None;
    }

    let mut parts: Vec<String> = filter.selected().iter().map(|c| c.render()).collect();
    if let OpdScope::Only(name) = filter.opd() {
        parts.push(name.clone());
    }

    Some(format!("{} {}", "Filter:".dimmed(), parts.join(" ")))
}

/// Hint when the OPD scope names an OPD no loaded event belongs to.
fn unknown_opd_hint(store: &EventStore) -> Option<String> {
    let OpdScope::Only(name) = store.filter().opd() else {
        return None;
    };

    let names = store.repository().opd_names();
    if names.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        return None;
    }
    Some(format!("No events for OPD '{}'. OPDs with events: {}", name, names.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jip_calendar_core::{Event, EventColor};

    #[test]
    fn no_summary_without_filter() {
        assert_eq!(filter_summary(&ColorFilter::default()), None);
    }

    #[test]
    fn hint_lists_opds_when_scope_matches_none() {
        let day = NaiveDate::from_ymd_opt(2025, 10, 6).unwrap();
        let event = Event {
            id: "e1".into(),
            title: "Rapat".into(),
            description: None,
            opd_name: "Diskominfo".into(),
            start: day.and_hms_opt(9, 0, 0).unwrap(),
            end: day.and_hms_opt(10, 0, 0).unwrap(),
            color: EventColor::Blue,
        };
        let mut store = EventStore::new(vec![event]);

        store.set_opd(OpdScope::Only("diskominfo".into()));
        assert_eq!(unknown_opd_hint(&store), None);

        store.set_opd(OpdScope::Only("Dinsos".into()));
        let hint = unknown_opd_hint(&store).unwrap();
        assert!(hint.contains("Dinsos") && hint.contains("Diskominfo"));
    }

    #[test]
    fn summary_names_the_opd_scope() {
        let mut filter = ColorFilter::default();
        filter.toggle(EventColor::Red);
        filter.set_opd(OpdScope::Only("Bappeda".into()));

        let summary = filter_summary(&filter).unwrap();
        assert!(summary.contains("Bappeda"));
        assert!(summary.contains('●'));
    }
}
