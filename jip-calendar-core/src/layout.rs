//! Placement of events into grid cells.
//!
//! Month view: multi-day events are stacked into rows per week so bars never
//! overlap, single-day events fill the rows beneath them, and anything past
//! `MAX_VISIBLE_ROWS` is counted as overflow ("+N").
//!
//! Week/day views: timed events are split into side-by-side columns within
//! each cluster of overlapping events.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use tracing::warn;

use crate::event::{Event, EventColor};
use crate::grid::{CalendarCell, DAYS_PER_WEEK, build_cells};
use crate::settings::AgendaGroupBy;
use crate::view::ViewMode;

/// Event rows a month cell shows before collapsing into "+N".
pub const MAX_VISIBLE_ROWS: usize = 3;

const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub single_day: Vec<Event>,
    pub multi_day: Vec<Event>,
}

/// Split by whether start and end fall on the same calendar day.
pub fn classify(events: &[Event]) -> Classified {
    let (multi_day, single_day): (Vec<Event>, Vec<Event>) =
        events.iter().cloned().partition(Event::is_multi_day);
    Classified {
        single_day,
        multi_day,
    }
}

/// Where a multi-day event sits within one week row of a month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventPosition {
    /// Week row of the grid (0..6)
    pub week: usize,
    /// Stacking row within that week
    pub row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    MultiDay,
    SingleDay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub row: usize,
    pub event_id: String,
    pub kind: SlotKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellLayout {
    pub cell: CalendarCell,
    /// Visible rows, ascending
    pub slots: Vec<Slot>,
    /// Events in this cell that did not fit
    pub overflow: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthLayout {
    /// Multi-day placements, one entry per week the event spans
    pub positions: HashMap<String, Vec<EventPosition>>,
    pub cells: Vec<CellLayout>,
}

impl MonthLayout {
    pub fn row_in_week(&self, id: &str, week: usize) -> Option<usize> {
        self.positions
            .get(id)?
            .iter()
            .find(|p| p.week == week)
            .map(|p| p.row)
    }
}

fn by_start_then_id(a: &&Event, b: &&Event) -> std::cmp::Ordering {
    a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id))
}

/// Lay out a month grid around `reference`.
///
/// Multi-day events are placed first-fit: for each week, in (start, id)
/// order, each event takes the lowest row free across all of its columns.
/// Events ending before they start are skipped.
pub fn position_for_month(
    multi_day: &[Event],
    single_day: &[Event],
    reference: NaiveDate,
) -> MonthLayout {
    let cells = build_cells(reference, ViewMode::Month);

    let mut stacked: Vec<&Event> = multi_day
        .iter()
        .filter(|e| {
            if !e.is_well_formed() {
                warn!(
                    id = %e.id,
                    start = %e.start,
                    end = %e.end,
                    "skipping event that ends before it starts"
                );
            }
            e.is_well_formed()
        })
        .collect();
    stacked.sort_by(by_start_then_id);

    let mut positions: HashMap<String, Vec<EventPosition>> = HashMap::new();
    // (week, col) -> row -> event id
    let mut occupancy: Vec<BTreeMap<usize, String>> = vec![BTreeMap::new(); cells.len()];

    for (week, days) in cells.chunks(DAYS_PER_WEEK).enumerate() {
        let (week_start, week_end) = (days[0].date, days[days.len() - 1].date);
        let mut taken: Vec<[bool; DAYS_PER_WEEK]> = Vec::new();

        for event in stacked.iter().filter(|e| e.touches_range(week_start, week_end)) {
            let start_col = column_of(event.start_day().max(week_start), week_start);
            let end_col = column_of(event.end_day().min(week_end), week_start);

            let row = (0..)
                .find(|&r| {
                    taken
                        .get(r)
                        .is_none_or(|cols| cols[start_col..=end_col].iter().all(|t| !t))
                })
                .unwrap_or(taken.len());

            if row >= taken.len() {
                taken.resize(row + 1, [false; DAYS_PER_WEEK]);
            }
            for col in start_col..=end_col {
                taken[row][col] = true;
                occupancy[week * DAYS_PER_WEEK + col].insert(row, event.id.clone());
            }

            positions.entry(event.id.clone()).or_default().push(EventPosition {
                week,
                row,
                start_col,
                end_col,
            });
        }
    }

    let mut singles: Vec<&Event> = single_day.iter().collect();
    singles.sort_by(by_start_then_id);

    let cells = cells
        .into_iter()
        .zip(occupancy)
        .map(|(cell, rows)| layout_cell(cell, rows, &singles))
        .collect();

    MonthLayout { positions, cells }
}

fn column_of(date: NaiveDate, week_start: NaiveDate) -> usize {
    ((date - week_start).num_days().clamp(0, DAYS_PER_WEEK as i64 - 1)) as usize
}

/// Single-day events go in the rows below the lowest multi-day bar.
fn layout_cell(
    cell: CalendarCell,
    rows: BTreeMap<usize, String>,
    singles: &[&Event],
) -> CellLayout {
    let first_free = rows.keys().next_back().map_or(0, |r| r + 1);
    let day_events = singles.iter().filter(|e| e.start_day() == cell.date);

    let mut slots: Vec<Slot> = rows
        .into_iter()
        .map(|(row, event_id)| Slot {
            row,
            event_id,
            kind: SlotKind::MultiDay,
        })
        .collect();
    slots.extend(day_events.enumerate().map(|(i, e)| Slot {
        row: first_free + i,
        event_id: e.id.clone(),
        kind: SlotKind::SingleDay,
    }));

    let total = slots.len();
    slots.retain(|s| s.row < MAX_VISIBLE_ROWS);

    CellLayout {
        cell,
        overflow: total - slots.len(),
        slots,
    }
}

/// A timed event placed on a day column of the week/day grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBlock {
    pub event_id: String,
    /// Minutes since midnight, clipped to the day
    pub start_minute: u32,
    pub end_minute: u32,
    /// Column within the overlap cluster
    pub column: usize,
    /// Columns in the cluster
    pub columns: usize,
}

fn minute_of_day(dt: NaiveDateTime, day: NaiveDate) -> u32 {
    if dt.date() < day {
        0
    } else if dt.date() > day {
        MINUTES_PER_DAY
    } else {
        dt.time().hour() * 60 + dt.time().minute()
    }
}

/// Blocks for the events that intersect `day`.
///
/// Overlapping events form a cluster; each event takes the first column whose
/// previous block has ended, and every block in a cluster shares the
/// cluster's column count.
pub fn layout_time_grid(events: &[Event], day: NaiveDate) -> Vec<TimeBlock> {
    let mut todays: Vec<&Event> = events
        .iter()
        .filter(|e| e.is_well_formed() && e.covers(day))
        .collect();
    todays.sort_by(by_start_then_id);

    let mut blocks: Vec<TimeBlock> = Vec::with_capacity(todays.len());
    let mut cluster_start = 0;
    let mut cluster_end = 0u32;
    // End minute of the last block in each column of the current cluster
    let mut column_ends: Vec<u32> = Vec::new();

    for event in todays {
        let start_minute = minute_of_day(event.start, day);
        let end_minute = minute_of_day(event.end, day).max(start_minute);

        // Ends exactly at midnight on `day`: nothing to draw
        if end_minute == start_minute && event.start < event.end {
            continue;
        }

        if !blocks.is_empty() && start_minute >= cluster_end {
            close_cluster(&mut blocks[cluster_start..], column_ends.len());
            cluster_start = blocks.len();
            column_ends.clear();
        }

        let column = match column_ends.iter().position(|&end| end <= start_minute) {
            Some(col) => {
                column_ends[col] = end_minute;
                col
            }
            None => {
                column_ends.push(end_minute);
                column_ends.len() - 1
            }
        };

        cluster_end = if cluster_start == blocks.len() {
            end_minute
        } else {
            cluster_end.max(end_minute)
        };

        blocks.push(TimeBlock {
            event_id: event.id.clone(),
            start_minute,
            end_minute,
            column,
            columns: 1,
        });
    }

    let columns = column_ends.len();
    close_cluster(&mut blocks[cluster_start..], columns);
    blocks
}

fn close_cluster(cluster: &mut [TimeBlock], columns: usize) {
    for block in cluster {
        block.columns = columns.max(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AgendaKey {
    Day(NaiveDate),
    Color(EventColor),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaGroup {
    pub key: AgendaKey,
    pub events: Vec<Event>,
}

/// Group events for the agenda list, groups and their events ordered by start.
pub fn group_agenda(events: &[Event], group_by: AgendaGroupBy) -> Vec<AgendaGroup> {
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by(by_start_then_id);

    let mut groups: BTreeMap<AgendaKey, Vec<Event>> = BTreeMap::new();
    for event in sorted {
        let key = match group_by {
            AgendaGroupBy::Date => AgendaKey::Day(event.start_day()),
            AgendaGroupBy::Color => AgendaKey::Color(event.color),
        };
        groups.entry(key).or_default().push(event.clone());
    }

    groups
        .into_iter()
        .map(|(key, events)| AgendaGroup { key, events })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::{at, make_event};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cell_at(layout: &MonthLayout, day: NaiveDate) -> &CellLayout {
        layout.cells.iter().find(|c| c.cell.date == day).unwrap()
    }

    #[test]
    fn classify_compares_dates_only() {
        let events = vec![
            make_event("same", at(2025, 10, 6, 0, 0), at(2025, 10, 6, 23, 59)),
            make_event("span", at(2025, 10, 6, 22, 0), at(2025, 10, 7, 2, 0)),
        ];
        let classified = classify(&events);
        assert_eq!(classified.single_day.len(), 1);
        assert_eq!(classified.single_day[0].id, "same");
        assert_eq!(classified.multi_day[0].id, "span");
    }

    #[test]
    fn overlapping_events_stack_earliest_first() {
        // Oct 10-12 and Oct 11-13 2025 (Fri-Sun, Sat-Mon)
        let later = make_event("b", at(2025, 10, 11, 9, 0), at(2025, 10, 13, 17, 0));
        let earlier = make_event("a", at(2025, 10, 10, 9, 0), at(2025, 10, 12, 17, 0));
        let layout = position_for_month(&[later, earlier], &[], date(2025, 10, 1));

        // Grid starts Sep 28: Oct 10-11 sit in week 1, Oct 12-13 in week 2
        assert_eq!(layout.row_in_week("a", 1), Some(0));
        assert_eq!(layout.row_in_week("b", 1), Some(1));
        assert_eq!(layout.row_in_week("a", 2), Some(0));
        assert_eq!(layout.row_in_week("b", 2), Some(1));

        let a_week1 = layout.positions["a"][0];
        assert_eq!((a_week1.start_col, a_week1.end_col), (5, 6));
        let b_week2 = layout.positions["b"][1];
        assert_eq!((b_week2.start_col, b_week2.end_col), (0, 1));
    }

    #[test]
    fn disjoint_events_share_a_row() {
        let a = make_event("a", at(2025, 10, 5, 9, 0), at(2025, 10, 6, 9, 0));
        let b = make_event("b", at(2025, 10, 8, 9, 0), at(2025, 10, 9, 9, 0));
        let layout = position_for_month(&[a, b], &[], date(2025, 10, 1));
        assert_eq!(layout.row_in_week("a", 1), Some(0));
        assert_eq!(layout.row_in_week("b", 1), Some(0));
    }

    #[test]
    fn first_fit_reuses_gaps() {
        // a: Sun-Mon, b: Sun-Sat (row 1), c: Wed-Thu fits back in row 0
        let a = make_event("a", at(2025, 10, 5, 8, 0), at(2025, 10, 6, 8, 0));
        let b = make_event("b", at(2025, 10, 5, 9, 0), at(2025, 10, 11, 9, 0));
        let c = make_event("c", at(2025, 10, 8, 9, 0), at(2025, 10, 9, 9, 0));
        let layout = position_for_month(&[c, b, a], &[], date(2025, 10, 1));
        assert_eq!(layout.row_in_week("a", 1), Some(0));
        assert_eq!(layout.row_in_week("b", 1), Some(1));
        assert_eq!(layout.row_in_week("c", 1), Some(0));
    }

    #[test]
    fn no_two_overlapping_events_share_a_row() {
        let events: Vec<Event> = (0..6)
            .map(|i| {
                make_event(
                    &format!("e{}", i),
                    at(2025, 10, 3 + i, 9, 0),
                    at(2025, 10, 6 + i * 2, 9, 0),
                )
            })
            .collect();
        let layout = position_for_month(&events, &[], date(2025, 10, 1));

        for cell in &layout.cells {
            let mut rows: Vec<usize> = layout
                .positions
                .values()
                .flatten()
                .filter(|p| {
                    let idx = layout
                        .cells
                        .iter()
                        .position(|c| c.cell.date == cell.cell.date)
                        .unwrap();
                    p.week == idx / 7 && (p.start_col..=p.end_col).contains(&(idx % 7))
                })
                .map(|p| p.row)
                .collect();
            let before = rows.len();
            rows.sort();
            rows.dedup();
            assert_eq!(before, rows.len(), "row collision on {}", cell.cell.date);
        }
    }

    #[test]
    fn ties_break_on_id() {
        let b = make_event("b", at(2025, 10, 14, 9, 0), at(2025, 10, 15, 9, 0));
        let a = make_event("a", at(2025, 10, 14, 9, 0), at(2025, 10, 15, 9, 0));
        let first = position_for_month(&[b.clone(), a.clone()], &[], date(2025, 10, 1));
        let second = position_for_month(&[a, b], &[], date(2025, 10, 1));
        assert_eq!(first, second);
        assert_eq!(first.row_in_week("a", 2), Some(0));
        assert_eq!(first.row_in_week("b", 2), Some(1));
    }

    #[test]
    fn malformed_multi_day_event_is_skipped() {
        let bad = make_event("bad", at(2025, 10, 12, 9, 0), at(2025, 10, 10, 9, 0));
        let layout = position_for_month(&[bad], &[], date(2025, 10, 1));
        assert!(layout.positions.is_empty());
    }

    #[test]
    fn single_day_events_sit_below_bars_and_overflow() {
        let bar = make_event("bar", at(2025, 10, 6, 9, 0), at(2025, 10, 7, 9, 0));
        let singles: Vec<Event> = (0..4)
            .map(|i| {
                let id = format!("s{}", i);
                make_event(&id, at(2025, 10, 6, 8 + i, 0), at(2025, 10, 6, 9 + i, 0))
            })
            .collect();
        let layout = position_for_month(&[bar], &singles, date(2025, 10, 1));

        let cell = cell_at(&layout, date(2025, 10, 6));
        let visible: Vec<(usize, &str)> = cell
            .slots
            .iter()
            .map(|s| (s.row, s.event_id.as_str()))
            .collect();
        assert_eq!(visible, vec![(0, "bar"), (1, "s0"), (2, "s1")]);
        assert_eq!(cell.overflow, 2);

        let next = cell_at(&layout, date(2025, 10, 7));
        assert_eq!(next.slots.len(), 1);
        assert_eq!(next.overflow, 0);
    }

    #[test]
    fn time_grid_splits_overlaps_into_columns() {
        let day = date(2025, 10, 6);
        let events = vec![
            make_event("a", at(2025, 10, 6, 9, 0), at(2025, 10, 6, 10, 0)),
            make_event("b", at(2025, 10, 6, 9, 30), at(2025, 10, 6, 11, 0)),
            make_event("c", at(2025, 10, 6, 10, 0), at(2025, 10, 6, 10, 30)),
            make_event("d", at(2025, 10, 6, 13, 0), at(2025, 10, 6, 14, 0)),
        ];
        let blocks = layout_time_grid(&events, day);
        let summary: Vec<(&str, usize, usize)> = blocks
            .iter()
            .map(|b| (b.event_id.as_str(), b.column, b.columns))
            .collect();
        assert_eq!(
            summary,
            vec![("a", 0, 2), ("b", 1, 2), ("c", 0, 2), ("d", 0, 1)]
        );
        assert_eq!(blocks[0].start_minute, 9 * 60);
        assert_eq!(blocks[1].end_minute, 11 * 60);
    }

    #[test]
    fn time_grid_clips_multi_day_events() {
        let day = date(2025, 10, 7);
        let events = vec![make_event("m", at(2025, 10, 6, 20, 0), at(2025, 10, 8, 3, 0))];
        let blocks = layout_time_grid(&events, day);
        assert_eq!(blocks.len(), 1);
        assert_eq!((blocks[0].start_minute, blocks[0].end_minute), (0, 24 * 60));
    }

    #[test]
    fn agenda_groups_by_day_and_color() {
        let mut red = make_event("r", at(2025, 10, 7, 9, 0), at(2025, 10, 7, 10, 0));
        red.color = EventColor::Red;
        let blue_late = make_event("b2", at(2025, 10, 6, 15, 0), at(2025, 10, 6, 16, 0));
        let blue_early = make_event("b1", at(2025, 10, 6, 8, 0), at(2025, 10, 6, 9, 0));
        let events = vec![red, blue_late, blue_early];

        let by_day = group_agenda(&events, AgendaGroupBy::Date);
        assert_eq!(by_day.len(), 2);
        assert_eq!(by_day[0].key, AgendaKey::Day(date(2025, 10, 6)));
        assert_eq!(by_day[0].events[0].id, "b1");

        let by_color = group_agenda(&events, AgendaGroupBy::Color);
        assert_eq!(by_color[0].key, AgendaKey::Color(EventColor::Blue));
        assert_eq!(by_color[0].events.len(), 2);
        assert_eq!(by_color[1].key, AgendaKey::Color(EventColor::Red));
    }
}
