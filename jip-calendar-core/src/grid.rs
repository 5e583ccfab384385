//! Date cell grids for each view mode.

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};

use crate::view::ViewMode;

/// Cells in a month grid (6 weeks x 7 days).
pub const MONTH_GRID_CELLS: usize = 42;
pub const DAYS_PER_WEEK: usize = 7;

/// Week start used by the calendar.
pub const DEFAULT_WEEK_START: Weekday = Weekday::Sun;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCell {
    pub day: u32,
    pub date: NaiveDate,
    /// False for leading/trailing days borrowed from neighbouring months.
    pub current_month: bool,
}

impl CalendarCell {
    fn new(date: NaiveDate, month_of: NaiveDate) -> Self {
        CalendarCell {
            day: date.day(),
            date,
            current_month: date.year() == month_of.year() && date.month() == month_of.month(),
        }
    }
}

/// One month of a year view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    /// First day of the month
    pub month: NaiveDate,
    pub cells: Vec<CalendarCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

pub fn build_cells(reference: NaiveDate, mode: ViewMode) -> Vec<CalendarCell> {
    build_cells_with(reference, mode, DEFAULT_WEEK_START)
}

/// Cells for `mode` around `reference`.
///
/// - Month: 42 cells starting on the week containing the 1st
/// - Week: the 7 days of the week containing `reference`
/// - Day: `reference` alone
/// - Year: twelve month grids back to back (504 cells)
/// - Agenda: the days of the reference month
pub fn build_cells_with(
    reference: NaiveDate,
    mode: ViewMode,
    week_start: Weekday,
) -> Vec<CalendarCell> {
    match mode {
        ViewMode::Month => month_cells(reference, week_start),
        ViewMode::Week => {
            let start = start_of_week(reference, week_start);
            (0..DAYS_PER_WEEK as i64)
                .map(|i| CalendarCell::new(start + Duration::days(i), reference))
                .collect()
        }
        ViewMode::Day => vec![CalendarCell::new(reference, reference)],
        ViewMode::Year => build_year_with(reference, week_start)
            .into_iter()
            .flat_map(|m| m.cells)
            .collect(),
        ViewMode::Agenda => {
            let first = first_of_month(reference);
            first
                .iter_days()
                .take_while(|d| d.month() == first.month())
                .map(|d| CalendarCell::new(d, first))
                .collect()
        }
    }
}

pub fn build_year(reference: NaiveDate) -> Vec<MonthGrid> {
    build_year_with(reference, DEFAULT_WEEK_START)
}

/// Twelve independent month grids for the year of `reference`.
pub fn build_year_with(reference: NaiveDate, week_start: Weekday) -> Vec<MonthGrid> {
    (1..=12)
        .filter_map(|m| NaiveDate::from_ymd_opt(reference.year(), m, 1))
        .map(|month| MonthGrid {
            month,
            cells: month_cells(month, week_start),
        })
        .collect()
}

fn month_cells(reference: NaiveDate, week_start: Weekday) -> Vec<CalendarCell> {
    let first = first_of_month(reference);
    let grid_start = start_of_week(first, week_start);

    (0..MONTH_GRID_CELLS as i64)
        .map(|i| CalendarCell::new(grid_start + Duration::days(i), first))
        .collect()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

pub fn start_of_week(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset = (date.weekday().num_days_from_sunday() + 7
        - week_start.num_days_from_sunday())
        % 7;
    date - Duration::days(offset as i64)
}

/// Inclusive date range a view displays.
pub fn visible_range(reference: NaiveDate, mode: ViewMode) -> (NaiveDate, NaiveDate) {
    match mode {
        ViewMode::Month => {
            let start = start_of_week(first_of_month(reference), DEFAULT_WEEK_START);
            (start, start + Duration::days(MONTH_GRID_CELLS as i64 - 1))
        }
        ViewMode::Week => {
            let start = start_of_week(reference, DEFAULT_WEEK_START);
            (start, start + Duration::days(DAYS_PER_WEEK as i64 - 1))
        }
        ViewMode::Day => (reference, reference),
        ViewMode::Year => {
            let year = reference.year();
            (
                NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(reference),
                NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(reference),
            )
        }
        ViewMode::Agenda => (first_of_month(reference), last_of_month(reference)),
    }
}

/// Step the reference date one view-sized unit. Month steps clamp the day to
/// the target month's length (Jan 31 -> Feb 28).
pub fn navigate(reference: NaiveDate, mode: ViewMode, direction: Direction) -> NaiveDate {
    let months = |n: u32| match direction {
        Direction::Next => reference.checked_add_months(Months::new(n)),
        Direction::Previous => reference.checked_sub_months(Months::new(n)),
    };
    let days = |n: i64| match direction {
        Direction::Next => reference.checked_add_signed(Duration::days(n)),
        Direction::Previous => reference.checked_sub_signed(Duration::days(n)),
    };

    let next = match mode {
        ViewMode::Month | ViewMode::Agenda => months(1),
        ViewMode::Year => months(12),
        ViewMode::Week => days(7),
        ViewMode::Day => days(1),
    };
    next.unwrap_or(reference)
}

/// Split a flat cell list into rows of seven.
pub fn week_rows(cells: &[CalendarCell]) -> impl Iterator<Item = &[CalendarCell]> {
    cells.chunks(DAYS_PER_WEEK)
}
