//! Terminal rendering for calendar views.
//!
//! Extension traits and view painters that turn core grid/layout output into
//! colored text using owo_colors.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use jip_calendar_core::error::ValidationErrors;
use jip_calendar_core::event::{Event, EventColor};
use jip_calendar_core::grid::{CalendarCell, MonthGrid, week_rows};
use jip_calendar_core::layout::{
    AgendaGroup, AgendaKey, MAX_VISIBLE_ROWS, MonthLayout, SlotKind, TimeBlock,
};
use jip_calendar_core::settings::{BadgeVariant, CalendarSettings};
use owo_colors::OwoColorize;

const CELL_WIDTH: usize = 12;

const MONTH_NAMES: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

/// Sunday first
const WEEKDAY_SHORT: [&str; 7] = ["Min", "Sen", "Sel", "Rab", "Kam", "Jum", "Sab"];
const WEEKDAY_LONG: [&str; 7] = ["Minggu", "Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu"];

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventColor {
    fn render(&self) -> String {
        paint(*self, "●")
    }
}

impl Render for Event {
    fn render(&self) -> String {
        format!(
            "{} {} {} {}",
            self.color.render(),
            self.title.bold(),
            format!("[{}]", self.opd_name).dimmed(),
            format!("({})", self.id).dimmed()
        )
    }
}

impl Render for ValidationErrors {
    fn render(&self) -> String {
        self.iter()
            .map(|(field, msg)| format!("   {} {}", format!("{}:", field.name()).red(), msg))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn paint(color: EventColor, text: &str) -> String {
    match color {
        EventColor::Blue => text.blue().to_string(),
        EventColor::Green => text.green().to_string(),
        EventColor::Red => text.red().to_string(),
        EventColor::Yellow => text.yellow().to_string(),
        EventColor::Purple => text.purple().to_string(),
        EventColor::Orange => text.truecolor(255, 140, 0).to_string(),
    }
}

pub fn month_title(date: NaiveDate) -> String {
    format!("{} {}", MONTH_NAMES[date.month0() as usize], date.year())
}

/// "Senin, 6 Oktober 2025"
pub fn long_date(date: NaiveDate) -> String {
    format!(
        "{}, {} {} {}",
        WEEKDAY_LONG[date.weekday().num_days_from_sunday() as usize],
        date.day(),
        MONTH_NAMES[date.month0() as usize],
        date.year()
    )
}

fn short_date(date: NaiveDate) -> String {
    format!("{} {}", date.day(), &MONTH_NAMES[date.month0() as usize][..3])
}

pub fn format_minutes(minute: u32, use_24_hour: bool) -> String {
    let (h, m) = (minute / 60, minute % 60);
    if use_24_hour {
        format!("{:02}:{:02}", h, m)
    } else {
        let suffix = if h % 24 < 12 { "AM" } else { "PM" };
        let h12 = match h % 12 {
            0 => 12,
            other => other,
        };
        format!("{}:{:02} {}", h12, m, suffix)
    }
}

fn format_time(dt: NaiveDateTime, use_24_hour: bool) -> String {
    format_minutes(dt.hour() * 60 + dt.minute(), use_24_hour)
}

/// Time span of an event as shown in lists.
pub fn event_span(event: &Event, use_24_hour: bool) -> String {
    if event.is_multi_day() {
        format!(
            "{} {} – {} {}",
            short_date(event.start_day()),
            format_time(event.start, use_24_hour),
            short_date(event.end_day()),
            format_time(event.end, use_24_hour)
        )
    } else {
        format!(
            "{}–{}",
            format_time(event.start, use_24_hour),
            format_time(event.end, use_24_hour)
        )
    }
}

fn truncate(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{:<width$}", text, width = width)
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn badge(event: &Event, text: &str, variant: BadgeVariant) -> String {
    match variant {
        BadgeVariant::Dot => format!("{} {}", event.color.render(), truncate(text, CELL_WIDTH - 2)),
        BadgeVariant::Colored => paint(event.color, &truncate(text, CELL_WIDTH)),
    }
}

fn weekday_header() -> String {
    WEEKDAY_SHORT
        .iter()
        .map(|d| format!("{:<width$}", d, width = CELL_WIDTH))
        .collect::<Vec<_>>()
        .join(" ")
        .bold()
        .to_string()
}

fn day_label(cell: &CalendarCell, today: NaiveDate) -> String {
    let label = format!("{:<width$}", cell.day, width = CELL_WIDTH);
    if cell.date == today {
        label.reversed().to_string()
    } else if !cell.current_month {
        label.dimmed().to_string()
    } else {
        label
    }
}

/// Month grid: day numbers, then up to `MAX_VISIBLE_ROWS` event rows per
/// week, then "+N" for whatever did not fit.
pub fn render_month(
    layout: &MonthLayout,
    events: &[Event],
    settings: &CalendarSettings,
    reference: NaiveDate,
    today: NaiveDate,
) -> String {
    let by_id: HashMap<&str, &Event> = events.iter().map(|e| (e.id.as_str(), e)).collect();
    let cells: Vec<CalendarCell> = layout.cells.iter().map(|c| c.cell).collect();
    let separator = "─".repeat(CELL_WIDTH * 7 + 6).dimmed().to_string();

    let mut lines = vec![month_title(reference).bold().to_string(), weekday_header()];

    for (week, days) in week_rows(&cells).enumerate() {
        lines.push(separator.clone());
        lines.push(
            days.iter()
                .map(|c| day_label(c, today))
                .collect::<Vec<_>>()
                .join(" "),
        );

        let cell_layouts = &layout.cells[week * 7..week * 7 + days.len()];

        for row in 0..MAX_VISIBLE_ROWS {
            if !cell_layouts.iter().any(|c| c.slots.iter().any(|s| s.row == row)) {
                continue;
            }

            let line: Vec<String> = cell_layouts
                .iter()
                .map(|cell| {
                    let slot = cell.slots.iter().find(|s| s.row == row);
                    let Some((slot, event)) =
                        slot.and_then(|s| by_id.get(s.event_id.as_str()).map(|e| (s, *e)))
                    else {
                        return " ".repeat(CELL_WIDTH);
                    };

                    match slot.kind {
                        SlotKind::SingleDay => badge(event, &event.title, settings.badge_variant),
                        SlotKind::MultiDay => {
                            let continues = cell.cell.date.weekday() != Weekday::Sun
                                && event.covers(cell.cell.date - Duration::days(1));
                            if continues {
                                paint(event.color, &"━".repeat(CELL_WIDTH))
                            } else {
                                let label = format!("▸{}", event.title);
                                paint(event.color, &truncate(&label, CELL_WIDTH))
                            }
                        }
                    }
                })
                .collect();
            lines.push(line.join(" "));
        }

        if cell_layouts.iter().any(|c| c.overflow > 0) {
            let line: Vec<String> = cell_layouts
                .iter()
                .map(|c| match c.overflow {
                    0 => " ".repeat(CELL_WIDTH),
                    n => format!("{:<width$}", format!("+{} lagi", n), width = CELL_WIDTH)
                        .dimmed()
                        .to_string(),
                })
                .collect();
            lines.push(line.join(" "));
        }
    }

    lines.join("\n")
}

/// Week or day view: one section per day listing events that fill the whole
/// day first, then timed blocks with their overlap column.
pub fn render_days(
    days: &[CalendarCell],
    blocks: &[Vec<TimeBlock>],
    events: &[Event],
    settings: &CalendarSettings,
    today: NaiveDate,
) -> String {
    let by_id: HashMap<&str, &Event> = events.iter().map(|e| (e.id.as_str(), e)).collect();
    let mut sections = Vec::new();

    for (cell, day_blocks) in days.iter().zip(blocks) {
        let mut lines = Vec::new();
        let header = long_date(cell.date);
        lines.push(if cell.date == today {
            header.reversed().bold().to_string()
        } else {
            header.bold().to_string()
        });

        let spanning: Vec<&Event> = events
            .iter()
            .filter(|e| e.fills_day(cell.date))
            .collect();
        for event in &spanning {
            lines.push(format!(
                "  {:<13} {}",
                "sepanjang hari".dimmed(),
                badge(event, &event.title, settings.badge_variant)
            ));
        }

        for block in day_blocks {
            let Some(event) = by_id.get(block.event_id.as_str()) else {
                continue;
            };
            let span = format!(
                "{}–{}",
                format_minutes(block.start_minute, settings.use_24_hour_format),
                format_minutes(block.end_minute, settings.use_24_hour_format)
            );
            let column = if block.columns > 1 {
                format!(" ({}/{})", block.column + 1, block.columns).dimmed().to_string()
            } else {
                String::new()
            };
            lines.push(format!("  {:<13} {}{}", span, event.render(), column));
        }

        if spanning.is_empty() && day_blocks.is_empty() {
            lines.push(format!("  {}", "Tidak ada kegiatan".dimmed()));
        }

        sections.push(lines.join("\n"));
    }

    sections.join("\n\n")
}

/// Twelve compact month grids; days with events are painted in the color of
/// their earliest event.
pub fn render_year(months: &[MonthGrid], events: &[Event], today: NaiveDate) -> String {
    let mut marks: HashMap<NaiveDate, EventColor> = HashMap::new();
    let mut sorted: Vec<&Event> = events.iter().filter(|e| e.is_well_formed()).collect();
    sorted.sort_by_key(|e| e.start);
    for event in sorted {
        for day in event.start_day().iter_days().take_while(|d| *d <= event.end_day()) {
            marks.entry(day).or_insert(event.color);
        }
    }

    let header = WEEKDAY_SHORT
        .iter()
        .map(|d| &d[..2])
        .collect::<Vec<_>>()
        .join(" ");

    let mut sections = Vec::new();
    for grid in months {
        let mut lines = vec![
            month_title(grid.month).bold().to_string(),
            header.dimmed().to_string(),
        ];
        for week in week_rows(&grid.cells) {
            let line: Vec<String> = week
                .iter()
                .map(|cell| {
                    if !cell.current_month {
                        return "  ".to_string();
                    }
                    let label = format!("{:>2}", cell.day);
                    match marks.get(&cell.date) {
                        _ if cell.date == today => label.reversed().to_string(),
                        Some(color) => paint(*color, &label).bold().to_string(),
                        None => label,
                    }
                })
                .collect();
            lines.push(line.join(" "));
        }
        sections.push(lines.join("\n"));
    }

    sections.join("\n\n")
}

pub fn render_agenda(groups: &[AgendaGroup], settings: &CalendarSettings) -> String {
    if groups.is_empty() {
        return "Tidak ada kegiatan".dimmed().to_string();
    }

    let mut sections = Vec::new();
    for group in groups {
        let mut lines = vec![match group.key {
            AgendaKey::Day(date) => long_date(date).bold().to_string(),
            AgendaKey::Color(color) => format!("{} {}", color.render(), color.as_str().bold()),
        }];

        for event in &group.events {
            lines.push(format!(
                "  {:<24} {}",
                event_span(event, settings.use_24_hour_format),
                event.render()
            ));
            if let Some(description) = &event.description {
                lines.push(format!("  {:<24} {}", "", description.dimmed()));
            }
        }
        sections.push(lines.join("\n"));
    }

    sections.join("\n\n")
}
