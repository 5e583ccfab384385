use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use clap::Args;
use dialoguer::{Confirm, Input, Select};
use jip_calendar_core::error::CalendarError;
use jip_calendar_core::event::{EventColor, parse_timestamp};
use jip_calendar_core::form::EventDraft;
use jip_calendar_core::reschedule::DropTarget;
use owo_colors::OwoColorize;
use tracing::warn;

use super::Controller;
use crate::render::{Render, event_span};
use crate::utils::tui::with_spinner;

/// Event form fields. Anything left out is prompted for.
#[derive(Args, Debug, Default, Clone)]
pub struct EventFields {
    #[arg(short, long)]
    pub title: Option<String>,

    /// OPD the event belongs to
    #[arg(long)]
    pub opd_name: Option<String>,

    /// Start ("2025-10-06 09:00")
    #[arg(short, long)]
    pub start: Option<String>,

    /// End ("2025-10-06 11:00"), default one hour after the start
    #[arg(short, long)]
    pub end: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(long)]
    pub event_color: Option<EventColor>,
}

impl EventFields {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.opd_name.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.description.is_none()
            && self.event_color.is_none()
    }
}

pub async fn add(controller: &mut Controller, fields: EventFields) -> Result<()> {
    load_opds_quietly(controller).await;
    let interactive = fields.title.is_none() || fields.start.is_none();

    // --- Title ---
    let title = match fields.title {
        Some(t) => t,
        None => Input::<String>::new()
            .with_prompt("  Title")
            .interact_text()?,
    };

    // --- OPD ---
    let opd_name = match fields.opd_name {
        Some(name) => name,
        None => prompt_opd(controller.known_opds(), None)?,
    };

    // --- Start / End ---
    let start = match fields.start {
        Some(s) => parse_datetime(&s)?,
        None => prompt_with_retry("  Start (YYYY-MM-DD HH:MM)", None)?,
    };

    let end = match fields.end {
        Some(s) => parse_datetime(&s)?,
        None if interactive => prompt_with_retry("  End", Some(default_end(start)))?,
        None => default_end(start),
    };

    // --- Description ---
    let description = match fields.description {
        Some(d) => Some(d),
        None if interactive => Some(
            Input::<String>::new()
                .with_prompt("  Description (skip)")
                .default(String::new())
                .show_default(false)
                .interact_text()?,
        ),
        None => None,
    };

    // --- Color ---
    let color = match fields.event_color {
        Some(c) => c,
        None if interactive => prompt_color(EventColor::default())?,
        None => EventColor::default(),
    };

    let draft = EventDraft {
        title,
        opd_name,
        description,
        start: Some(start),
        end: Some(end),
        color,
    };

    let event = with_spinner("Saving event...", controller.create(&draft)).await?;
    let use_24_hour = controller.settings().use_24_hour_format;

    if interactive {
        println!();
    }
    println!("{}", format!("  Created: {}", event.title).green());
    println!("  {}  {}", event_span(&event, use_24_hour), event.render());
    Ok(())
}

pub async fn edit(controller: &mut Controller, id: &str, fields: EventFields) -> Result<()> {
    with_spinner("Loading events...", controller.load_events()).await?;
    load_opds_quietly(controller).await;

    let existing = controller
        .store()
        .repository()
        .get(id)
        .cloned()
        .ok_or_else(|| CalendarError::EventNotFound(id.to_string()))?;

    let mut draft = EventDraft::from_event(&existing);
    if fields.is_empty() {
        prompt_draft(&mut draft, controller.known_opds())?;
    } else {
        apply_fields(&mut draft, fields)?;
    }

    let event = with_spinner("Saving event...", controller.update(id, &draft)).await?;
    let use_24_hour = controller.settings().use_24_hour_format;

    println!("{}", format!("  Updated: {}", event.title).green());
    println!("  {}  {}", event_span(&event, use_24_hour), event.render());
    Ok(())
}

/// Reschedule without a pointer: same path as dropping the event on a day
/// (or a time slot when `time` is given).
pub async fn move_to(
    controller: &mut Controller,
    id: &str,
    to: NaiveDate,
    time: Option<NaiveTime>,
) -> Result<()> {
    with_spinner("Loading events...", controller.load_events()).await?;

    let target = match time {
        Some(time) => DropTarget::slot(to, time),
        None => DropTarget::day(to),
    };

    let moved = with_spinner("Moving event...", controller.move_event(id, target)).await?;
    let use_24_hour = controller.settings().use_24_hour_format;

    match moved {
        Some(event) => {
            println!("{}", format!("  Moved: {}", event.title).green());
            println!("  {}  {}", event_span(&event, use_24_hour), event.render());
        }
        None => println!("{}", "  Already there, nothing changed".dimmed()),
    }
    Ok(())
}

pub async fn delete(controller: &mut Controller, id: &str, force: bool) -> Result<()> {
    with_spinner("Loading events...", controller.load_events()).await?;

    let title = controller
        .store()
        .repository()
        .get(id)
        .map(|e| e.title.clone())
        .ok_or_else(|| CalendarError::EventNotFound(id.to_string()))?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("  Delete '{}'?", title))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "  Cancelled".dimmed());
            return Ok(());
        }
    }

    with_spinner("Deleting event...", controller.delete(id)).await?;
    println!("{}", format!("  Deleted: {}", title).green());
    Ok(())
}

/// The OPD list only sharpens validation; without it any non-blank name passes.
async fn load_opds_quietly(controller: &mut Controller) {
    if let Err(e) = with_spinner("Fetching OPDs...", controller.load_opds()).await {
        warn!(error = %e, "could not load OPD names, skipping OPD check");
    }
}

fn parse_datetime(input: &str) -> Result<NaiveDateTime> {
    Ok(parse_timestamp(input)?)
}

/// Default end: one hour after the start.
fn default_end(start: NaiveDateTime) -> NaiveDateTime {
    start + Duration::hours(1)
}

/// Overwrite the draft with whatever was passed on the command line.
fn apply_fields(draft: &mut EventDraft, fields: EventFields) -> Result<()> {
    if let Some(title) = fields.title {
        draft.title = title;
    }
    if let Some(opd_name) = fields.opd_name {
        draft.opd_name = opd_name;
    }
    if let Some(start) = fields.start {
        draft.start = Some(parse_datetime(&start)?);
    }
    if let Some(end) = fields.end {
        draft.end = Some(parse_datetime(&end)?);
    }
    if let Some(description) = fields.description {
        draft.description = Some(description);
    }
    if let Some(color) = fields.event_color {
        draft.color = color;
    }
    Ok(())
}

/// Walk through every field with the current value as default.
fn prompt_draft(draft: &mut EventDraft, known_opds: &[String]) -> Result<()> {
    draft.title = Input::<String>::new()
        .with_prompt("  Title")
        .default(draft.title.clone())
        .interact_text()?;

    draft.opd_name = prompt_opd(known_opds, Some(&draft.opd_name))?;
    draft.start = Some(prompt_with_retry("  Start", draft.start)?);
    draft.end = Some(prompt_with_retry("  End", draft.end)?);

    draft.description = Some(
        Input::<String>::new()
            .with_prompt("  Description")
            .default(draft.description.clone().unwrap_or_default())
            .allow_empty(true)
            .interact_text()?,
    );

    draft.color = prompt_color(draft.color)?;
    Ok(())
}

fn prompt_opd(known_opds: &[String], current: Option<&str>) -> Result<String> {
    if known_opds.is_empty() {
        let mut input = Input::<String>::new().with_prompt("  OPD");
        if let Some(current) = current {
            input = input.default(current.to_string());
        }
        return Ok(input.interact_text()?);
    }

    let default = current
        .and_then(|c| known_opds.iter().position(|o| o.eq_ignore_ascii_case(c)))
        .unwrap_or(0);
    let selection = Select::new()
        .with_prompt("  OPD")
        .items(known_opds)
        .default(default)
        .interact()?;
    Ok(known_opds[selection].clone())
}

fn prompt_color(current: EventColor) -> Result<EventColor> {
    let items: Vec<String> = EventColor::ALL
        .iter()
        .map(|c| format!("{} {}", c.render(), c))
        .collect();
    let default = EventColor::ALL
        .iter()
        .position(|c| *c == current)
        .unwrap_or(0);

    let selection = Select::new()
        .with_prompt("  Color")
        .items(&items)
        .default(default)
        .interact()?;
    Ok(EventColor::ALL[selection])
}

/// Prompt until the input parses as a timestamp.
fn prompt_with_retry(prompt: &str, default: Option<NaiveDateTime>) -> Result<NaiveDateTime> {
    loop {
        let mut input = Input::<String>::new().with_prompt(prompt);
        if let Some(default) = default {
            input = input.default(default.format("%Y-%m-%d %H:%M").to_string());
        }
        let raw = input.interact_text()?;

        match parse_datetime(&raw) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => eprintln!("  {}", e.to_string().red()),
        }
    }
}
