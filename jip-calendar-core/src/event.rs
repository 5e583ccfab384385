//! Calendar event types.
//!
//! `Event` is the in-memory representation used by the repository, the layout
//! engine and the rescheduler. `EventRecord` and `EventPayload` are the shapes
//! exchanged with the event backend.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike,
};
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, CalendarResult};

/// Timestamp format the backend expects on create/update.
pub const PAYLOAD_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Bullet color of an event. Also the key the color filter works on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EventColor {
    #[default]
    Blue,
    Green,
    Red,
    Yellow,
    Purple,
    Orange,
}

impl EventColor {
    pub const ALL: [EventColor; 6] = [
        EventColor::Blue,
        EventColor::Green,
        EventColor::Red,
        EventColor::Yellow,
        EventColor::Purple,
        EventColor::Orange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventColor::Blue => "blue",
            EventColor::Green => "green",
            EventColor::Red => "red",
            EventColor::Yellow => "yellow",
            EventColor::Purple => "purple",
            EventColor::Orange => "orange",
        }
    }
}

impl fmt::Display for EventColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventColor::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown color '{}'. Expected one of: blue, green, red, yellow, purple, orange",
                    s
                )
            })
    }
}

/// A scheduled activity belonging to an OPD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub opd_name: String,
    /// Minute precision, local wall time
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: EventColor,
}

impl Event {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn start_day(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_day(&self) -> NaiveDate {
        self.end.date()
    }

    /// Start and end fall on different calendar days (time of day ignored).
    pub fn is_multi_day(&self) -> bool {
        self.start_day() != self.end_day()
    }

    pub fn is_well_formed(&self) -> bool {
        self.end >= self.start
    }

    /// Whether `day` lies within `[start_day, end_day]`.
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_day() <= day && day <= self.end_day()
    }

    /// Whether the event runs from midnight to midnight on `day`, so it has
    /// no time of its own there.
    pub fn fills_day(&self, day: NaiveDate) -> bool {
        let midnight = day.and_time(NaiveTime::MIN);
        self.start <= midnight && self.end >= midnight + Duration::days(1)
    }

    /// Whether the event intersects the inclusive day range `[from, to]`.
    pub fn touches_range(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.start_day() <= to && self.end_day() >= from
    }

    pub fn to_payload(&self) -> EventPayload {
        EventPayload {
            title: self.title.clone(),
            opd_name: self.opd_name.clone(),
            description: self.description.clone().unwrap_or_default(),
            start_date: self.start.format(PAYLOAD_DATE_FORMAT).to_string(),
            end_date: self.end.format(PAYLOAD_DATE_FORMAT).to_string(),
            color: self.color,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Identifiers come back as strings or numbers depending on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Text(String),
    Number(i64),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntityId::Text(s) => write!(f, "{}", s),
            EntityId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Event as returned by the backend's listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub opd_name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl EventRecord {
    pub fn into_event(self) -> CalendarResult<Event> {
        let color = self
            .color
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or_default();

        Ok(Event {
            start: parse_timestamp(&self.start_date)?,
            end: parse_timestamp(&self.end_date)?,
            id: self.id.to_string(),
            title: self.title,
            description: self.description.filter(|d| !d.trim().is_empty()),
            opd_name: self.opd_name,
            color,
        })
    }
}

/// Body sent to the backend on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub title: String,
    pub opd_name: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub color: EventColor,
}

/// Parse an ISO 8601 timestamp into local wall time, truncated to the minute.
///
/// Offset-bearing values (`2025-10-06T02:00:00.000Z`) are converted to the
/// local timezone; naive values are taken as local already.
pub fn parse_timestamp(s: &str) -> CalendarResult<NaiveDateTime> {
    let s = s.trim();

    let parsed = DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Local).naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .or_else(|_| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
        })
        .map_err(|_| CalendarError::InvalidDate(s.to_string()))?;

    Ok(truncate_to_minute(parsed))
}

pub fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}
