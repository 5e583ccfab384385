//! Add/edit form input and its validation.

use chrono::NaiveDateTime;

use crate::error::{Field, ValidationErrors};
use crate::event::{Event, EventColor, EventPayload, PAYLOAD_DATE_FORMAT, truncate_to_minute};

/// Raw form input.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub title: String,
    pub opd_name: String,
    pub description: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub color: EventColor,
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    pub title: String,
    pub opd_name: String,
    pub description: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: EventColor,
}

impl EventDraft {
    /// Prefill from an existing event (edit dialog).
    pub fn from_event(event: &Event) -> Self {
        EventDraft {
            title: event.title.clone(),
            opd_name: event.opd_name.clone(),
            description: event.description.clone(),
            start: Some(event.start),
            end: Some(event.end),
            color: event.color,
        }
    }

    /// Check required fields and ordering. When `known_opds` is non-empty the
    /// OPD must be one of them (matched case-insensitively, stored as listed).
    pub fn validate(&self, known_opds: &[String]) -> Result<ValidDraft, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(Field::Title, "Title is required");
        }

        let mut opd_name = self.opd_name.trim().to_string();
        if opd_name.is_empty() {
            errors.push(Field::OpdName, "OPD is required");
        } else if !known_opds.is_empty() {
            match known_opds.iter().find(|o| o.eq_ignore_ascii_case(&opd_name)) {
                Some(known) => opd_name = known.clone(),
                None => errors.push(Field::OpdName, format!("Unknown OPD '{}'", opd_name)),
            }
        }

        if self.start.is_none() {
            errors.push(Field::StartDate, "Start date is required");
        }
        if self.end.is_none() {
            errors.push(Field::EndDate, "End date is required");
        }

        let start = self.start.map(truncate_to_minute);
        let end = self.end.map(truncate_to_minute);
        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                errors.push(Field::EndDate, "End date must be after start date");
            }
        }

        match (errors.is_empty(), start, end) {
            (true, Some(start), Some(end)) => Ok(ValidDraft {
                title: title.to_string(),
                opd_name,
                description: self
                    .description
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(String::from),
                start,
                end,
                color: self.color,
            }),
            _ => Err(errors),
        }
    }
}

impl ValidDraft {
    pub fn into_event(self, id: String) -> Event {
        Event {
            id,
            title: self.title,
            description: self.description,
            opd_name: self.opd_name,
            start: self.start,
            end: self.end,
            color: self.color,
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::at;

    fn draft() -> EventDraft {
        EventDraft {
            title: "  Monitoring titik JIP  ".into(),
            opd_name: "diskominfo".into(),
            description: Some("   ".into()),
            start: Some(at(2025, 10, 6, 9, 0)),
            end: Some(at(2025, 10, 6, 11, 30)),
            color: EventColor::Green,
        }
    }

    #[test]
    fn valid_draft_is_normalised() {
        let known = vec!["Diskominfo".to_string(), "Bappeda".to_string()];
        let valid = draft().validate(&known).unwrap();
        assert_eq!(valid.title, "Monitoring titik JIP");
        assert_eq!(valid.opd_name, "Diskominfo");
        assert_eq!(valid.description, None);
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let empty = EventDraft::default();
        let errors = empty.validate(&[]).unwrap_err();
        assert!(errors.has(Field::Title));
        assert!(errors.has(Field::OpdName));
        assert!(errors.has(Field::StartDate));
        assert!(errors.has(Field::EndDate));
    }

    #[test]
    fn end_must_follow_start() {
        let mut same = draft();
        same.end = same.start;
        assert!(same.validate(&[]).unwrap_err().has(Field::EndDate));

        let mut reversed = draft();
        reversed.end = Some(at(2025, 10, 6, 8, 0));
        let errors = reversed.validate(&[]).unwrap_err();
        assert!(errors.has(Field::EndDate));
        assert!(!errors.has(Field::Title));
    }

    #[test]
    fn unknown_opd_is_rejected_when_list_is_known() {
        let mut d = draft();
        d.opd_name = "Dinas Pariwisata".into();
        let errors = d.validate(&["Diskominfo".to_string()]).unwrap_err();
        assert!(errors.has(Field::OpdName));

        // Without a list any non-empty OPD is accepted
        assert!(d.validate(&[]).is_ok());
    }

    #[test]
    fn payload_formats_dates_for_backend() {
        let payload = draft().validate(&[]).unwrap().to_payload();
        assert_eq!(payload.start_date, "2025-10-06T09:00:00");
        assert_eq!(payload.description, "");
        assert_eq!(payload.color, EventColor::Green);
    }
}
