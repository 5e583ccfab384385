//! View modes and the legacy view-name migration.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which grid/renderer is active. Serialized with the local-language names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    #[serde(rename = "bulan")]
    Month,
    #[serde(rename = "minggu")]
    Week,
    #[serde(rename = "hari")]
    Day,
    #[serde(rename = "tahun")]
    Year,
    #[serde(rename = "agenda")]
    Agenda,
}

/// Previous vocabulary -> current view.
const LEGACY_VIEW_NAMES: &[(&str, ViewMode)] = &[
    ("month", ViewMode::Month),
    ("week", ViewMode::Week),
    ("day", ViewMode::Day),
    ("year", ViewMode::Year),
    ("list", ViewMode::Agenda),
];

impl ViewMode {
    pub const ALL: [ViewMode; 5] = [
        ViewMode::Month,
        ViewMode::Week,
        ViewMode::Day,
        ViewMode::Year,
        ViewMode::Agenda,
    ];

    /// Current (persisted) name.
    pub fn name(&self) -> &'static str {
        match self {
            ViewMode::Month => "bulan",
            ViewMode::Week => "minggu",
            ViewMode::Day => "hari",
            ViewMode::Year => "tahun",
            ViewMode::Agenda => "agenda",
        }
    }

    fn from_current_name(raw: &str) -> Option<ViewMode> {
        ViewMode::ALL.into_iter().find(|v| v.name() == raw)
    }

    fn from_legacy_name(raw: &str) -> Option<ViewMode> {
        LEGACY_VIEW_NAMES
            .iter()
            .find(|(name, _)| *name == raw)
            .map(|(_, view)| *view)
    }

    /// Accept either vocabulary. Returns None for anything else.
    pub fn parse(raw: &str) -> Option<ViewMode> {
        let raw = raw.trim().to_lowercase();
        Self::from_current_name(&raw).or_else(|| Self::from_legacy_name(&raw))
    }

    /// Whether `raw` is already in the current vocabulary.
    pub fn is_current_name(raw: &str) -> bool {
        Self::from_current_name(raw).is_some()
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Translate a persisted view value into the current vocabulary.
///
/// Unknown values fall back to `ViewMode::default()` (month).
pub fn migrate_view_value(raw: &str) -> ViewMode {
    match ViewMode::parse(raw) {
        Some(view) => view,
        None => {
            warn!(
                value = raw,
                fallback = %ViewMode::default(),
                "unknown persisted view, using default"
            );
            ViewMode::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_names_map_to_current_views() {
        assert_eq!(migrate_view_value("month"), ViewMode::Month);
        assert_eq!(migrate_view_value("week"), ViewMode::Week);
        assert_eq!(migrate_view_value("day"), ViewMode::Day);
        assert_eq!(migrate_view_value("year"), ViewMode::Year);
        assert_eq!(migrate_view_value("list"), ViewMode::Agenda);
    }

    #[test]
    fn current_names_pass_through() {
        for view in ViewMode::ALL {
            assert_eq!(migrate_view_value(view.name()), view);
        }
    }

    #[test]
    fn migration_is_idempotent() {
        let inputs = [
            "month", "week", "day", "year", "list", "agenda", "bulan", "minggu", "hari", "tahun",
            "???", "",
        ];
        for raw in inputs {
            let once = migrate_view_value(raw);
            let twice = migrate_view_value(once.name());
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn unknown_value_falls_back_to_month() {
        assert_eq!(migrate_view_value("timeline"), ViewMode::Month);
        assert_eq!(migrate_view_value(""), ViewMode::Month);
    }

    #[test]
    fn serde_uses_local_names() {
        assert_eq!(serde_json::to_string(&ViewMode::Week).unwrap(), "\"minggu\"");
        let view: ViewMode = serde_json::from_str("\"tahun\"").unwrap();
        assert_eq!(view, ViewMode::Year);
    }
}
