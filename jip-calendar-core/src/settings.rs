//! Persisted display preferences.
//!
//! Settings live in a durable key-value slot (a JSON file for the terminal
//! front end, memory in tests) under a fixed key. Reading never fails:
//! anything missing or unreadable is replaced by defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{CalendarError, CalendarResult};
use crate::view::{ViewMode, migrate_view_value};

/// Key the settings bundle is stored under.
pub const SETTINGS_KEY: &str = "jip-calendar-settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Dot,
    #[default]
    Colored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgendaGroupBy {
    #[default]
    Date,
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSettings {
    pub badge_variant: BadgeVariant,
    pub view: ViewMode,
    #[serde(rename = "use24HourFormat")]
    pub use_24_hour_format: bool,
    pub agenda_mode_group_by: AgendaGroupBy,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        CalendarSettings {
            badge_variant: BadgeVariant::default(),
            view: ViewMode::default(),
            use_24_hour_format: true,
            agenda_mode_group_by: AgendaGroupBy::default(),
        }
    }
}

impl CalendarSettings {
    /// Decode a persisted bundle field by field, so one bad field only resets
    /// itself. The view goes through the legacy-name migration.
    ///
    /// Returns the settings and whether the stored view needed migrating.
    fn from_persisted(raw: &str) -> (CalendarSettings, bool) {
        let defaults = CalendarSettings::default();

        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) else {
            debug!("persisted settings unreadable, using defaults");
            return (defaults, false);
        };

        fn field<T: serde::de::DeserializeOwned>(
            map: &serde_json::Map<String, Value>,
            key: &str,
            fallback: T,
        ) -> T {
            map.get(key)
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or(fallback)
        }

        let (view, migrated) = match map.get("view").and_then(Value::as_str) {
            Some(raw_view) => (
                migrate_view_value(raw_view),
                !ViewMode::is_current_name(raw_view),
            ),
            None => (defaults.view, false),
        };

        let settings = CalendarSettings {
            badge_variant: field(&map, "badgeVariant", defaults.badge_variant),
            view,
            use_24_hour_format: field(&map, "use24HourFormat", defaults.use_24_hour_format),
            agenda_mode_group_by: field(&map, "agendaModeGroupBy", defaults.agenda_mode_group_by),
        };

        (settings, migrated)
    }
}

/// A durable string key-value slot.
pub trait SettingsSlot {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> CalendarResult<()>;
}

/// In-memory slot.
#[derive(Debug, Default)]
pub struct MemorySlot {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySlot {
    pub fn with_value(key: &str, value: &str) -> Self {
        let slot = MemorySlot::default();
        if let Ok(mut values) = slot.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        slot
    }
}

impl SettingsSlot for MemorySlot {
    fn read(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> CalendarResult<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| CalendarError::Config("settings slot poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Slot backed by a JSON object file (`{"key": "value", ...}`).
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSlot { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn entries(&self) -> BTreeMap<String, String> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }
}

impl SettingsSlot for FileSlot {
    fn read(&self, key: &str) -> Option<String> {
        self.entries().remove(key)
    }

    fn write(&self, key: &str, value: &str) -> CalendarResult<()> {
        let mut entries = self.entries();
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&entries)
            .map_err(|e| CalendarError::Serialization(e.to_string()))?;

        // Write-then-rename so a crash never leaves a half-written file
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

/// Owns the current settings and their slot.
pub struct SettingsStore<S: SettingsSlot> {
    slot: S,
    current: CalendarSettings,
}

impl<S: SettingsSlot> SettingsStore<S> {
    /// Read the slot once, migrating a legacy view name if present.
    /// A migrated bundle is written back so the migration never runs again.
    pub fn open(slot: S) -> Self {
        let (current, migrated) = match slot.read(SETTINGS_KEY) {
            Some(raw) => CalendarSettings::from_persisted(&raw),
            None => (CalendarSettings::default(), false),
        };

        let store = SettingsStore { slot, current };

        if migrated {
            info!(view = %current.view, "migrated legacy view setting");
            if let Err(e) = store.persist(&current) {
                debug!(error = %e, "could not write migrated settings");
            }
        }

        store
    }

    /// Current settings.
    pub fn load(&self) -> CalendarSettings {
        self.current
    }

    pub fn save(&mut self, next: CalendarSettings) -> CalendarResult<()> {
        self.persist(&next)?;
        self.current = next;
        Ok(())
    }

    pub fn set_view(&mut self, view: ViewMode) -> CalendarResult<()> {
        self.save(CalendarSettings { view, ..self.current })
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    fn persist(&self, settings: &CalendarSettings) -> CalendarResult<()> {
        let json = serde_json::to_string(settings)
            .map_err(|e| CalendarError::Serialization(e.to_string()))?;
        self.slot.write(SETTINGS_KEY, &json)
    }
}
