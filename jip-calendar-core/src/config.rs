//! Application configuration at ~/.config/jip-calendar/config.toml
//!
//! Every key is optional; `JIP_CALENDAR_*` environment variables override the
//! file (e.g. `JIP_CALENDAR_API_BASE_URL`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, CalendarResult};

static DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
static DEFAULT_SETTINGS_PATH: &str = "~/.config/jip-calendar/settings.json";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_settings_path() -> PathBuf {
    PathBuf::from(DEFAULT_SETTINGS_PATH)
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Where display preferences are persisted
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            settings_path: default_settings_path(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> CalendarResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalendarError::Config("Could not determine config directory".into()))?
            .join("jip-calendar");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a commented template first if
    /// no config file exists yet.
    pub fn load() -> CalendarResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> CalendarResult<Self> {
        let config: AppConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("JIP_CALENDAR"))
            .build()
            .map_err(|e| CalendarError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalendarError::Config(e.to_string()))?;

        if config.request_timeout_secs == 0 {
            return Err(CalendarError::Config(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Settings path with `~` expanded.
    pub fn settings_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.settings_path.to_string_lossy()).into_owned())
    }

    /// Persist the current values.
    pub fn save(&self, path: &Path) -> CalendarResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CalendarError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| CalendarError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalendarResult<()> {
        let contents = format!(
            "\
# jip-calendar configuration

# Base URL of the dashboard API serving /calendar and /config:
# api_base_url = \"{}\"

# Seconds before a backend request is abandoned:
# request_timeout_secs = {}

# Where display preferences are stored:
# settings_path = \"{}\"
",
            DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SETTINGS_PATH
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalendarError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalendarError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
