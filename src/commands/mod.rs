pub mod config;
pub mod event;
pub mod opds;
pub mod settings;
pub mod show;

use jip_calendar_core::CalendarController;
use jip_calendar_core::remote::HttpBackend;
use jip_calendar_core::settings::FileSlot;

/// The controller every command drives: HTTP backend, settings in a JSON file.
pub type Controller = CalendarController<HttpBackend, FileSlot>;
