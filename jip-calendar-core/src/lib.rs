//! Core of the JIP activity calendar.
//!
//! - `repository` / `filter`: the session's event list and its color/OPD filter
//! - `settings`: persisted display preferences with legacy view migration
//! - `grid` / `layout`: date cells per view and event placement inside them
//! - `reschedule`: drag-and-drop state machine
//! - `remote`: the backend the events are persisted in
//! - `controller`: ties the above together, committing changes only after
//!   the backend confirms them

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod filter;
pub mod form;
pub mod grid;
pub mod layout;
pub mod remote;
pub mod repository;
pub mod reschedule;
pub mod settings;
pub mod view;

pub use controller::CalendarController;
pub use error::{CalendarError, CalendarResult};
pub use event::{Event, EventColor};
pub use view::ViewMode;
