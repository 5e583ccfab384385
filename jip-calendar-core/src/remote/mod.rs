//! The durable event store the calendar talks to.
//!
//! The calendar only holds the current session's events; creating, editing,
//! moving and deleting go through an `EventBackend` first.

pub mod http;
pub mod protocol;

use std::future::Future;

use serde_json::Value;

use crate::error::CalendarResult;
use crate::event::EventPayload;

pub use http::HttpBackend;

pub trait EventBackend {
    /// Raw event records; each is decoded on its own so a bad row is
    /// skipped rather than failing the listing.
    fn fetch_events(&self) -> impl Future<Output = CalendarResult<Vec<Value>>> + Send;

    /// Returns the identifier assigned by the backend, if it sent one back.
    fn create_event(
        &self,
        payload: EventPayload,
    ) -> impl Future<Output = CalendarResult<Option<String>>> + Send;

    fn update_event(
        &self,
        id: &str,
        payload: EventPayload,
    ) -> impl Future<Output = CalendarResult<()>> + Send;

    fn delete_event(&self, id: &str) -> impl Future<Output = CalendarResult<()>> + Send;

    /// Names of the configured OPDs, for the event form's selector.
    fn list_opd_names(&self) -> impl Future<Output = CalendarResult<Vec<String>>> + Send;
}
