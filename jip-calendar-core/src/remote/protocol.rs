//! Request and response shapes of the event backend's HTTP API.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::{EntityId, EventPayload};

/// Type tag of configuration entries that describe an OPD.
pub const OPD_CONFIG_TYPE: &str = "OPD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// A typed backend call. The response type is fixed by the call, so
/// `HttpBackend::call` returns the right shape at compile time.
pub trait ApiCall: Send + Sync {
    type Response: DeserializeOwned + Send;
    fn method(&self) -> Method;
    /// Path relative to the API base URL.
    fn path(&self) -> String;
    fn body(&self) -> Option<&EventPayload> {
        None
    }
}

/// Responses come either bare or wrapped as `{"data": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(data) => data,
        }
    }
}

/// Records stay raw so one malformed row cannot fail the whole listing.
pub struct ListEvents;

impl ApiCall for ListEvents {
    type Response = Envelope<Vec<Value>>;
    fn method(&self) -> Method {
        Method::Get
    }
    fn path(&self) -> String {
        "calendar".into()
    }
}

pub struct CreateEvent(pub EventPayload);

impl ApiCall for CreateEvent {
    type Response = Value;
    fn method(&self) -> Method {
        Method::Post
    }
    fn path(&self) -> String {
        "calendar".into()
    }
    fn body(&self) -> Option<&EventPayload> {
        Some(&self.0)
    }
}

pub struct UpdateEvent {
    pub id: String,
    pub payload: EventPayload,
}

impl ApiCall for UpdateEvent {
    type Response = IgnoredAny;
    fn method(&self) -> Method {
        Method::Put
    }
    fn path(&self) -> String {
        format!("calendar/{}", self.id)
    }
    fn body(&self) -> Option<&EventPayload> {
        Some(&self.payload)
    }
}

pub struct DeleteEvent {
    pub id: String,
}

impl ApiCall for DeleteEvent {
    type Response = IgnoredAny;
    fn method(&self) -> Method {
        Method::Delete
    }
    fn path(&self) -> String {
        format!("calendar/{}", self.id)
    }
}

pub struct ListConfig;

impl ApiCall for ListConfig {
    type Response = Envelope<Vec<ConfigEntry>>;
    fn method(&self) -> Method {
        Method::Get
    }
    fn path(&self) -> String {
        "config".into()
    }
}

/// Entry of the generic configuration registry (OPDs, ISPs, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: String,
    pub data_config: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub name: String,
}

/// Names of the OPD entries, in listing order.
pub fn opd_names(entries: Vec<ConfigEntry>) -> Vec<String> {
    entries
        .into_iter()
        .filter(|e| e.kind == OPD_CONFIG_TYPE)
        .map(|e| e.data_config.name)
        .collect()
}

/// Pull the new identifier out of a create response (`{"id"}` or
/// `{"data": {"id"}}`).
pub fn created_id(response: &Value) -> Option<String> {
    let id = response
        .get("data")
        .and_then(|d| d.get("id"))
        .or_else(|| response.get("id"))?;

    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
