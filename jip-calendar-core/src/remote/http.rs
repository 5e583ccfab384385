//! HTTP client for the event backend.
//!
//! Every call is bounded by the configured timeout; a call that does not
//! finish in time fails with `BackendTimeout` instead of hanging the action.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{CalendarError, CalendarResult};
use crate::event::EventPayload;
use crate::remote::EventBackend;
use crate::remote::protocol::{
    ApiCall, CreateEvent, DeleteEvent, ListConfig, ListEvents, Method, UpdateEvent, created_id,
    opd_names,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, request_timeout: Duration) -> Self {
        HttpBackend {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a typed call and decode its response.
    pub async fn call<C: ApiCall>(&self, call: C) -> CalendarResult<C::Response> {
        timeout(self.request_timeout, self.call_raw(&call))
            .await
            .map_err(|_| CalendarError::BackendTimeout(self.request_timeout.as_secs()))?
    }

    async fn call_raw<C: ApiCall>(&self, call: &C) -> CalendarResult<C::Response> {
        let url = self.url_for(&call.path());
        let method = call.method();
        debug!(?method, %url, "backend request");

        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(body) = call.body() {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CalendarError::Backend(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CalendarError::Backend(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(CalendarError::Backend(format!(
                "{} {} returned {}: {}",
                method_name(method),
                url,
                status,
                text.trim()
            )));
        }

        // Empty or non-JSON bodies (204, "OK") decode as null, which only
        // responses that ignore their content accept
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text)
            .or_else(|e| serde_json::from_str("null").map_err(|_| e))
            .map_err(|e| CalendarError::Backend(format!("Failed to parse response: {}", e)))
    }
}

fn method_name(method: Method) -> &'static str {
    match method {
        Method::Get => "GET",
        Method::Post => "POST",
        Method::Put => "PUT",
        Method::Delete => "DELETE",
    }
}

impl EventBackend for HttpBackend {
    async fn fetch_events(&self) -> CalendarResult<Vec<Value>> {
        Ok(self.call(ListEvents).await?.into_inner())
    }

    async fn create_event(&self, payload: EventPayload) -> CalendarResult<Option<String>> {
        let response = self.call(CreateEvent(payload)).await?;
        Ok(created_id(&response))
    }

    async fn update_event(&self, id: &str, payload: EventPayload) -> CalendarResult<()> {
        self.call(UpdateEvent {
            id: id.to_string(),
            payload,
        })
        .await?;
        Ok(())
    }

    async fn delete_event(&self, id: &str) -> CalendarResult<()> {
        self.call(DeleteEvent { id: id.to_string() }).await?;
        Ok(())
    }

    async fn list_opd_names(&self) -> CalendarResult<Vec<String>> {
        Ok(opd_names(self.call(ListConfig).await?.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_double_slashes() {
        let backend = HttpBackend::new("http://localhost:3000/api/", DEFAULT_TIMEOUT);
        assert_eq!(backend.base_url(), "http://localhost:3000/api");
        assert_eq!(backend.url_for("/calendar/e1"), "http://localhost:3000/api/calendar/e1");
        assert_eq!(backend.url_for("config"), "http://localhost:3000/api/config");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_backend_error() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_secs(5));
        let result = backend.fetch_events().await;
        assert!(
            matches!(
                result,
                Err(CalendarError::Backend(_)) | Err(CalendarError::BackendTimeout(_))
            ),
            "got {:?}",
            result
        );
    }

    #[tokio::test]
    async fn silent_backend_hits_the_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold connections without ever answering
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let backend = HttpBackend::new(&format!("http://{}", addr), Duration::from_secs(1));
        let result = backend.fetch_events().await;
        assert!(
            matches!(result, Err(CalendarError::BackendTimeout(1))),
            "got {:?}",
            result
        );
    }
}
