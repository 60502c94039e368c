//! Automation backend abstraction.
//!
//! `AutomationBackend` covers the two REST operations the agent needs:
//! reading every entity state and invoking a service. Two impls:
//! - `RestBackend`: reqwest client against a real Home Assistant instance
//! - `MockBackend`: scripted states, recorded calls (in `mock.rs`)

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};

use hv_protocol::{EntityRecord, ServiceCall};

use crate::config::BackendConfig;
use crate::error::{BackendError, BackendResult};

/// Trait for automation backend implementations.
#[async_trait]
pub trait AutomationBackend: Send + Sync {
    /// Read all current entity states (`GET /api/states`).
    ///
    /// Items that are not entity state objects are skipped.
    async fn fetch_states(&self) -> BackendResult<Vec<EntityRecord>>;

    /// Invoke one service. Only transport failures and non-success statuses
    /// are reported; the response body is ignored.
    async fn call_service(&self, call: &ServiceCall) -> BackendResult<()>;
}

/// Home Assistant REST API client.
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|e| BackendError::Config(format!("token is not a valid header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AutomationBackend for RestBackend {
    async fn fetch_states(&self) -> BackendResult<Vec<EntityRecord>> {
        let path = "/api/states";
        let response = self.client.get(self.url(path)).send().await?;

        if !response.status().is_success() {
            return Err(BackendError::Status {
                status: response.status().as_u16(),
                path: path.into(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let serde_json::Value::Array(items) = body else {
            return Err(BackendError::Decode("expected a JSON array of states".into()));
        };

        let mut records = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<EntityRecord>(item) {
                Ok(record) => records.push(record),
                Err(e) => tracing::debug!(error = %e, "skipping malformed state object"),
            }
        }
        Ok(records)
    }

    async fn call_service(&self, call: &ServiceCall) -> BackendResult<()> {
        let path = call.path();
        let response = self
            .client
            .post(self.url(&path))
            .json(&call.payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status {
                status: response.status().as_u16(),
                path,
            });
        }
        Ok(())
    }
}
