use std::time::Duration;

use hv_protocol::SUPPORTED_DOMAINS;
use serde::Deserialize;

/// Connection settings for the Home Assistant REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the Home Assistant instance.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Long-lived access token sent as a bearer token.
    #[serde(default)]
    pub token: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Expose `climate.*` entities to the model.
    #[serde(default = "default_include_climate")]
    pub include_climate: bool,
}

fn default_base_url() -> String {
    "http://homeassistant.local:8123".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_include_climate() -> bool {
    true
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
            timeout_secs: default_timeout_secs(),
            include_climate: default_include_climate(),
        }
    }
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Domains passed through to the inventory, in match order.
    pub fn allowed_domains(&self) -> Vec<&'static str> {
        SUPPORTED_DOMAINS
            .iter()
            .copied()
            .filter(|d| self.include_climate || *d != "climate")
            .collect()
    }
}
