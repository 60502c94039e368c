//! Agent configuration, loadable from TOML with environment overrides.

use hv_backend::BackendConfig;
use serde::Deserialize;

use crate::llm::LlmConfig;

pub const ENV_BACKEND_TOKEN: &str = "HEARTHVOICE_BACKEND_TOKEN";
pub const ENV_BACKEND_URL: &str = "HEARTHVOICE_BACKEND_URL";
pub const ENV_LLM_API_KEY: &str = "HEARTHVOICE_LLM_API_KEY";

/// Top-level configuration for the voice agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Home Assistant connection settings.
    pub backend: BackendConfig,
    /// Hosted model settings.
    pub llm: LlmConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Per-turn behavior of the pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Drop plan entries whose entity was not in this turn's inventory.
    #[serde(default)]
    pub restrict_to_inventory: bool,
    /// Reply used when no plan could be extracted.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

fn default_fallback_reply() -> String {
    "Something went wrong".into()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            restrict_to_inventory: false,
            fallback_reply: default_fallback_reply(),
        }
    }
}

impl AgentConfig {
    /// Load config from a TOML file path, then apply process environment
    /// overrides and validate.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {path}: {e}"))?;
        let mut config: Self = toml::from_str(&contents)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Override secrets and the backend URL from `lookup` (non-empty values only).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = get(ENV_BACKEND_TOKEN) {
            self.backend.token = token;
        }
        if let Some(url) = get(ENV_BACKEND_URL) {
            self.backend.base_url = url;
        }
        if let Some(key) = get(ENV_LLM_API_KEY) {
            self.llm.api_key = key;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backend.token.trim().is_empty() {
            anyhow::bail!("backend.token is required (or set {ENV_BACKEND_TOKEN})");
        }
        if self.llm.api_key.trim().is_empty() {
            anyhow::bail!("llm.api_key is required (or set {ENV_LLM_API_KEY})");
        }
        if self.llm.max_attempts == 0 {
            anyhow::bail!("llm.max_attempts must be at least 1");
        }
        Ok(())
    }
}
