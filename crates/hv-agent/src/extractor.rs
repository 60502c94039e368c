//! Plan extraction: prompt construction, model call, strict parse.
//!
//! The prompt is rebuilt on every turn from the freshly fetched inventory.
//! Each model call is bounded by a timeout and failed attempts are retried
//! at most once with the identical prompt.

use std::sync::LazyLock;
use std::time::Duration;

use hv_protocol::{ActionPlan, InventoryMap, format_instructions};
use tokio::time::timeout;

use crate::error::ExtractionError;
use crate::llm::LanguageModel;

/// Upper bound on attempts per utterance: the first call plus one retry.
pub const MAX_ATTEMPTS: u32 = 2;

static FORMAT_INSTRUCTIONS: LazyLock<String> = LazyLock::new(format_instructions);

const FRAMING: &str = "You are the voice assistant for this smart home, and you can also answer other common questions.";

/// Build the single-message extraction prompt.
pub fn build_prompt(utterance: &str, language: &str, inventory: &InventoryMap) -> String {
    format!(
        "{FRAMING}\n\
         An overview of the devices in this smart home in entity_map format \
         (entity name: {{entity_id, state}}):\n\
         {entity_map}\n\
         \n\
         {format}\n\
         \n\
         The user's language tag is \"{language}\".\n\
         Extract the information described above from the user input and entity_map.\n\
         User input: \"{utterance}\"",
        entity_map = inventory.to_prompt_json(),
        format = FORMAT_INSTRUCTIONS.as_str(),
    )
}

/// Turns an utterance plus inventory into a validated `ActionPlan`.
pub struct PlanExtractor<'a> {
    model: &'a dyn LanguageModel,
    timeout: Duration,
    max_attempts: u32,
}

impl<'a> PlanExtractor<'a> {
    /// `max_attempts` is clamped to `1..=MAX_ATTEMPTS`.
    pub fn new(model: &'a dyn LanguageModel, timeout: Duration, max_attempts: u32) -> Self {
        Self {
            model,
            timeout,
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS),
        }
    }

    pub async fn extract(
        &self,
        utterance: &str,
        language: &str,
        inventory: &InventoryMap,
    ) -> Result<ActionPlan, ExtractionError> {
        let prompt = build_prompt(utterance, language, inventory);
        tracing::debug!(
            model = self.model.model_name(),
            prompt_bytes = prompt.len(),
            devices = inventory.len(),
            "extraction prompt built"
        );

        let mut attempt = 1;
        loop {
            match self.attempt(&prompt).await {
                Ok(plan) => {
                    tracing::info!(
                        attempt,
                        entries = plan.entry_count(),
                        "action plan extracted"
                    );
                    return Ok(plan);
                }
                Err(e) if attempt < self.max_attempts => {
                    tracing::warn!(attempt, error = %e, "plan extraction failed, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<ActionPlan, ExtractionError> {
        let raw = timeout(self.timeout, self.model.generate(prompt))
            .await
            .map_err(|_| ExtractionError::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        match ActionPlan::parse(&raw) {
            Ok(plan) => Ok(plan),
            Err(e) => {
                tracing::warn!(error = %e, raw = %raw, "model output failed validation");
                Err(e.into())
            }
        }
    }
}
