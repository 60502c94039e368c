//! Per-utterance orchestration: refresh inventory, extract, execute.
//!
//! `VoicePipeline` holds only shared read-only collaborators, so one
//! instance can serve concurrent turns. Each turn fetches a fresh inventory;
//! nothing is cached between turns.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use hv_backend::{AutomationBackend, RestBackend, fetch_inventory};
use hv_protocol::{InventoryMap, TurnOutcome, TurnPhase, TurnRequest, TurnStatus};

use crate::config::AgentConfig;
use crate::executor::ActionExecutor;
use crate::extractor::{MAX_ATTEMPTS, PlanExtractor};
use crate::llm::{GeminiClient, LanguageModel};

/// Tunables for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Entity domains exposed to the model.
    pub allowed_domains: Vec<&'static str>,
    pub llm_timeout: Duration,
    pub max_attempts: u32,
    /// Drop plan entries naming entities outside the turn's inventory.
    pub restrict_to_inventory: bool,
    pub fallback_reply: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            allowed_domains: hv_protocol::SUPPORTED_DOMAINS.to_vec(),
            llm_timeout: Duration::from_secs(20),
            max_attempts: MAX_ATTEMPTS,
            restrict_to_inventory: false,
            fallback_reply: "Something went wrong".into(),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            allowed_domains: config.backend.allowed_domains(),
            llm_timeout: config.llm.timeout(),
            max_attempts: config.llm.max_attempts,
            restrict_to_inventory: config.pipeline.restrict_to_inventory,
            fallback_reply: config.pipeline.fallback_reply.clone(),
        }
    }
}

/// Turns utterances into replies, driving device changes along the way.
pub struct VoicePipeline {
    backend: Arc<dyn AutomationBackend>,
    model: Arc<dyn LanguageModel>,
    options: PipelineOptions,
}

impl VoicePipeline {
    pub fn new(
        backend: Arc<dyn AutomationBackend>,
        model: Arc<dyn LanguageModel>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            backend,
            model,
            options,
        }
    }

    /// Build a pipeline wired to the REST backend and the Gemini client.
    pub fn from_config(config: &AgentConfig) -> anyhow::Result<Self> {
        let backend = RestBackend::new(&config.backend)?;
        let model = GeminiClient::new(config.llm.clone())?;
        Ok(Self::new(
            Arc::new(backend),
            Arc::new(model),
            PipelineOptions::from_config(config),
        ))
    }

    /// Handle one utterance and return the text to speak back. Never fails.
    pub async fn process(
        &self,
        utterance: &str,
        language: &str,
        conversation_id: Option<&str>,
    ) -> String {
        let mut request = TurnRequest::new(utterance, language);
        if let Some(id) = conversation_id {
            request = request.with_conversation(id);
        }
        self.run_turn(&request).await.reply
    }

    /// Handle one turn and report what happened.
    pub async fn run_turn(&self, request: &TurnRequest) -> TurnOutcome {
        let start = Instant::now();
        let turn_id = request.id;
        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(|| turn_id.to_string());

        tracing::info!(
            %turn_id,
            language = %request.language,
            phase = %TurnPhase::Refreshing,
            "turn started"
        );

        let records = fetch_inventory(self.backend.as_ref(), &self.options.allowed_domains).await;
        let inventory = InventoryMap::from_records(&records);

        let extractor = PlanExtractor::new(
            self.model.as_ref(),
            self.options.llm_timeout,
            self.options.max_attempts,
        );

        let mut plan = match extractor
            .extract(&request.utterance, &request.language, &inventory)
            .await
        {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(%turn_id, error = %e, "no usable action plan, sending fallback reply");
                let latency_ms = start.elapsed().as_millis() as u64;
                tracing::info!(%turn_id, phase = %TurnPhase::Done, latency_ms, "turn finished");
                return TurnOutcome {
                    turn_id,
                    conversation_id,
                    status: TurnStatus::ExtractionFailed,
                    reply: self.options.fallback_reply.clone(),
                    entities_seen: inventory.len(),
                    calls_issued: 0,
                    calls_failed: 0,
                    latency_ms,
                    responded_at: Utc::now(),
                };
            }
        };

        if self.options.restrict_to_inventory {
            let dropped = plan.retain_entities(|id| inventory.contains(id));
            for entity_id in &dropped {
                tracing::warn!(%turn_id, %entity_id, "dropping entry for entity not in inventory");
            }
        }

        tracing::info!(
            %turn_id,
            phase = %TurnPhase::Executing,
            entries = plan.entry_count(),
            "executing action plan"
        );
        let report = ActionExecutor::new(self.backend.as_ref()).run(&plan).await;

        let latency_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            %turn_id,
            phase = %TurnPhase::Done,
            calls_issued = report.issued.len(),
            calls_failed = report.failures.len(),
            latency_ms,
            "turn finished"
        );

        TurnOutcome {
            turn_id,
            conversation_id,
            status: TurnStatus::Completed,
            reply: report.reply,
            entities_seen: inventory.len(),
            calls_issued: report.issued.len(),
            calls_failed: report.failures.len(),
            latency_ms,
            responded_at: Utc::now(),
        }
    }
}
