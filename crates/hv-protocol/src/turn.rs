use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One utterance handed to the pipeline by the conversation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Unique turn ID (UUIDv7 for time-sortability).
    pub id: Uuid,
    /// Raw user text.
    pub utterance: String,
    /// Language tag supplied by the host (e.g. "en", "zh-TW").
    pub language: String,
    /// Opaque conversation handle owned by the session layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TurnRequest {
    pub fn new(utterance: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            utterance: utterance.into(),
            language: language.into(),
            conversation_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// Pipeline phases of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Fetching inventory and building the extraction prompt.
    Refreshing,
    /// Issuing device-control calls.
    Executing,
    Done,
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Refreshing => "refreshing",
            Self::Executing => "executing",
            Self::Done => "done",
        })
    }
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// Plan extracted and executed; individual calls may still have failed.
    Completed,
    /// No usable plan; fallback reply returned, nothing executed.
    ExtractionFailed,
}

/// Result of one turn, returned to the conversation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub turn_id: Uuid,
    /// Inbound conversation id, or the turn id when none was given.
    pub conversation_id: String,
    pub status: TurnStatus,
    /// Text to speak back to the user.
    pub reply: String,
    /// Entities exposed to the model this turn.
    pub entities_seen: usize,
    pub calls_issued: usize,
    pub calls_failed: usize,
    pub latency_ms: u64,
    pub responded_at: DateTime<Utc>,
}
