//! Error types for extraction and execution.

use thiserror::Error;

use hv_backend::BackendError;
use hv_protocol::{SchemaValidationError, ServiceCall};

use crate::llm::LlmError;

/// No usable action plan could be obtained for an utterance.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("model call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
}

/// A single device-control call failed. Other calls still run.
#[derive(Debug, Error)]
#[error("{} for {} failed: {source}", .call.path(), .call.entity_id())]
pub struct ExecutionOperationError {
    pub call: ServiceCall,
    #[source]
    pub source: BackendError,
}
