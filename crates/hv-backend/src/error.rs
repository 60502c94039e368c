//! Backend error types.

use thiserror::Error;

/// Errors talking to the automation backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(String),

    #[error("backend returned HTTP {status} for {path}")]
    Status { status: u16, path: String },

    #[error("backend response could not be decoded: {0}")]
    Decode(String),

    #[error("invalid backend configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Convenience alias for backend results.
pub type BackendResult<T> = Result<T, BackendError>;

/// The device inventory could not be read. Recovered by using an empty one.
#[derive(Debug, Error)]
#[error("inventory fetch failed: {0}")]
pub struct InventoryFetchError(#[from] pub BackendError);
