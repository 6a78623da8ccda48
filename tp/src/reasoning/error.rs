//! Generation error types

use std::time::Duration;
use thiserror::Error;

/// Errors from the external generation service
///
/// Classification drives the degradation policy: timeouts earn one
/// simplified retry, connection failures skip straight to fallback, and
/// everything else falls back immediately.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation service unreachable")]
    Connect,

    #[error("generation API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(reqwest::Error),

    #[error("invalid generation response: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    /// True for read-timeouts, the only case that earns a retry
    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerationError::Timeout(_))
    }

    /// True when the service could not be reached at all
    pub fn is_connect(&self) -> bool {
        matches!(self, GenerationError::Connect)
    }
}
