//! Orchestrator error types
//!
//! Only validation, not-found, and gather failures cross the orchestrator
//! boundary as errors. Reasoning degradation and partial mutation failure
//! are captured as data inside the preview or the execution result, so
//! callers always get a terminating response for anything related to the
//! unreliable reasoning call.

use thiserror::Error;

use crate::context::GatherError;
use crate::ops::OperationKind;
use crate::preview::PreviewId;

/// Errors surfaced to orchestrator callers
#[derive(Debug, Error)]
pub enum AgentError {
    /// Declared operation kind with no implemented strategy
    /// (4xx-equivalent, rejected before any I/O)
    #[error("unsupported operation '{operation}' (implemented operations: {implemented})")]
    UnsupportedOperation {
        operation: OperationKind,
        implemented: String,
    },

    /// Request shape invalid for the operation (4xx-equivalent, rejected
    /// before any I/O)
    #[error("operation '{operation}' requires at least one task id")]
    MissingTaskIds { operation: OperationKind },

    /// Unknown, expired, or already-consumed preview handle
    /// (404-equivalent; recoverable by requesting a fresh preview)
    #[error("preview {0} not found")]
    PreviewNotFound(PreviewId),

    /// Context assembly hit a missing or unreachable entity
    /// (5xx-equivalent; aborts preview creation, not retried here)
    #[error("context gathering failed: {0}")]
    Gather(#[from] GatherError),
}

impl AgentError {
    /// Build the unsupported-operation error with the implemented list
    pub(crate) fn unsupported(operation: OperationKind) -> Self {
        let implemented: Vec<&str> = OperationKind::all()
            .into_iter()
            .filter(|k| k.is_implemented())
            .map(|k| k.as_str())
            .collect();
        AgentError::UnsupportedOperation {
            operation,
            implemented: implemented.join(", "),
        }
    }

    /// True for errors the caller should fix before retrying
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AgentError::UnsupportedOperation { .. } | AgentError::MissingTaskIds { .. }
        )
    }
}
