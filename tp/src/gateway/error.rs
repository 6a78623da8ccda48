//! Gateway error types

use entitystore::{ProjectId, StoreError, TaskId};
use thiserror::Error;

/// Errors from entity gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),

    #[error("entity API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("entity API unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("entity store error: {0}")]
    Store(StoreError),

    #[error("invalid entity API response: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// True for missing-entity outcomes, regardless of which path served
    /// the call
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::TaskNotFound(_) | GatewayError::ProjectNotFound(_))
    }

    /// True for failures of the transport or the far side, the cases where
    /// a tiered gateway may try its other path
    pub fn is_transport(&self) -> bool {
        match self {
            GatewayError::Network(_) => true,
            GatewayError::Api { status, .. } => *status >= 500,
            GatewayError::Store(StoreError::Io(_)) => true,
            _ => false,
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        // NotFound is a domain outcome, not a store internals problem
        match err {
            StoreError::TaskNotFound(id) => GatewayError::TaskNotFound(id),
            StoreError::ProjectNotFound(id) => GatewayError::ProjectNotFound(id),
            other => GatewayError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_maps_to_gateway_not_found() {
        let err: GatewayError = StoreError::TaskNotFound(7).into();
        assert!(matches!(err, GatewayError::TaskNotFound(7)));
        assert!(err.is_not_found());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_server_side_api_errors_are_transport() {
        let err = GatewayError::Api {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(err.is_transport());

        let err = GatewayError::Api {
            status: 400,
            message: "bad request".to_string(),
        };
        assert!(!err.is_transport());
    }
}
