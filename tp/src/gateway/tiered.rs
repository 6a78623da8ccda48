//! Tiered gateway: direct store first, remote API on transport failure

use std::sync::Arc;

use async_trait::async_trait;
use entitystore::{ProjectId, ProjectSnapshot, TaskDraft, TaskId, TaskSnapshot, TaskUpdate};
use tracing::warn;

use super::{EntityGateway, GatewayError};

/// Gateway that prefers the direct path and falls back to the remote path
/// on transport failure only
///
/// NotFound never triggers the fallback: a missing entity is a domain
/// answer, and asking a second source would let the two paths disagree.
pub struct TieredGateway {
    primary: Arc<dyn EntityGateway>,
    fallback: Arc<dyn EntityGateway>,
}

impl TieredGateway {
    /// Compose a primary gateway with a fallback
    pub fn new(primary: Arc<dyn EntityGateway>, fallback: Arc<dyn EntityGateway>) -> Self {
        Self { primary, fallback }
    }
}

macro_rules! tiered_call {
    ($self:ident, $op:literal, $call:ident ( $($arg:expr),* )) => {
        match $self.primary.$call($($arg),*).await {
            Err(e) if e.is_transport() => {
                warn!(op = $op, error = %e, "Primary gateway failed, trying fallback");
                $self.fallback.$call($($arg),*).await
            }
            other => other,
        }
    };
}

#[async_trait]
impl EntityGateway for TieredGateway {
    async fn get_task(&self, id: TaskId) -> Result<TaskSnapshot, GatewayError> {
        tiered_call!(self, "get_task", get_task(id))
    }

    async fn get_project(&self, id: ProjectId) -> Result<ProjectSnapshot, GatewayError> {
        tiered_call!(self, "get_project", get_project(id))
    }

    async fn list_project_tasks(&self, id: ProjectId) -> Result<Vec<TaskSnapshot>, GatewayError> {
        tiered_call!(self, "list_project_tasks", list_project_tasks(id))
    }

    async fn create_tasks(&self, drafts: &[TaskDraft]) -> Result<Vec<TaskSnapshot>, GatewayError> {
        tiered_call!(self, "create_tasks", create_tasks(drafts))
    }

    async fn update_task(&self, id: TaskId, update: &TaskUpdate) -> Result<TaskSnapshot, GatewayError> {
        tiered_call!(self, "update_task", update_task(id, update))
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), GatewayError> {
        tiered_call!(self, "delete_task", delete_task(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Gateway whose reads either succeed, 404, or fail like a dead server
    struct ScriptedGateway {
        mode: Mode,
        calls: AtomicUsize,
    }

    enum Mode {
        Ok,
        NotFound,
        Unreachable,
    }

    impl ScriptedGateway {
        fn new(mode: Mode) -> Arc<Self> {
            Arc::new(Self {
                mode,
                calls: AtomicUsize::new(0),
            })
        }

        fn answer(&self, id: TaskId) -> Result<TaskSnapshot, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                Mode::Ok => Ok(TaskSnapshot {
                    id,
                    project_id: Some(1),
                    title: "stub".to_string(),
                    description: None,
                    status: Default::default(),
                    priority: Default::default(),
                    estimated_minutes: 15,
                    actual_minutes: 0,
                    is_suggestion: false,
                    energy_level: Default::default(),
                    context: None,
                    is_completed: false,
                    created_at: None,
                    updated_at: None,
                    completed_at: None,
                }),
                Mode::NotFound => Err(GatewayError::TaskNotFound(id)),
                Mode::Unreachable => Err(GatewayError::Api {
                    status: 503,
                    message: "down".to_string(),
                }),
            }
        }
    }

    #[async_trait]
    impl EntityGateway for ScriptedGateway {
        async fn get_task(&self, id: TaskId) -> Result<TaskSnapshot, GatewayError> {
            self.answer(id)
        }
        async fn get_project(&self, _id: ProjectId) -> Result<ProjectSnapshot, GatewayError> {
            unimplemented!("not used in these tests")
        }
        async fn list_project_tasks(&self, _id: ProjectId) -> Result<Vec<TaskSnapshot>, GatewayError> {
            Ok(vec![])
        }
        async fn create_tasks(&self, _drafts: &[TaskDraft]) -> Result<Vec<TaskSnapshot>, GatewayError> {
            Ok(vec![])
        }
        async fn update_task(&self, id: TaskId, _update: &TaskUpdate) -> Result<TaskSnapshot, GatewayError> {
            self.answer(id)
        }
        async fn delete_task(&self, _id: TaskId) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let primary = ScriptedGateway::new(Mode::Ok);
        let fallback = ScriptedGateway::new(Mode::Ok);
        let tiered = TieredGateway::new(primary.clone(), fallback.clone());

        tiered.get_task(1).await.unwrap();
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_not_found_does_not_fall_back() {
        let primary = ScriptedGateway::new(Mode::NotFound);
        let fallback = ScriptedGateway::new(Mode::Ok);
        let tiered = TieredGateway::new(primary, fallback.clone());

        let err = tiered.get_task(1).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back() {
        let primary = ScriptedGateway::new(Mode::Unreachable);
        let fallback = ScriptedGateway::new(Mode::Ok);
        let tiered = TieredGateway::new(primary, fallback.clone());

        let task = tiered.get_task(9).await.unwrap();
        assert_eq!(task.id, 9);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }
}
