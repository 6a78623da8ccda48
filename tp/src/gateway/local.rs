//! Direct in-process gateway over the entity store

use std::sync::Arc;

use async_trait::async_trait;
use entitystore::{ProjectId, ProjectSnapshot, TaskDraft, TaskId, TaskSnapshot, TaskStore, TaskUpdate};
use tracing::debug;

use super::{EntityGateway, GatewayError};

/// Gateway backed by the in-process [`TaskStore`]
///
/// Used when the orchestrator runs inside the same process as the entity
/// data. All calls are synchronous under the hood; the async surface exists
/// so callers cannot tell this path from the remote one.
pub struct LocalGateway {
    store: Arc<TaskStore>,
}

impl LocalGateway {
    /// Create a gateway over the given store
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EntityGateway for LocalGateway {
    async fn get_task(&self, id: TaskId) -> Result<TaskSnapshot, GatewayError> {
        Ok(self.store.get_task(id)?)
    }

    async fn get_project(&self, id: ProjectId) -> Result<ProjectSnapshot, GatewayError> {
        Ok(self.store.get_project(id)?)
    }

    async fn list_project_tasks(&self, id: ProjectId) -> Result<Vec<TaskSnapshot>, GatewayError> {
        Ok(self.store.tasks_for_project(id))
    }

    async fn create_tasks(&self, drafts: &[TaskDraft]) -> Result<Vec<TaskSnapshot>, GatewayError> {
        debug!(count = drafts.len(), "Creating tasks via local store");
        Ok(self.store.create_tasks(drafts)?)
    }

    async fn update_task(&self, id: TaskId, update: &TaskUpdate) -> Result<TaskSnapshot, GatewayError> {
        debug!(task_id = id, "Updating task via local store");
        Ok(self.store.update_task(id, update)?)
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), GatewayError> {
        debug!(task_id = id, "Deleting task via local store");
        Ok(self.store.delete_task(id)?)
    }
}
