//! Entity access gateway
//!
//! Uniform read/write access to Task and Project entities. Callers depend
//! only on the [`EntityGateway`] trait; whether a call was served by the
//! in-process store or the remote entity API is not observable.

mod error;
mod local;
mod remote;
mod tiered;

use async_trait::async_trait;
use entitystore::{ProjectId, ProjectSnapshot, TaskDraft, TaskId, TaskSnapshot, TaskUpdate};

pub use error::GatewayError;
pub use local::LocalGateway;
pub use remote::HttpGateway;
pub use tiered::TieredGateway;

/// Uniform access to Task and Project entities
///
/// One method per capability; no runtime name-based dispatch. Creation and
/// deletion mutate shared durable state immediately and visibly to
/// subsequent reads. `create_tasks` is not guaranteed to be all-or-nothing.
#[async_trait]
pub trait EntityGateway: Send + Sync {
    /// Fetch a task snapshot
    async fn get_task(&self, id: TaskId) -> Result<TaskSnapshot, GatewayError>;

    /// Fetch a project snapshot
    async fn get_project(&self, id: ProjectId) -> Result<ProjectSnapshot, GatewayError>;

    /// All tasks belonging to a project
    async fn list_project_tasks(&self, id: ProjectId) -> Result<Vec<TaskSnapshot>, GatewayError>;

    /// Create tasks from drafts, in order
    async fn create_tasks(&self, drafts: &[TaskDraft]) -> Result<Vec<TaskSnapshot>, GatewayError>;

    /// Apply a partial update to a task
    async fn update_task(&self, id: TaskId, update: &TaskUpdate) -> Result<TaskSnapshot, GatewayError>;

    /// Delete a task
    async fn delete_task(&self, id: TaskId) -> Result<(), GatewayError>;
}
