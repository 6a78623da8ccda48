//! Preview artifacts and their lifecycle
//!
//! A preview is the inspectable, not-yet-applied description of proposed
//! mutations plus rationale and confidence. Callers hold only an opaque
//! [`PreviewId`]; the store owns the preview until it is consumed exactly
//! once by execution or cancellation.

mod builder;
mod store;

use std::fmt;
use std::str::FromStr;

use entitystore::{TaskDraft, TaskId, TaskUpdate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::ContextBundle;
use crate::ops::OperationKind;

pub use builder::build_preview;
pub use store::{InMemoryPreviewStore, PreviewStore};

/// Opaque handle referencing exactly one stored preview
///
/// Generated unguessably; consumed (never resolvable again) on execution
/// or cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewId(Uuid);

impl PreviewId {
    /// Generate a fresh, globally unique handle
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PreviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PreviewId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A single proposed change to the task store
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProposedMutation {
    /// Create new tasks from drafts
    CreateTasks { tasks: Vec<TaskDraft>, rationale: String },
    /// Delete an existing task
    DeleteTask { task_id: TaskId, rationale: String },
    /// Apply a partial update to an existing task
    UpdateTask {
        task_id: TaskId,
        updates: TaskUpdate,
        rationale: String,
    },
}

impl ProposedMutation {
    /// Wire name of this mutation's action
    pub fn action(&self) -> &'static str {
        match self {
            ProposedMutation::CreateTasks { .. } => "create_tasks",
            ProposedMutation::DeleteTask { .. } => "delete_task",
            ProposedMutation::UpdateTask { .. } => "update_task",
        }
    }
}

/// Inspectable description of proposed changes, surfaced to the caller
/// before anything is applied
///
/// Immutable once built; the preview store is its sole owner while it
/// awaits approval.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    /// The operation this preview was built for
    pub operation: OperationKind,
    /// Snapshots of the entities the proposal was reasoned about
    pub original_data: ContextBundle,
    /// Ordered mutations to apply on approval
    pub proposed_changes: Vec<ProposedMutation>,
    /// Concatenated reasoning narrative
    pub reasoning: String,
    /// Confidence in [0, 1]
    pub confidence_score: f64,
    /// Short caller-facing impact summary
    pub estimated_impact: String,
}
