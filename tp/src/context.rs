//! Context gathering
//!
//! Before reasoning about an operation, the orchestrator assembles a
//! bounded bundle of entity snapshots: each target task, its parent
//! project, and the project's sibling tasks. The bundle is built once per
//! request and never mutated after handoff to reasoning.

use std::sync::Arc;

use entitystore::{ProjectId, ProjectSnapshot, TaskId, TaskSnapshot};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use thiserror::Error;
use tracing::{debug, info};

use crate::gateway::{EntityGateway, GatewayError};
use crate::ops::OperationRequest;

/// Context assembly failure
///
/// Aborts preview creation entirely; surfaced to the caller rather than
/// retried here. A missing target task never produces a partial bundle.
#[derive(Debug, Error)]
pub enum GatherError {
    #[error("task {task_id} not found")]
    TaskMissing { task_id: TaskId },

    #[error("failed to fetch task {task_id}: {source}")]
    TaskFetch {
        task_id: TaskId,
        #[source]
        source: GatewayError,
    },

    #[error("failed to fetch project {project_id}: {source}")]
    ProjectFetch {
        project_id: ProjectId,
        #[source]
        source: GatewayError,
    },
}

/// One entry in a context bundle
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ContextEntry {
    Task(TaskSnapshot),
    Project {
        details: ProjectSnapshot,
        #[serde(rename = "all_tasks")]
        tasks: Vec<TaskSnapshot>,
    },
}

/// Snapshot bundle gathered for one operation request
///
/// Entries are keyed `task_<id>` / `project_<id>` and kept in insertion
/// order, so "the first task" is well-defined for later sentinel
/// resolution.
#[derive(Debug, Clone, Default)]
pub struct ContextBundle {
    entries: Vec<(String, ContextEntry)>,
}

impl ContextBundle {
    /// Create an empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a target task snapshot
    pub fn insert_task(&mut self, task: TaskSnapshot) {
        self.entries.push((format!("task_{}", task.id), ContextEntry::Task(task)));
    }

    /// Record a project snapshot with its sibling tasks
    pub fn insert_project(&mut self, details: ProjectSnapshot, tasks: Vec<TaskSnapshot>) {
        self.entries
            .push((format!("project_{}", details.id), ContextEntry::Project { details, tasks }));
    }

    /// Look up a task snapshot by id
    pub fn task(&self, id: TaskId) -> Option<&TaskSnapshot> {
        self.tasks().find(|t| t.id == id)
    }

    /// Look up a project entry by id
    pub fn project(&self, id: ProjectId) -> Option<(&ProjectSnapshot, &[TaskSnapshot])> {
        self.entries.iter().find_map(|(_, entry)| match entry {
            ContextEntry::Project { details, tasks } if details.id == id => Some((details, tasks.as_slice())),
            _ => None,
        })
    }

    /// Target task snapshots in insertion order
    pub fn tasks(&self) -> impl Iterator<Item = &TaskSnapshot> {
        self.entries.iter().filter_map(|(_, entry)| match entry {
            ContextEntry::Task(task) => Some(task),
            _ => None,
        })
    }

    /// Project id of the first task snapshot carrying one
    ///
    /// Used to resolve the inherit-project sentinel at execution time.
    /// Known limitation: an operation targeting tasks from several projects
    /// resolves every draft against the first task's project.
    pub fn first_task_project_id(&self) -> Option<ProjectId> {
        self.tasks().find_map(|t| t.project_id)
    }

    /// True when the bundle holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries (tasks and projects)
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Serialize for ContextBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

/// Assembles context bundles via the entity gateway
pub struct ContextGatherer {
    gateway: Arc<dyn EntityGateway>,
}

impl ContextGatherer {
    /// Create a gatherer over the given gateway
    pub fn new(gateway: Arc<dyn EntityGateway>) -> Self {
        Self { gateway }
    }

    /// Gather the context bundle for a request
    ///
    /// Fetches every target task, then each task's parent project with its
    /// full sibling list. Any missing task aborts the whole gather; no
    /// retries happen at this layer.
    pub async fn gather(&self, request: &OperationRequest) -> Result<ContextBundle, GatherError> {
        let mut bundle = ContextBundle::new();

        for &task_id in &request.task_ids {
            let task = self.gateway.get_task(task_id).await.map_err(|e| {
                if e.is_not_found() {
                    GatherError::TaskMissing { task_id }
                } else {
                    GatherError::TaskFetch { task_id, source: e }
                }
            })?;

            let project_id = task.project_id;
            bundle.insert_task(task);

            if let Some(project_id) = project_id
                && bundle.project(project_id).is_none()
            {
                let details = self
                    .gateway
                    .get_project(project_id)
                    .await
                    .map_err(|source| GatherError::ProjectFetch { project_id, source })?;
                let tasks = self
                    .gateway
                    .list_project_tasks(project_id)
                    .await
                    .map_err(|source| GatherError::ProjectFetch { project_id, source })?;
                debug!(project_id, siblings = tasks.len(), "Gathered project context");
                bundle.insert_project(details, tasks);
            }
        }

        info!(
            task_count = request.task_ids.len(),
            entries = bundle.len(),
            "Context gather complete"
        );
        Ok(bundle)
    }
}
