//! In-process entity store
//!
//! A thread-safe in-memory store of projects and tasks. This is the direct
//! access path used when the orchestrator runs inside the same process as
//! the entity data; deployments that only have the REST surface available
//! use the HTTP gateway instead.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::project::{ProjectId, ProjectSnapshot};
use crate::task::{ProjectRef, TaskDraft, TaskId, TaskSnapshot, TaskStatus, TaskUpdate};

/// Errors from the in-process store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),

    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse seed data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Seed data: full snapshots with explicit ids, loaded from JSON
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub projects: Vec<ProjectSnapshot>,
    #[serde(default)]
    pub tasks: Vec<TaskSnapshot>,
}

#[derive(Default)]
struct Inner {
    projects: BTreeMap<ProjectId, ProjectSnapshot>,
    tasks: BTreeMap<TaskId, TaskSnapshot>,
    next_task_id: TaskId,
    next_project_id: ProjectId,
}

/// Thread-safe in-memory store of projects and tasks
pub struct TaskStore {
    inner: Mutex<Inner>,
}

impl TaskStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_task_id: 1,
                next_project_id: 1,
                ..Inner::default()
            }),
        }
    }

    /// Create a store pre-populated from seed data
    pub fn from_seed(seed: SeedData) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for project in seed.projects {
                inner.next_project_id = inner.next_project_id.max(project.id + 1);
                inner.projects.insert(project.id, project);
            }
            for task in seed.tasks {
                inner.next_task_id = inner.next_task_id.max(task.id + 1);
                inner.tasks.insert(task.id, task);
            }
            info!(
                projects = inner.projects.len(),
                tasks = inner.tasks.len(),
                "Seeded entity store"
            );
        }
        store
    }

    /// Create a store from a JSON seed file
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let seed: SeedData = serde_json::from_str(&content)?;
        debug!(path = %path.as_ref().display(), "Loaded seed file");
        Ok(Self::from_seed(seed))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Recover the map even if a writer panicked mid-operation
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetch a task snapshot
    pub fn get_task(&self, id: TaskId) -> Result<TaskSnapshot, StoreError> {
        self.lock().tasks.get(&id).cloned().ok_or(StoreError::TaskNotFound(id))
    }

    /// Fetch a project snapshot
    pub fn get_project(&self, id: ProjectId) -> Result<ProjectSnapshot, StoreError> {
        self.lock()
            .projects
            .get(&id)
            .cloned()
            .ok_or(StoreError::ProjectNotFound(id))
    }

    /// All tasks belonging to a project, in id order
    pub fn tasks_for_project(&self, id: ProjectId) -> Vec<TaskSnapshot> {
        self.lock()
            .tasks
            .values()
            .filter(|t| t.project_id == Some(id))
            .cloned()
            .collect()
    }

    /// Create tasks from drafts, in order
    ///
    /// Creation is not transactional: a draft referencing a missing project
    /// fails the call, but drafts created before it remain in the store.
    pub fn create_tasks(&self, drafts: &[TaskDraft]) -> Result<Vec<TaskSnapshot>, StoreError> {
        let mut inner = self.lock();
        let mut created = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let project_id = match draft.project {
                Some(ProjectRef::Id(id)) => {
                    if !inner.projects.contains_key(&id) {
                        return Err(StoreError::ProjectNotFound(id));
                    }
                    Some(id)
                }
                // Unresolved inherit references create project-less tasks
                Some(ProjectRef::Inherit) | None => None,
            };

            let id = inner.next_task_id;
            inner.next_task_id += 1;

            let task = TaskSnapshot {
                id,
                project_id,
                title: draft.title.clone(),
                description: draft.description.clone(),
                status: draft.status,
                priority: draft.priority,
                estimated_minutes: draft.estimated_minutes,
                actual_minutes: 0,
                is_suggestion: draft.is_suggestion,
                energy_level: draft.energy_level,
                context: draft.context.clone(),
                is_completed: false,
                created_at: Some(Utc::now()),
                updated_at: None,
                completed_at: None,
            };
            inner.tasks.insert(id, task.clone());
            created.push(task);
        }

        debug!(count = created.len(), "Created tasks");
        Ok(created)
    }

    /// Apply a partial update to a task
    pub fn update_task(&self, id: TaskId, update: &TaskUpdate) -> Result<TaskSnapshot, StoreError> {
        let mut inner = self.lock();
        let task = inner.tasks.get_mut(&id).ok_or(StoreError::TaskNotFound(id))?;

        if let Some(title) = &update.title {
            task.title = title.clone();
        }
        if let Some(description) = &update.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(minutes) = update.estimated_minutes {
            task.estimated_minutes = minutes;
        }
        if let Some(energy) = update.energy_level {
            task.energy_level = energy;
        }
        if let Some(context) = &update.context {
            task.context = Some(context.clone());
        }
        if let Some(completed) = update.is_completed {
            if completed && !task.is_completed {
                task.completed_at = Some(Utc::now());
                task.status = TaskStatus::Completed;
            } else if !completed && task.is_completed {
                task.completed_at = None;
                if task.status == TaskStatus::Completed {
                    task.status = TaskStatus::Pending;
                }
            }
            task.is_completed = completed;
        }
        task.updated_at = Some(Utc::now());

        Ok(task.clone())
    }

    /// Delete a task
    pub fn delete_task(&self, id: TaskId) -> Result<(), StoreError> {
        self.lock()
            .tasks
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::TaskNotFound(id))
    }

    /// Number of tasks currently stored
    pub fn task_count(&self) -> usize {
        self.lock().tasks.len()
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
