//! Task entity types

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::project::ProjectId;

/// Unique identifier for a task
pub type TaskId = i64;

/// Sentinel string reasoning output uses for "give this draft the original
/// task's project" - resolved at execution time
pub const INHERIT_PROJECT_SENTINEL: &str = "INHERIT_FROM_ORIGINAL_TASK";

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Energy level a task calls for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Task lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// Project reference carried by a draft: a concrete project id, or the
/// inherit sentinel that is resolved against the original task at execution
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectRef {
    Id(ProjectId),
    Inherit,
}

impl Serialize for ProjectRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProjectRef::Id(id) => serializer.serialize_i64(*id),
            ProjectRef::Inherit => serializer.serialize_str(INHERIT_PROJECT_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for ProjectRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(ProjectId),
            Text(String),
        }

        // Any non-numeric reference (the sentinel included) defers resolution
        // to execution time.
        match Raw::deserialize(deserializer)? {
            Raw::Id(id) => Ok(ProjectRef::Id(id)),
            Raw::Text(_) => Ok(ProjectRef::Inherit),
        }
    }
}

/// Read-time snapshot of a task record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub project_id: Option<ProjectId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_estimate")]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub actual_minutes: u32,
    #[serde(default)]
    pub is_suggestion: bool,
    #[serde(default)]
    pub energy_level: EnergyLevel,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Partial task record used when proposing new tasks
///
/// The `project` field carries either a concrete id or
/// [`ProjectRef::Inherit`]; unresolved drafts are created without a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_estimate")]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub energy_level: EnergyLevel,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default, rename = "project_id")]
    pub project: Option<ProjectRef>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub is_suggestion: bool,
}

impl TaskDraft {
    /// Create a draft with just a title, everything else defaulted
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            estimated_minutes: default_estimate(),
            priority: Priority::default(),
            energy_level: EnergyLevel::default(),
            context: None,
            project: None,
            status: TaskStatus::default(),
            is_suggestion: false,
        }
    }
}

/// Partial update applied to an existing task
///
/// Only fields that are `Some` are written. Setting `is_completed` also
/// maintains `completed_at` and the status transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<EnergyLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TaskUpdate {
    /// Update that replaces only the description
    pub fn description(text: impl Into<String>) -> Self {
        Self {
            description: Some(text.into()),
            ..Self::default()
        }
    }

    /// True if no field would be written
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.estimated_minutes.is_none()
            && self.energy_level.is_none()
            && self.context.is_none()
            && self.is_completed.is_none()
    }
}

fn default_estimate() -> u32 {
    crate::DEFAULT_ESTIMATED_MINUTES
}
