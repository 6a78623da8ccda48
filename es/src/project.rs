//! Project entity types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::Priority;

/// Unique identifier for a project
pub type ProjectId = i64;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Paused,
    Completed,
    Abandoned,
}

/// Read-time snapshot of a project record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub id: ProjectId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub estimated_time: Option<u32>,
    #[serde(default)]
    pub actual_time: u32,
    #[serde(default)]
    pub tags: Option<String>,
    /// Where the project physically lives (workbench, garage, laptop, ...)
    #[serde(default)]
    pub location: Option<String>,
    /// The next small step, if one is recorded
    #[serde(default)]
    pub next_action: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_worked_on: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}
