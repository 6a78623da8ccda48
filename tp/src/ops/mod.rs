//! Operation kinds and their strategies
//!
//! Every caller-facing operation is a variant of [`OperationKind`],
//! dispatched exactly once at the orchestrator boundary into an
//! [`OperationStrategy`]. A strategy owns everything operation-specific:
//! request validation, the full and simplified reasoning prompts, parsing
//! of the model's structured output, and the deterministic fallback used
//! when reasoning degrades.
//!
//! Only `SplitTask` and `ImproveDescription` have strategies today; the
//! remaining kinds are declared extension points that show up in the
//! capability listing and are rejected at preview creation.

mod improve;
mod split;

use std::collections::BTreeMap;
use std::fmt;

use entitystore::{ProjectId, TaskId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::ContextBundle;
use crate::preview::ProposedMutation;

pub use improve::ImproveDescriptionStrategy;
pub use split::SplitTaskStrategy;

/// Supported operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    SplitTask,
    ImproveDescription,
    MergeTasks,
    #[serde(rename = "define_new_project")]
    DefineProject,
    OptimizeWorkflow,
    SuggestPriorities,
}

impl OperationKind {
    /// Wire name of this kind
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::SplitTask => "split_task",
            OperationKind::ImproveDescription => "improve_description",
            OperationKind::MergeTasks => "merge_tasks",
            OperationKind::DefineProject => "define_new_project",
            OperationKind::OptimizeWorkflow => "optimize_workflow",
            OperationKind::SuggestPriorities => "suggest_priorities",
        }
    }

    /// All declared kinds, implemented or not
    pub fn all() -> [OperationKind; 6] {
        [
            OperationKind::SplitTask,
            OperationKind::ImproveDescription,
            OperationKind::MergeTasks,
            OperationKind::DefineProject,
            OperationKind::OptimizeWorkflow,
            OperationKind::SuggestPriorities,
        ]
    }

    /// True when a strategy exists for this kind
    pub fn is_implemented(self) -> bool {
        strategy_for(self).is_some()
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable request for one orchestrated operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRequest {
    pub operation: OperationKind,
    #[serde(default)]
    pub task_ids: Vec<TaskId>,
    #[serde(default)]
    pub project_ids: Vec<ProjectId>,
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub user_preferences: BTreeMap<String, serde_json::Value>,
}

impl OperationRequest {
    /// Request to split the given tasks
    pub fn split_tasks(task_ids: Vec<TaskId>) -> Self {
        Self {
            operation: OperationKind::SplitTask,
            task_ids,
            project_ids: Vec::new(),
            context: BTreeMap::new(),
            user_preferences: BTreeMap::new(),
        }
    }

    /// Request to improve the given tasks' descriptions
    pub fn improve_descriptions(task_ids: Vec<TaskId>) -> Self {
        Self {
            operation: OperationKind::ImproveDescription,
            task_ids,
            ..Self::split_tasks(Vec::new())
        }
    }
}

/// Capability listing entry for one operation kind
#[derive(Debug, Clone, Serialize)]
pub struct OperationInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub required_inputs: &'static [&'static str],
    pub optional_inputs: &'static [&'static str],
    pub implemented: bool,
}

/// Describe every declared operation kind
pub fn operations() -> Vec<OperationInfo> {
    OperationKind::all()
        .into_iter()
        .map(|kind| {
            let (description, required, optional): (&'static str, &'static [&'static str], &'static [&'static str]) =
                match kind {
                    OperationKind::SplitTask => (
                        "Split complex tasks into smaller, manageable subtasks",
                        &["task_ids"],
                        &["context", "user_preferences"],
                    ),
                    OperationKind::ImproveDescription => (
                        "Rewrite task descriptions to be clearer and more actionable",
                        &["task_ids"],
                        &["context", "user_preferences"],
                    ),
                    OperationKind::MergeTasks => (
                        "Merge related tasks into a single unified task",
                        &["task_ids"],
                        &["context", "user_preferences"],
                    ),
                    OperationKind::DefineProject => (
                        "Help define and structure a new project with initial tasks",
                        &["context"],
                        &["user_preferences"],
                    ),
                    OperationKind::OptimizeWorkflow => (
                        "Analyze and optimize task workflows for better productivity",
                        &["project_ids"],
                        &["task_ids", "context", "user_preferences"],
                    ),
                    OperationKind::SuggestPriorities => (
                        "Suggest task priorities based on deadlines, dependencies, and importance",
                        &["project_ids"],
                        &["task_ids", "context", "user_preferences"],
                    ),
                };
            OperationInfo {
                name: kind.as_str(),
                description,
                required_inputs: required,
                optional_inputs: optional,
                implemented: kind.is_implemented(),
            }
        })
        .collect()
}

/// Normalized proposal produced by a strategy
///
/// Either parsed from the reasoning service's structured output or built
/// by the strategy's deterministic fallback. Turned into a caller-facing
/// preview by the proposal builder.
#[derive(Debug, Clone)]
pub struct RawProposal {
    /// Ordered list of mutations to apply on approval
    pub mutations: Vec<ProposedMutation>,
    /// Human-readable reasoning, one step per entry
    pub reasoning_steps: Vec<String>,
    /// Confidence in [0, 1]
    pub confidence_score: f64,
    /// Short caller-facing impact summary
    pub impact_assessment: String,
}

/// Why a strategy could not use the model's output
#[derive(Debug, Error)]
pub enum ProposalParseError {
    #[error("no JSON object in model output")]
    NoJson,

    #[error("invalid proposal JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("proposal contained no usable changes")]
    Empty,
}

/// Everything operation-specific, behind one dispatch point
pub trait OperationStrategy: Send + Sync {
    /// The kind this strategy implements
    fn kind(&self) -> OperationKind;

    /// Validate request shape before any I/O
    fn validate(&self, request: &OperationRequest) -> Result<(), crate::agent::AgentError>;

    /// Full reasoning prompt with complete entity context
    fn full_prompt(&self, bundle: &ContextBundle, request: &OperationRequest) -> String;

    /// Stripped-down prompt used for the single retry after a timeout
    fn simple_prompt(&self, bundle: &ContextBundle, request: &OperationRequest) -> String;

    /// Parse sanitized model output into a proposal
    fn parse(&self, json: &str) -> Result<RawProposal, ProposalParseError>;

    /// Deterministic proposal when reasoning is unavailable
    ///
    /// Must succeed for any bundle, degrading to an empty mutation list
    /// with an explanatory rationale when targets are missing from it.
    fn fallback(&self, bundle: &ContextBundle, request: &OperationRequest) -> RawProposal;
}

static SPLIT_TASK: SplitTaskStrategy = SplitTaskStrategy;
static IMPROVE_DESCRIPTION: ImproveDescriptionStrategy = ImproveDescriptionStrategy;

/// Resolve the strategy for a kind, if one is implemented
pub fn strategy_for(kind: OperationKind) -> Option<&'static dyn OperationStrategy> {
    match kind {
        OperationKind::SplitTask => Some(&SPLIT_TASK),
        OperationKind::ImproveDescription => Some(&IMPROVE_DESCRIPTION),
        OperationKind::MergeTasks
        | OperationKind::DefineProject
        | OperationKind::OptimizeWorkflow
        | OperationKind::SuggestPriorities => None,
    }
}

/// Render the shared per-task context block used in reasoning prompts
pub(crate) fn task_summary(bundle: &ContextBundle, task_id: TaskId) -> Option<String> {
    let task = bundle.task(task_id)?;
    let mut block = format!(
        "Task (ID: {}):\n\
         - Title: {}\n\
         - Description: {}\n\
         - Priority: {}\n\
         - Estimated Time: {} minutes\n\
         - Energy Level: {}\n\
         - Status: {}\n\
         - Context: {}\n",
        task.id,
        task.title,
        task.description.as_deref().unwrap_or("N/A"),
        serde_name(&task.priority),
        task.estimated_minutes,
        serde_name(&task.energy_level),
        serde_name(&task.status),
        task.context.as_deref().unwrap_or("N/A"),
    );

    if let Some(project_id) = task.project_id
        && let Some((project, siblings)) = bundle.project(project_id)
    {
        let recent: Vec<&str> = siblings
            .iter()
            .rev()
            .filter(|t| !t.is_completed)
            .take(3)
            .map(|t| t.title.as_str())
            .collect();
        block.push_str(&format!(
            "\nProject Context:\n\
             - Project: {}\n\
             - Description: {}\n\
             - Location: {}\n\
             - Existing Tasks: {} total tasks\n\
             - Recent Incomplete Tasks: {}\n",
            project.title,
            project.description.as_deref().unwrap_or("N/A"),
            project.location.as_deref().unwrap_or("N/A"),
            siblings.len(),
            if recent.is_empty() { "none".to_string() } else { recent.join(", ") },
        ));
    }

    Some(block)
}

/// Lowercase wire name of a serde-serialized unit enum value
fn serde_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_kind_wire_names() {
        assert_eq!(OperationKind::SplitTask.as_str(), "split_task");
        assert_eq!(OperationKind::DefineProject.as_str(), "define_new_project");

        let parsed: OperationKind = serde_json::from_str("\"define_new_project\"").unwrap();
        assert_eq!(parsed, OperationKind::DefineProject);
        let parsed: OperationKind = serde_json::from_str("\"split_task\"").unwrap();
        assert_eq!(parsed, OperationKind::SplitTask);
    }

    #[test]
    fn test_unknown_operation_fails_deserialization() {
        assert!(serde_json::from_str::<OperationKind>("\"teleport_tasks\"").is_err());
    }

    #[test]
    fn test_operations_listing_covers_all_kinds() {
        let infos = operations();
        assert_eq!(infos.len(), 6);
        assert_eq!(infos.iter().filter(|i| i.implemented).count(), 2);

        let split = infos.iter().find(|i| i.name == "split_task").unwrap();
        assert!(split.implemented);
        assert_eq!(split.required_inputs, &["task_ids"]);

        let merge = infos.iter().find(|i| i.name == "merge_tasks").unwrap();
        assert!(!merge.implemented);
    }

    #[test]
    fn test_strategy_dispatch() {
        assert!(strategy_for(OperationKind::SplitTask).is_some());
        assert!(strategy_for(OperationKind::ImproveDescription).is_some());
        assert!(strategy_for(OperationKind::MergeTasks).is_none());
        assert!(strategy_for(OperationKind::SuggestPriorities).is_none());
    }
}
