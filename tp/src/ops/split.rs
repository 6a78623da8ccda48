//! Task splitting strategy
//!
//! Splits an oversized task into smaller subtasks: reasoning proposes the
//! split, execution creates the subtasks and deletes the original. The
//! deterministic fallback is a three-way plan/execute/review split.

use entitystore::{EnergyLevel, ProjectRef, TaskDraft, TaskId};
use serde::Deserialize;

use super::{OperationKind, OperationRequest, OperationStrategy, ProposalParseError, RawProposal, task_summary};
use crate::agent::AgentError;
use crate::context::ContextBundle;
use crate::preview::ProposedMutation;

/// Fallback confidence for the rule-based split
const FALLBACK_CONFIDENCE: f64 = 0.6;

/// Minimum minutes per fallback subtask
const MIN_SUBTASK_MINUTES: u32 = 5;

/// Model output schema for one task's split
#[derive(Debug, Clone, Deserialize)]
struct TaskSplit {
    #[serde(default)]
    original_task_id: Option<TaskId>,
    #[serde(default)]
    subtasks: Vec<TaskDraft>,
    #[serde(default)]
    split_rationale: String,
}

/// Full model output schema for a split proposal
#[derive(Debug, Clone, Deserialize)]
struct SplitResponse {
    #[serde(default = "default_reasoning_steps")]
    reasoning_steps: Vec<String>,
    #[serde(default)]
    task_splits: Vec<TaskSplit>,
    #[serde(default = "default_confidence")]
    confidence_score: f64,
    #[serde(default)]
    impact_assessment: String,
}

fn default_reasoning_steps() -> Vec<String> {
    vec!["Model analysis completed".to_string()]
}

fn default_confidence() -> f64 {
    0.7
}

/// Strategy for [`OperationKind::SplitTask`]
pub struct SplitTaskStrategy;

impl OperationStrategy for SplitTaskStrategy {
    fn kind(&self) -> OperationKind {
        OperationKind::SplitTask
    }

    fn validate(&self, request: &OperationRequest) -> Result<(), AgentError> {
        if request.task_ids.is_empty() {
            return Err(AgentError::MissingTaskIds {
                operation: self.kind(),
            });
        }
        Ok(())
    }

    fn full_prompt(&self, bundle: &ContextBundle, request: &OperationRequest) -> String {
        let context_text: String = request
            .task_ids
            .iter()
            .filter_map(|&id| task_summary(bundle, id))
            .collect::<Vec<_>>()
            .join("\n");

        let first_id = request.task_ids.first().copied().unwrap_or_default();

        format!(
            r#"You are an expert productivity consultant analyzing tasks for optimal splitting.

{context_text}
Your task is to analyze the given task(s) and determine how to split them into smaller, more manageable subtasks.

Provide your analysis in this exact JSON format:
{{
  "reasoning_steps": [
    "Step-by-step reasoning about why and how to split this task",
    "Consider task complexity, time estimates, dependencies, etc."
  ],
  "task_splits": [
    {{
      "original_task_id": {first_id},
      "subtasks": [
        {{
          "title": "Specific subtask title",
          "description": "Detailed description",
          "estimated_minutes": 15,
          "priority": "medium",
          "energy_level": "medium",
          "context": "when you have focus",
          "project_id": "INHERIT_FROM_ORIGINAL_TASK"
        }}
      ],
      "split_rationale": "Overall reason for this particular split approach"
    }}
  ],
  "confidence_score": 0.85,
  "impact_assessment": "This split will make the work more manageable by...",
  "recommendations": [
    "Additional recommendations for task management"
  ]
}}

Key principles:
1. Each subtask should be 5-20 minutes
2. Subtasks should be logically ordered
3. Avoid duplicating existing project tasks
4. Consider the original task's context and energy requirements
5. Ensure subtasks together complete the original task
6. Use "INHERIT_FROM_ORIGINAL_TASK" for project_id - it will be set automatically
"#
        )
    }

    fn simple_prompt(&self, bundle: &ContextBundle, request: &OperationRequest) -> String {
        let summaries: Vec<String> = request
            .task_ids
            .iter()
            .filter_map(|&id| bundle.task(id))
            .map(|t| format!("Task {}: {} ({}min)", t.id, t.title, t.estimated_minutes))
            .collect();

        let first_id = request.task_ids.first().copied().unwrap_or_default();

        format!(
            r#"Split this task into 2-5 smaller subtasks. Return JSON only:

{}

{{
  "task_splits": [{{
    "original_task_id": {first_id},
    "subtasks": [{{
      "title": "Step name",
      "description": "What to do",
      "estimated_minutes": 10,
      "priority": "medium",
      "energy_level": "medium",
      "context": "when you have time",
      "project_id": "INHERIT_FROM_ORIGINAL_TASK"
    }}],
    "split_rationale": "Why split this way"
  }}],
  "confidence_score": 0.8,
  "reasoning_steps": ["Quick reasoning"]
}}"#,
            summaries.join("; "),
        )
    }

    fn parse(&self, json: &str) -> Result<RawProposal, ProposalParseError> {
        let response: SplitResponse = serde_json::from_str(json)?;
        if response.task_splits.is_empty() {
            return Err(ProposalParseError::Empty);
        }

        let mut mutations = Vec::new();
        for split in response.task_splits {
            let subtask_count = split.subtasks.len();
            mutations.push(ProposedMutation::CreateTasks {
                tasks: split.subtasks,
                rationale: split.split_rationale,
            });
            if let Some(task_id) = split.original_task_id {
                mutations.push(ProposedMutation::DeleteTask {
                    task_id,
                    rationale: format!("Original task replaced by {subtask_count} subtasks"),
                });
            }
        }

        Ok(RawProposal {
            mutations,
            reasoning_steps: response.reasoning_steps,
            confidence_score: response.confidence_score.clamp(0.0, 1.0),
            impact_assessment: response.impact_assessment,
        })
    }

    fn fallback(&self, bundle: &ContextBundle, request: &OperationRequest) -> RawProposal {
        let mut mutations = Vec::new();
        let mut reasoning_steps = vec!["Reasoning unavailable, using rule-based fallback analysis".to_string()];

        for &task_id in &request.task_ids {
            let Some(task) = bundle.task(task_id) else {
                reasoning_steps.push(format!("Task {task_id} missing from gathered context, skipping"));
                continue;
            };

            let share = (task.estimated_minutes / 3).max(MIN_SUBTASK_MINUTES);
            let project = task.project_id.map(ProjectRef::Id);

            let subtasks = vec![
                TaskDraft {
                    title: format!("Plan: {}", task.title),
                    description: Some(format!("Plan the approach for '{}'", task.title)),
                    estimated_minutes: share,
                    priority: task.priority,
                    energy_level: EnergyLevel::Low,
                    context: Some("when you need to get started".to_string()),
                    project,
                    ..TaskDraft::titled("")
                },
                TaskDraft {
                    title: format!("Execute: {}", task.title),
                    description: Some(format!("Perform the main work for '{}'", task.title)),
                    estimated_minutes: share,
                    priority: task.priority,
                    energy_level: task.energy_level,
                    context: Some(
                        task.context
                            .clone()
                            .unwrap_or_else(|| "when you have focus".to_string()),
                    ),
                    project,
                    ..TaskDraft::titled("")
                },
                TaskDraft {
                    title: format!("Review: {}", task.title),
                    description: Some(format!("Complete and review '{}'", task.title)),
                    estimated_minutes: share,
                    priority: task.priority,
                    energy_level: EnergyLevel::Medium,
                    context: Some("anytime".to_string()),
                    project,
                    ..TaskDraft::titled("")
                },
            ];

            mutations.push(ProposedMutation::CreateTasks {
                tasks: subtasks,
                rationale: format!("Fallback split of '{}' into plan-execute-review pattern", task.title),
            });
            mutations.push(ProposedMutation::DeleteTask {
                task_id,
                rationale: "Original task replaced by structured subtasks".to_string(),
            });

            reasoning_steps.push(format!("Split '{}' using plan-execute-review pattern", task.title));
        }

        RawProposal {
            mutations,
            reasoning_steps,
            confidence_score: FALLBACK_CONFIDENCE,
            impact_assessment: "Basic task splitting applied".to_string(),
        }
    }
}
