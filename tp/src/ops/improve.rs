//! Description improvement strategy
//!
//! Rewrites task descriptions to be clearer and more actionable. The
//! proposal is one `UpdateTask` per target; the fallback applies a
//! rule-based structure pass instead of model output.

use entitystore::{TaskId, TaskUpdate};
use serde::Deserialize;

use super::{OperationKind, OperationRequest, OperationStrategy, ProposalParseError, RawProposal, task_summary};
use crate::agent::AgentError;
use crate::context::ContextBundle;
use crate::preview::ProposedMutation;

/// Fallback confidence for the rule-based rewrite
const FALLBACK_CONFIDENCE: f64 = 0.6;

/// Descriptions shorter than this are considered empty for fallback
/// purposes
const MIN_DESCRIPTION_LEN: usize = 10;

/// Words whose presence suggests a description already has structure
const STRUCTURE_KEYWORDS: [&str; 4] = ["step", "goal", "complete", "result"];

/// Model output schema for one task's improvement
#[derive(Debug, Clone, Deserialize)]
struct TaskImprovement {
    task_id: TaskId,
    #[serde(default)]
    improved_description: String,
    #[serde(default)]
    improvement_rationale: String,
}

/// Full model output schema for an improvement proposal
#[derive(Debug, Clone, Deserialize)]
struct ImproveResponse {
    #[serde(default = "default_reasoning_steps")]
    reasoning_steps: Vec<String>,
    #[serde(default)]
    task_improvements: Vec<TaskImprovement>,
    #[serde(default = "default_confidence")]
    confidence_score: f64,
    #[serde(default)]
    impact_assessment: String,
}

fn default_reasoning_steps() -> Vec<String> {
    vec!["Model analysis completed".to_string()]
}

fn default_confidence() -> f64 {
    0.75
}

/// Strategy for [`OperationKind::ImproveDescription`]
pub struct ImproveDescriptionStrategy;

impl OperationStrategy for ImproveDescriptionStrategy {
    fn kind(&self) -> OperationKind {
        OperationKind::ImproveDescription
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
            r#"You are an expert productivity consultant specializing in creating clear, actionable task descriptions.

{context_text}
Your task is to analyze the given task(s) and improve their descriptions to make them more actionable, detailed, and easier to execute.

Provide your analysis in this exact JSON format:
{{
  "reasoning_steps": [
    "Step-by-step analysis of current description quality",
    "Identify what's missing or unclear"
  ],
  "task_improvements": [
    {{
      "task_id": {first_id},
      "improved_description": "Enhanced, actionable description with specific steps and success criteria",
      "improvement_rationale": "Why this improved description is better"
    }}
  ],
  "confidence_score": 0.85,
  "impact_assessment": "This improved description will help by...",
  "recommendations": [
    "Additional suggestions for task management or execution"
  ]
}}

Key principles for description improvement:
1. Add specific action steps when missing
2. Include success criteria or completion indicators
3. Clarify any ambiguous terms or requirements
4. Add relevant context or prerequisites
5. Maintain the original scope while adding clarity
"#
        )
    }

    fn simple_prompt(&self, bundle: &ContextBundle, request: &OperationRequest) -> String {
        let summaries: Vec<String> = request
            .task_ids
            .iter()
            .filter_map(|&id| bundle.task(id))
            .map(|t| {
                format!(
                    "Task {}: {} - current description: {}",
                    t.id,
                    t.title,
                    t.description.as_deref().unwrap_or("none")
                )
            })
            .collect();

        let first_id = request.task_ids.first().copied().unwrap_or_default();

        format!(
            r#"Rewrite each task description to be clear and actionable. Return JSON only:

{}

{{
  "task_improvements": [{{
    "task_id": {first_id},
    "improved_description": "Better description",
    "improvement_rationale": "Why"
  }}],
  "confidence_score": 0.8,
  "reasoning_steps": ["Quick reasoning"]
}}"#,
            summaries.join("\n"),
        )
    }

    fn parse(&self, json: &str) -> Result<RawProposal, ProposalParseError> {
        let response: ImproveResponse = serde_json::from_str(json)?;
        if response.task_improvements.is_empty() {
            return Err(ProposalParseError::Empty);
        }

        let mutations = response
            .task_improvements
            .into_iter()
            .map(|improvement| ProposedMutation::UpdateTask {
                task_id: improvement.task_id,
                updates: TaskUpdate::description(improvement.improved_description),
                rationale: improvement.improvement_rationale,
            })
            .collect();

        Ok(RawProposal {
            mutations,
            reasoning_steps: response.reasoning_steps,
            confidence_score: response.confidence_score.clamp(0.0, 1.0),
            impact_assessment: response.impact_assessment,
        })
    }

    fn fallback(&self, bundle: &ContextBundle, request: &OperationRequest) -> RawProposal {
        let mut mutations = Vec::new();
        let mut reasoning_steps = vec!["Fallback analysis: enhanced descriptions with basic improvements".to_string()];

        for &task_id in &request.task_ids {
            let Some(task) = bundle.task(task_id) else {
                reasoning_steps.push(format!("Task {task_id} missing from gathered context, skipping"));
                continue;
            };

            let current = task.description.as_deref().unwrap_or("");
            let title_lower = task.title.to_lowercase();

            let improved = if current.trim().len() < MIN_DESCRIPTION_LEN {
                format!(
                    "Complete {title_lower}. Steps: 1) Review requirements 2) Execute the task 3) Verify completion."
                )
            } else if STRUCTURE_KEYWORDS.iter().any(|k| current.to_lowercase().contains(k)) {
                current.to_string()
            } else {
                format!(
                    "{current}\n\nGoal: Successfully complete {title_lower}.\nSuccess criteria: Task is finished and meets requirements."
                )
            };

            mutations.push(ProposedMutation::UpdateTask {
                task_id,
                updates: TaskUpdate::description(improved),
                rationale: "Basic description enhancement with clearer structure".to_string(),
            });
        }

        RawProposal {
            mutations,
            reasoning_steps,
            confidence_score: FALLBACK_CONFIDENCE,
            impact_assessment: "Basic description improvements to add clarity and structure".to_string(),
        }
    }
}
