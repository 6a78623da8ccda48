//! Execution engine
//!
//! Applies an approved preview's mutations through the entity gateway,
//! best-effort: mutations run sequentially in list order, each outcome is
//! recorded whether or not earlier ones succeeded, and nothing is rolled
//! back. A failed mutation therefore leaves earlier mutations applied;
//! the per-item outcomes are the caller's record of what actually
//! happened.

use std::sync::Arc;

use entitystore::{ProjectRef, TaskDraft};
use serde::Serialize;
use tracing::{info, warn};

use crate::gateway::EntityGateway;
use crate::ops::OperationKind;
use crate::preview::Preview;

/// Outcome of a single mutation
#[derive(Debug, Clone, Serialize)]
pub struct MutationOutcome {
    /// Past-tense action name (`created_tasks`, `deleted_task`, ...)
    pub action: String,
    pub succeeded: bool,
    pub detail: String,
}

/// Result of executing one approved preview
///
/// `success` reflects structural preconditions only; individual mutation
/// failures live in `outcomes`. Not persisted beyond the call that
/// produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub operation: OperationKind,
    pub outcomes: Vec<MutationOutcome>,
    pub error_message: Option<String>,
}

/// A preview that has been atomically removed from the store
///
/// Minting one is the approval event: only the orchestrator creates these,
/// and only after winning the store's remove race, so each preview
/// executes at most once.
#[derive(Debug)]
pub struct ApprovedPreview {
    preview: Preview,
}

impl ApprovedPreview {
    pub(crate) fn new(preview: Preview) -> Self {
        Self { preview }
    }
}

/// Applies approved previews via the entity gateway
pub struct ExecutionEngine {
    gateway: Arc<dyn EntityGateway>,
}

impl ExecutionEngine {
    /// Create an engine over the given gateway
    pub fn new(gateway: Arc<dyn EntityGateway>) -> Self {
        Self { gateway }
    }

    /// Apply an approved preview's mutations, in order
    ///
    /// Always returns a result object; downstream mutation failures are
    /// reported per-item, never raised.
    pub async fn execute(&self, approved: ApprovedPreview) -> ExecutionResult {
        let preview = approved.preview;

        if !preview.operation.is_implemented() {
            warn!(operation = %preview.operation, "execute: no executable strategy for operation");
            return ExecutionResult {
                success: false,
                operation: preview.operation,
                outcomes: Vec::new(),
                error_message: Some(format!(
                    "operation '{}' has no executable strategy",
                    preview.operation
                )),
            };
        }

        // Inherit references resolve against the first task snapshot
        // reasoned about; see ContextBundle::first_task_project_id for the
        // multi-project caveat.
        let inherited_project = preview.original_data.first_task_project_id();

        info!(
            operation = %preview.operation,
            mutations = preview.proposed_changes.len(),
            "Executing approved preview"
        );

        let mut outcomes = Vec::with_capacity(preview.proposed_changes.len());

        for mutation in &preview.proposed_changes {
            use crate::preview::ProposedMutation::*;
            let outcome = match mutation {
                CreateTasks { tasks, .. } => self.apply_create(tasks, inherited_project).await,
                DeleteTask { task_id, .. } => match self.gateway.delete_task(*task_id).await {
                    Ok(()) => MutationOutcome {
                        action: "deleted_task".to_string(),
                        succeeded: true,
                        detail: format!("Task {task_id} deleted"),
                    },
                    Err(e) => MutationOutcome {
                        action: "deleted_task".to_string(),
                        succeeded: false,
                        detail: e.to_string(),
                    },
                },
                UpdateTask { task_id, updates, .. } => match self.gateway.update_task(*task_id, updates).await {
                    Ok(updated) => MutationOutcome {
                        action: "updated_task".to_string(),
                        succeeded: true,
                        detail: format!("Task {} updated", updated.id),
                    },
                    Err(e) => MutationOutcome {
                        action: "updated_task".to_string(),
                        succeeded: false,
                        detail: e.to_string(),
                    },
                },
            };

            if !outcome.succeeded {
                warn!(action = %outcome.action, detail = %outcome.detail, "Mutation failed, continuing");
            }
            outcomes.push(outcome);
        }

        ExecutionResult {
            success: true,
            operation: preview.operation,
            outcomes,
            error_message: None,
        }
    }

    async fn apply_create(
        &self,
        tasks: &[TaskDraft],
        inherited_project: Option<entitystore::ProjectId>,
    ) -> MutationOutcome {
        let mut unresolved = 0usize;
        let resolved: Vec<TaskDraft> = tasks
            .iter()
            .map(|draft| {
                let mut draft = draft.clone();
                match draft.project {
                    Some(ProjectRef::Id(_)) => {}
                    Some(ProjectRef::Inherit) | None => match inherited_project {
                        Some(id) => draft.project = Some(ProjectRef::Id(id)),
                        None => {
                            draft.project = None;
                            unresolved += 1;
                        }
                    },
                }
                draft
            })
            .collect();

        match self.gateway.create_tasks(&resolved).await {
            Ok(created) => {
                let ids: Vec<String> = created.iter().map(|t| t.id.to_string()).collect();
                let mut detail = format!("Created {} tasks (ids: {})", created.len(), ids.join(", "));
                if unresolved > 0 {
                    detail.push_str(&format!(
                        "; warning: no original project id found for {unresolved} drafts"
                    ));
                }
                MutationOutcome {
                    action: "created_tasks".to_string(),
                    succeeded: true,
                    detail,
                }
            }
            Err(e) => MutationOutcome {
                action: "created_tasks".to_string(),
                succeeded: false,
                detail: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use entitystore::{ProjectId, ProjectSnapshot, TaskId, TaskSnapshot, TaskUpdate};

    use crate::context::ContextBundle;
    use crate::gateway::GatewayError;
    use crate::preview::ProposedMutation;

    /// Gateway that records every call and answers from a script
    struct RecordingGateway {
        calls: Mutex<Vec<String>>,
        fail_deletes: bool,
    }

    impl RecordingGateway {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_deletes: false,
            })
        }

        fn failing_deletes() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_deletes: true,
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn snapshot(id: TaskId, project_id: Option<ProjectId>) -> TaskSnapshot {
            TaskSnapshot {
                id,
                project_id,
                title: format!("task {id}"),
                description: None,
                status: Default::default(),
                priority: Default::default(),
                estimated_minutes: 15,
                actual_minutes: 0,
                is_suggestion: false,
                energy_level: Default::default(),
                context: None,
                is_completed: false,
                created_at: None,
                updated_at: None,
                completed_at: None,
            }
        }
    }

    #[async_trait]
    impl EntityGateway for RecordingGateway {
        async fn get_task(&self, id: TaskId) -> Result<TaskSnapshot, GatewayError> {
            Ok(Self::snapshot(id, Some(1)))
        }
        async fn get_project(&self, _id: ProjectId) -> Result<ProjectSnapshot, GatewayError> {
            unimplemented!("not used in these tests")
        }
        async fn list_project_tasks(&self, _id: ProjectId) -> Result<Vec<TaskSnapshot>, GatewayError> {
            Ok(vec![])
        }
        async fn create_tasks(&self, drafts: &[TaskDraft]) -> Result<Vec<TaskSnapshot>, GatewayError> {
            let projects: Vec<String> = drafts
                .iter()
                .map(|d| match d.project {
                    Some(ProjectRef::Id(id)) => id.to_string(),
                    Some(ProjectRef::Inherit) => "inherit".to_string(),
                    None => "none".to_string(),
                })
                .collect();
            self.record(format!("create[{}]", projects.join(",")));
            Ok(drafts
                .iter()
                .enumerate()
                .map(|(i, _)| Self::snapshot(100 + i as TaskId, None))
                .collect())
        }
        async fn update_task(&self, id: TaskId, _update: &TaskUpdate) -> Result<TaskSnapshot, GatewayError> {
            self.record(format!("update[{id}]"));
            Ok(Self::snapshot(id, None))
        }
        async fn delete_task(&self, id: TaskId) -> Result<(), GatewayError> {
            self.record(format!("delete[{id}]"));
            if self.fail_deletes {
                return Err(GatewayError::TaskNotFound(id));
            }
            Ok(())
        }
    }

    fn bundle_with_task(id: TaskId, project_id: Option<ProjectId>) -> ContextBundle {
        let mut bundle = ContextBundle::new();
        bundle.insert_task(RecordingGateway::snapshot(id, project_id));
        bundle
    }

    fn split_preview(bundle: ContextBundle) -> Preview {
        let mut draft = TaskDraft::titled("Subtask");
        draft.project = Some(ProjectRef::Inherit);
        Preview {
            operation: OperationKind::SplitTask,
            original_data: bundle,
            proposed_changes: vec![
                ProposedMutation::CreateTasks {
                    tasks: vec![draft.clone(), draft],
                    rationale: "split".to_string(),
                },
                ProposedMutation::DeleteTask {
                    task_id: 42,
                    rationale: "replaced".to_string(),
                },
            ],
            reasoning: "because".to_string(),
            confidence_score: 0.85,
            estimated_impact: "smaller tasks".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mutations_apply_in_list_order() {
        let gateway = RecordingGateway::new();
        let engine = ExecutionEngine::new(gateway.clone());

        let result = engine
            .execute(ApprovedPreview::new(split_preview(bundle_with_task(42, Some(7)))))
            .await;

        assert!(result.success);
        assert!(result.error_message.is_none());
        assert_eq!(result.outcomes.len(), 2);
        assert!(result.outcomes.iter().all(|o| o.succeeded));
        // Creates happen before the delete, and inherit resolved to project 7
        assert_eq!(gateway.calls(), vec!["create[7,7]", "delete[42]"]);
    }

    #[tokio::test]
    async fn test_unresolvable_inherit_warns_and_proceeds() {
        let gateway = RecordingGateway::new();
        let engine = ExecutionEngine::new(gateway.clone());

        let result = engine
            .execute(ApprovedPreview::new(split_preview(bundle_with_task(42, None))))
            .await;

        assert!(result.success);
        assert!(result.outcomes[0].succeeded);
        assert!(result.outcomes[0].detail.contains("warning"));
        assert_eq!(gateway.calls()[0], "create[none,none]");
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported_not_raised() {
        let gateway = RecordingGateway::failing_deletes();
        let engine = ExecutionEngine::new(gateway.clone());

        let result = engine
            .execute(ApprovedPreview::new(split_preview(bundle_with_task(42, Some(7)))))
            .await;

        // Best-effort: overall success with a failed delete inside
        assert!(result.success);
        assert_eq!(result.outcomes.len(), 2);
        assert!(result.outcomes[0].succeeded);
        assert!(!result.outcomes[1].succeeded);
        // The delete was still attempted after the create
        assert_eq!(gateway.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_update_mutations_flow_through() {
        let gateway = RecordingGateway::new();
        let engine = ExecutionEngine::new(gateway.clone());

        let preview = Preview {
            operation: OperationKind::ImproveDescription,
            original_data: bundle_with_task(5, None),
            proposed_changes: vec![ProposedMutation::UpdateTask {
                task_id: 5,
                updates: TaskUpdate::description("clearer"),
                rationale: "clarity".to_string(),
            }],
            reasoning: String::new(),
            confidence_score: 0.9,
            estimated_impact: String::new(),
        };

        let result = engine.execute(ApprovedPreview::new(preview)).await;
        assert!(result.success);
        assert_eq!(result.outcomes[0].action, "updated_task");
        assert_eq!(gateway.calls(), vec!["update[5]"]);
    }

    #[tokio::test]
    async fn test_unimplemented_operation_fails_structurally() {
        let gateway = RecordingGateway::new();
        let engine = ExecutionEngine::new(gateway.clone());

        let preview = Preview {
            operation: OperationKind::MergeTasks,
            original_data: ContextBundle::new(),
            proposed_changes: vec![],
            reasoning: String::new(),
            confidence_score: 0.0,
            estimated_impact: String::new(),
        };

        let result = engine.execute(ApprovedPreview::new(preview)).await;
        assert!(!result.success);
        assert!(result.error_message.is_some());
        assert!(gateway.calls().is_empty());
    }
}
