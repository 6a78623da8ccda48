//! Change orchestrator
//!
//! [`ChangeAgent`] is the caller-facing surface of the core: it turns an
//! operation request into a stored, inspectable preview, and later turns
//! an approved handle into exactly one execution. The flow per request is
//! strictly sequential - gather, reason, build, store - and many requests
//! may be in flight concurrently; the preview store is the only shared
//! mutable state between them.

mod error;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::context::ContextGatherer;
use crate::exec::{ApprovedPreview, ExecutionEngine, ExecutionResult};
use crate::gateway::EntityGateway;
use crate::ops::{self, OperationInfo, OperationKind, OperationRequest};
use crate::preview::{Preview, PreviewId, PreviewStore, build_preview};
use crate::reasoning::{GenerationClient, ReasoningClient};

pub use error::AgentError;

/// Agent health summary
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    /// Previews currently awaiting approval or cancellation
    pub active_previews: usize,
    /// Declared operation kinds
    pub supported_operations: usize,
    /// Kinds with an executable strategy
    pub implemented_operations: usize,
    /// Reasoning backend identifier
    pub backend: String,
}

/// The AI-assisted change orchestrator
///
/// Stateless per call apart from the injected preview store; safe for
/// unrestricted concurrent use across independent handles.
pub struct ChangeAgent {
    gatherer: ContextGatherer,
    reasoning: ReasoningClient,
    previews: Arc<dyn PreviewStore>,
    engine: ExecutionEngine,
    backend: String,
}

impl ChangeAgent {
    /// Wire up an agent from its collaborators
    pub fn new(
        gateway: Arc<dyn EntityGateway>,
        generation: Arc<dyn GenerationClient>,
        previews: Arc<dyn PreviewStore>,
        config: &Config,
    ) -> Self {
        Self {
            gatherer: ContextGatherer::new(gateway.clone()),
            reasoning: ReasoningClient::new(generation, config.reasoning.clone()),
            previews,
            engine: ExecutionEngine::new(gateway),
            backend: format!("ollama/{}", config.reasoning.model),
        }
    }

    /// Create and store a preview for the request
    ///
    /// Validation happens before any I/O; reasoning degradation is not an
    /// error and shows up only in the preview's rationale and confidence.
    pub async fn create_preview(&self, request: OperationRequest) -> Result<(PreviewId, Preview), AgentError> {
        let strategy = ops::strategy_for(request.operation).ok_or_else(|| AgentError::unsupported(request.operation))?;
        strategy.validate(&request)?;

        info!(
            operation = %request.operation,
            task_count = request.task_ids.len(),
            "Creating change preview"
        );

        let bundle = self.gatherer.gather(&request).await?;

        let mut proposal = self.reasoning.propose(strategy, &bundle, &request).await;

        // Narrative mirrors the work actually done, gather included
        let mut reasoning_steps = vec![
            format!("Starting {} operation. Gathering required data...", request.operation),
            format!(
                "Gathered data for {} tasks and their project contexts",
                request.task_ids.len()
            ),
        ];
        reasoning_steps.append(&mut proposal.reasoning_steps);
        proposal.reasoning_steps = reasoning_steps;

        let preview = build_preview(request.operation, &bundle, proposal);
        let id = self.previews.store(preview.clone()).await;

        info!(
            preview_id = %id,
            mutations = preview.proposed_changes.len(),
            confidence = preview.confidence_score,
            "Preview stored"
        );
        Ok((id, preview))
    }

    /// Inspect a pending preview without consuming it
    pub async fn get_preview(&self, id: &PreviewId) -> Result<Preview, AgentError> {
        self.previews.get(id).await.ok_or(AgentError::PreviewNotFound(*id))
    }

    /// Approve and execute a pending preview
    ///
    /// The atomic remove is the approval event: of two racing callers
    /// (execute/execute or cancel/execute) exactly one wins and the other
    /// sees not-found, which means "already handled", not a retryable
    /// failure.
    pub async fn execute_preview(&self, id: &PreviewId) -> Result<ExecutionResult, AgentError> {
        let preview = self.previews.remove(id).await.ok_or(AgentError::PreviewNotFound(*id))?;
        debug!(preview_id = %id, "Preview approved for execution");
        Ok(self.engine.execute(ApprovedPreview::new(preview)).await)
    }

    /// Cancel a pending preview without executing it
    pub async fn cancel_preview(&self, id: &PreviewId) -> Result<(), AgentError> {
        self.previews
            .remove(id)
            .await
            .map(|_| {
                info!(preview_id = %id, "Preview cancelled");
            })
            .ok_or(AgentError::PreviewNotFound(*id))
    }

    /// Describe every declared operation kind
    pub fn operations(&self) -> Vec<OperationInfo> {
        ops::operations()
    }

    /// Current agent health summary
    pub async fn status(&self) -> AgentStatus {
        let implemented = OperationKind::all().into_iter().filter(|k| k.is_implemented()).count();
        AgentStatus {
            active_previews: self.previews.count().await,
            supported_operations: OperationKind::all().len(),
            implemented_operations: implemented,
            backend: self.backend.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use entitystore::{
        ProjectId, ProjectSnapshot, SeedData, TaskDraft, TaskId, TaskSnapshot, TaskStore, TaskUpdate,
    };

    use crate::gateway::{GatewayError, LocalGateway};
    use crate::preview::{InMemoryPreviewStore, ProposedMutation};
    use crate::reasoning::{GenerateOptions, GenerationError};

    /// Generation backend that replays one scripted response
    struct ScriptedGeneration {
        responses: Mutex<Vec<Result<String, GenerationError>>>,
    }

    impl ScriptedGeneration {
        fn always(response: &str) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(vec![Ok(response.to_string())]),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl crate::reasoning::GenerationClient for ScriptedGeneration {
        async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String, GenerationError> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(GenerationError::Connect);
            }
            responses.remove(0)
        }
    }

    /// Gateway that counts calls; used to assert validation happens first
    struct CountingGateway {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EntityGateway for CountingGateway {
        async fn get_task(&self, id: TaskId) -> Result<TaskSnapshot, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::TaskNotFound(id))
        }
        async fn get_project(&self, id: ProjectId) -> Result<ProjectSnapshot, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::ProjectNotFound(id))
        }
        async fn list_project_tasks(&self, _id: ProjectId) -> Result<Vec<TaskSnapshot>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
        async fn create_tasks(&self, _drafts: &[TaskDraft]) -> Result<Vec<TaskSnapshot>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
        async fn update_task(&self, id: TaskId, _update: &TaskUpdate) -> Result<TaskSnapshot, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::TaskNotFound(id))
        }
        async fn delete_task(&self, _id: TaskId) -> Result<(), GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn seeded_gateway() -> Arc<LocalGateway> {
        let seed: SeedData = serde_json::from_str(
            r#"{
                "projects": [{"id": 1, "title": "Security"}],
                "tasks": [{"id": 42, "project_id": 1, "title": "Implement auth", "estimated_minutes": 240}]
            }"#,
        )
        .unwrap();
        Arc::new(LocalGateway::new(Arc::new(TaskStore::from_seed(seed))))
    }

    fn agent_with(generation: Arc<dyn crate::reasoning::GenerationClient>) -> ChangeAgent {
        ChangeAgent::new(
            seeded_gateway(),
            generation,
            Arc::new(InMemoryPreviewStore::new()),
            &Config::default(),
        )
    }

    fn split_response() -> &'static str {
        r#"{
            "reasoning_steps": ["auth has three natural phases"],
            "task_splits": [{
                "original_task_id": 42,
                "subtasks": [
                    {"title": "Schema", "estimated_minutes": 60, "project_id": "INHERIT_FROM_ORIGINAL_TASK"},
                    {"title": "Endpoints", "estimated_minutes": 90, "project_id": "INHERIT_FROM_ORIGINAL_TASK"},
                    {"title": "Tests", "estimated_minutes": 90, "project_id": "INHERIT_FROM_ORIGINAL_TASK"}
                ],
                "split_rationale": "phased delivery"
            }],
            "confidence_score": 0.85,
            "impact_assessment": "More manageable work"
        }"#
    }

    #[tokio::test]
    async fn test_split_preview_and_execution_happy_path() {
        let agent = agent_with(ScriptedGeneration::always(split_response()));

        let (id, preview) = agent
            .create_preview(OperationRequest::split_tasks(vec![42]))
            .await
            .unwrap();

        assert_eq!(preview.operation, OperationKind::SplitTask);
        assert_eq!(preview.confidence_score, 0.85);
        assert_eq!(preview.proposed_changes.len(), 2);
        assert!(matches!(
            &preview.proposed_changes[0],
            ProposedMutation::CreateTasks { tasks, .. } if tasks.len() == 3
        ));
        assert!(matches!(
            &preview.proposed_changes[1],
            ProposedMutation::DeleteTask { task_id: 42, .. }
        ));

        let result = agent.execute_preview(&id).await.unwrap();
        assert!(result.success);
        assert_eq!(result.outcomes.len(), 2);
        assert!(result.outcomes.iter().all(|o| o.succeeded));
    }

    #[tokio::test]
    async fn test_unreachable_reasoning_degrades_deterministically() {
        for _ in 0..3 {
            let agent = agent_with(ScriptedGeneration::unreachable());
            let (_, preview) = agent
                .create_preview(OperationRequest::split_tasks(vec![42]))
                .await
                .unwrap();

            assert_eq!(preview.confidence_score, 0.6);
            let ProposedMutation::CreateTasks { tasks, .. } = &preview.proposed_changes[0] else {
                panic!("fallback must propose creations first");
            };
            assert_eq!(tasks.len(), 3);
            assert!(tasks[0].title.starts_with("Plan:"));
            assert!(tasks[1].title.starts_with("Execute:"));
            assert!(tasks[2].title.starts_with("Review:"));
        }
    }

    #[tokio::test]
    async fn test_validation_rejects_before_any_gateway_call() {
        let gateway = Arc::new(CountingGateway {
            calls: AtomicUsize::new(0),
        });
        let agent = ChangeAgent::new(
            gateway.clone(),
            ScriptedGeneration::unreachable(),
            Arc::new(InMemoryPreviewStore::new()),
            &Config::default(),
        );

        let err = agent
            .create_preview(OperationRequest::split_tasks(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MissingTaskIds { .. }));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);

        let err = agent
            .create_preview(OperationRequest {
                operation: OperationKind::MergeTasks,
                task_ids: vec![1, 2],
                project_ids: vec![],
                context: Default::default(),
                user_preferences: Default::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::UnsupportedOperation { .. }));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_task_aborts_with_gather_error() {
        let agent = agent_with(ScriptedGeneration::unreachable());
        let err = agent
            .create_preview(OperationRequest::split_tasks(vec![999]))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Gather(_)));
    }

    #[tokio::test]
    async fn test_handles_are_single_use() {
        let agent = agent_with(ScriptedGeneration::always(split_response()));
        let (id, _) = agent
            .create_preview(OperationRequest::split_tasks(vec![42]))
            .await
            .unwrap();

        assert!(agent.get_preview(&id).await.is_ok());
        agent.execute_preview(&id).await.unwrap();

        assert!(matches!(
            agent.get_preview(&id).await.unwrap_err(),
            AgentError::PreviewNotFound(_)
        ));
        assert!(matches!(
            agent.execute_preview(&id).await.unwrap_err(),
            AgentError::PreviewNotFound(_)
        ));
        assert!(matches!(
            agent.cancel_preview(&id).await.unwrap_err(),
            AgentError::PreviewNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_cancel_consumes_handle() {
        let agent = agent_with(ScriptedGeneration::always(split_response()));
        let (id, _) = agent
            .create_preview(OperationRequest::split_tasks(vec![42]))
            .await
            .unwrap();

        agent.cancel_preview(&id).await.unwrap();
        assert!(agent.execute_preview(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_improve_description_flow() {
        let response = r#"{
            "reasoning_steps": ["description lacks steps"],
            "task_improvements": [{
                "task_id": 42,
                "improved_description": "Implement auth: 1) schema 2) endpoints 3) tests",
                "improvement_rationale": "adds concrete steps"
            }],
            "confidence_score": 0.9,
            "impact_assessment": "clearer execution"
        }"#;
        let agent = agent_with(ScriptedGeneration::always(response));

        let (id, preview) = agent
            .create_preview(OperationRequest::improve_descriptions(vec![42]))
            .await
            .unwrap();
        assert_eq!(preview.proposed_changes.len(), 1);
        assert_eq!(preview.confidence_score, 0.9);

        let result = agent.execute_preview(&id).await.unwrap();
        assert!(result.success);
        assert_eq!(result.outcomes[0].action, "updated_task");
        assert!(result.outcomes[0].succeeded);
    }

    #[tokio::test]
    async fn test_status_and_operations() {
        let agent = agent_with(ScriptedGeneration::always(split_response()));

        let status = agent.status().await;
        assert_eq!(status.active_previews, 0);
        assert_eq!(status.supported_operations, 6);
        assert_eq!(status.implemented_operations, 2);

        agent
            .create_preview(OperationRequest::split_tasks(vec![42]))
            .await
            .unwrap();
        assert_eq!(agent.status().await.active_previews, 1);

        assert_eq!(agent.operations().len(), 6);
    }
}
