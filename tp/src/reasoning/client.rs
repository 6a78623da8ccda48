//! Reasoning client and degradation policy
//!
//! [`ReasoningClient`] is the only component that talks to the generation
//! service, and it never raises for reasoning-quality problems: whatever
//! happens, the caller gets a usable proposal. The policy, in order:
//!
//! - parse failure: log the raw output, use the strategy's fallback
//! - read-timeout: retry exactly once with the simplified prompt and a
//!   shorter timeout, then fall back
//! - connection failure: fall back immediately, no retry
//! - anything else: fall back

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::error::GenerationError;
use super::sanitize;
use crate::config::ReasoningConfig;
use crate::context::ContextBundle;
use crate::ops::{OperationRequest, OperationStrategy, ProposalParseError, RawProposal};

/// Sampling settings for the simplified-prompt retry
const RETRY_TEMPERATURE: f64 = 0.1;
const RETRY_TOP_P: f64 = 0.8;

/// How much raw output to keep in the log when parsing fails
const RAW_LOG_LIMIT: usize = 500;

/// One generation call's knobs
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub timeout: Duration,
    pub temperature: f64,
    pub top_p: f64,
}

/// A generation backend: prompt in, raw text out
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Run one generation request
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, GenerationError>;
}

/// Drives generation for an operation strategy with the degradation policy
pub struct ReasoningClient {
    generation: Arc<dyn GenerationClient>,
    config: ReasoningConfig,
}

impl ReasoningClient {
    /// Create a client over a generation backend
    pub fn new(generation: Arc<dyn GenerationClient>, config: ReasoningConfig) -> Self {
        Self { generation, config }
    }

    /// Produce a proposal for the request
    ///
    /// Always returns a structurally valid proposal; degradation is noted
    /// inside the proposal's own rationale text, not signalled as an
    /// error.
    pub async fn propose(
        &self,
        strategy: &dyn OperationStrategy,
        bundle: &ContextBundle,
        request: &OperationRequest,
    ) -> RawProposal {
        let options = GenerateOptions {
            timeout: Duration::from_secs(self.config.timeout_secs),
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };

        let prompt = strategy.full_prompt(bundle, request);
        debug!(operation = %strategy.kind(), prompt_len = prompt.len(), "propose: primary attempt");

        match self.generation.generate(&prompt, &options).await {
            Ok(raw) => match Self::parse(strategy, &raw) {
                Ok(proposal) => {
                    info!(
                        operation = %strategy.kind(),
                        mutations = proposal.mutations.len(),
                        confidence = proposal.confidence_score,
                        "propose: reasoning succeeded"
                    );
                    proposal
                }
                Err(e) => {
                    warn!(
                        operation = %strategy.kind(),
                        error = %e,
                        raw = %truncate(&raw, RAW_LOG_LIMIT),
                        "propose: unparseable output, using fallback"
                    );
                    strategy.fallback(bundle, request)
                }
            },
            Err(e) if e.is_timeout() => self.retry_simplified(strategy, bundle, request).await,
            Err(e) if e.is_connect() => {
                warn!(operation = %strategy.kind(), "propose: service unreachable, using fallback");
                strategy.fallback(bundle, request)
            }
            Err(e) => {
                warn!(operation = %strategy.kind(), error = %e, "propose: generation failed, using fallback");
                strategy.fallback(bundle, request)
            }
        }
    }

    /// The single retry after a read-timeout: shorter prompt, shorter
    /// timeout, tighter sampling
    async fn retry_simplified(
        &self,
        strategy: &dyn OperationStrategy,
        bundle: &ContextBundle,
        request: &OperationRequest,
    ) -> RawProposal {
        let options = GenerateOptions {
            timeout: Duration::from_secs(self.config.retry_timeout_secs),
            temperature: RETRY_TEMPERATURE,
            top_p: RETRY_TOP_P,
        };

        let prompt = strategy.simple_prompt(bundle, request);
        warn!(
            operation = %strategy.kind(),
            retry_timeout_secs = self.config.retry_timeout_secs,
            "propose: timed out, retrying with simplified prompt"
        );

        match self.generation.generate(&prompt, &options).await {
            Ok(raw) => match Self::parse(strategy, &raw) {
                Ok(proposal) => {
                    info!(operation = %strategy.kind(), "propose: retry succeeded");
                    proposal
                }
                Err(e) => {
                    warn!(
                        operation = %strategy.kind(),
                        error = %e,
                        raw = %truncate(&raw, RAW_LOG_LIMIT),
                        "propose: retry output unparseable, using fallback"
                    );
                    strategy.fallback(bundle, request)
                }
            },
            Err(e) => {
                warn!(operation = %strategy.kind(), error = %e, "propose: retry failed, using fallback");
                strategy.fallback(bundle, request)
            }
        }
    }

    fn parse(strategy: &dyn OperationStrategy, raw: &str) -> Result<RawProposal, ProposalParseError> {
        let json = sanitize::extract_json(raw).ok_or(ProposalParseError::NoJson)?;
        strategy.parse(json)
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::ops::{self, OperationKind};
    use entitystore::{SeedData, TaskStore};

    /// Generation backend that replays a script and records prompts
    struct ScriptedGeneration {
        script: Mutex<Vec<Result<String, GenerationError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGeneration {
        fn new(script: Vec<Result<String, GenerationError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedGeneration {
        async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Err(GenerationError::Connect);
            }
            script.remove(0)
        }
    }

    fn bundle() -> ContextBundle {
        let seed: SeedData = serde_json::from_str(
            r#"{
                "projects": [{"id": 1, "title": "Auth work"}],
                "tasks": [{"id": 42, "project_id": 1, "title": "Implement auth", "estimated_minutes": 240}]
            }"#,
        )
        .unwrap();
        let store = TaskStore::from_seed(seed);
        let mut bundle = ContextBundle::new();
        let task = store.get_task(42).unwrap();
        let project = store.get_project(1).unwrap();
        let siblings = store.tasks_for_project(1);
        bundle.insert_task(task);
        bundle.insert_project(project, siblings);
        bundle
    }

    fn split_response() -> String {
        r#"{
            "reasoning_steps": ["looked at the task"],
            "task_splits": [{
                "original_task_id": 42,
                "subtasks": [
                    {"title": "Schema", "estimated_minutes": 60, "project_id": "INHERIT_FROM_ORIGINAL_TASK"},
                    {"title": "Endpoints", "estimated_minutes": 90},
                    {"title": "Tests", "estimated_minutes": 90}
                ],
                "split_rationale": "three natural phases"
            }],
            "confidence_score": 0.85,
            "impact_assessment": "More manageable work"
        }"#
        .to_string()
    }

    fn client(generation: Arc<dyn GenerationClient>) -> ReasoningClient {
        ReasoningClient::new(generation, ReasoningConfig::default())
    }

    fn strategy() -> &'static dyn OperationStrategy {
        ops::strategy_for(OperationKind::SplitTask).unwrap()
    }

    #[tokio::test]
    async fn test_successful_generation_is_parsed() {
        let generation = ScriptedGeneration::new(vec![Ok(split_response())]);
        let request = OperationRequest::split_tasks(vec![42]);

        let proposal = client(generation.clone()).propose(strategy(), &bundle(), &request).await;

        assert_eq!(proposal.confidence_score, 0.85);
        assert_eq!(proposal.mutations.len(), 2);
        assert_eq!(generation.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_garbage_output_falls_back() {
        let generation = ScriptedGeneration::new(vec![Ok("I would rather not.".to_string())]);
        let request = OperationRequest::split_tasks(vec![42]);

        let proposal = client(generation.clone()).propose(strategy(), &bundle(), &request).await;

        assert_eq!(proposal.confidence_score, 0.6);
        // Plan/Execute/Review split plus delete of the original
        assert_eq!(proposal.mutations.len(), 2);
        assert_eq!(generation.prompts().len(), 1, "parse failure must not retry");
    }

    #[tokio::test]
    async fn test_timeout_retries_once_with_simplified_prompt() {
        let generation = ScriptedGeneration::new(vec![
            Err(GenerationError::Timeout(Duration::from_secs(600))),
            Ok(split_response()),
        ]);
        let request = OperationRequest::split_tasks(vec![42]);

        let proposal = client(generation.clone()).propose(strategy(), &bundle(), &request).await;

        assert_eq!(proposal.confidence_score, 0.85);
        let prompts = generation.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(
            prompts[1].len() < prompts[0].len(),
            "retry prompt should be the stripped-down one"
        );
    }

    #[tokio::test]
    async fn test_double_timeout_falls_back() {
        let generation = ScriptedGeneration::new(vec![
            Err(GenerationError::Timeout(Duration::from_secs(600))),
            Err(GenerationError::Timeout(Duration::from_secs(60))),
        ]);
        let request = OperationRequest::split_tasks(vec![42]);

        let proposal = client(generation.clone()).propose(strategy(), &bundle(), &request).await;

        assert_eq!(proposal.confidence_score, 0.6);
        assert_eq!(generation.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_connection_failure_skips_retry() {
        let generation = ScriptedGeneration::new(vec![Err(GenerationError::Connect)]);
        let request = OperationRequest::split_tasks(vec![42]);

        let proposal = client(generation.clone()).propose(strategy(), &bundle(), &request).await;

        assert_eq!(proposal.confidence_score, 0.6);
        assert_eq!(generation.prompts().len(), 1, "connect failure must not retry");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("short", 100), "short");
    }
}
