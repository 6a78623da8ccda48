//! TaskPilot - AI-assisted change orchestrator
//!
//! TaskPilot turns an ambiguous, slow, failure-prone reasoning call into a
//! safe two-phase operation against the task/project store: propose first,
//! then approve-and-execute. A preview is produced for every request - the
//! reasoning service degrades to a deterministic rule-based proposal, never
//! to an error - and each stored preview executes at most once.
//!
//! # Core Concepts
//!
//! - **Propose, then execute**: every change is previewed before it is
//!   applied; the caller holds only an opaque handle
//! - **Single-use handles**: executing or cancelling a preview consumes its
//!   handle atomically, so racing callers cannot double-apply
//! - **Degrade, don't fail**: reasoning timeouts, unreachable services, and
//!   unparseable output all fall back to deterministic proposals
//! - **Best-effort execution**: mutations apply in order with per-item
//!   outcomes and no rollback
//!
//! # Modules
//!
//! - [`agent`] - the caller-facing orchestrator
//! - [`context`] - entity snapshot gathering
//! - [`reasoning`] - generation client, sanitization, degradation policy
//! - [`ops`] - operation kinds and their strategies
//! - [`preview`] - preview artifacts, handles, and the preview store
//! - [`exec`] - the execution engine
//! - [`gateway`] - uniform local/remote entity access
//! - [`config`] - configuration types and loading

pub mod agent;
pub mod cli;
pub mod config;
pub mod context;
pub mod exec;
pub mod gateway;
pub mod ops;
pub mod preview;
pub mod reasoning;

// Re-export commonly used types
pub use agent::{AgentError, AgentStatus, ChangeAgent};
pub use config::{Config, GatewayConfig, PreviewConfig, ReasoningConfig};
pub use context::{ContextBundle, ContextEntry, ContextGatherer, GatherError};
pub use exec::{ExecutionEngine, ExecutionResult, MutationOutcome};
pub use gateway::{EntityGateway, GatewayError, HttpGateway, LocalGateway, TieredGateway};
pub use ops::{OperationInfo, OperationKind, OperationRequest, RawProposal};
pub use preview::{InMemoryPreviewStore, Preview, PreviewId, PreviewStore, ProposedMutation};
pub use reasoning::{GenerateOptions, GenerationClient, GenerationError, OllamaClient, ReasoningClient};
