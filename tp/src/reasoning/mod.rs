//! Reasoning service integration
//!
//! The reasoning call is the slow, unreliable long-pole of every
//! operation. This module wraps it so the rest of the core never sees a
//! reasoning failure: the [`ReasoningClient`] classifies errors, retries a
//! read-timeout once with a simplified prompt, and otherwise degrades to
//! the operation strategy's deterministic fallback.

mod client;
mod error;
mod ollama;
pub(crate) mod sanitize;

pub use client::{GenerateOptions, GenerationClient, ReasoningClient};
pub use error::GenerationError;
pub use ollama::OllamaClient;
