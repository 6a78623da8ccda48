//! Proposal-to-preview assembly
//!
//! Pure: no I/O, no clock, no randomness. Everything the preview carries
//! comes from the gathered bundle and the (possibly fallback) proposal.

use crate::context::ContextBundle;
use crate::ops::{OperationKind, RawProposal};

use super::Preview;

/// Impact text used when the proposal did not supply one
const DEFAULT_IMPACT: &str = "Moderate impact expected";

/// Assemble the caller-facing preview for a proposal
///
/// Reasoning steps concatenate into the narrative in order; confidence is
/// clamped into [0, 1]; the bundle's snapshots are echoed so execution can
/// later resolve inherit references without re-reading entities.
pub fn build_preview(operation: OperationKind, bundle: &ContextBundle, proposal: RawProposal) -> Preview {
    let impact = if proposal.impact_assessment.trim().is_empty() {
        DEFAULT_IMPACT.to_string()
    } else {
        proposal.impact_assessment
    };

    Preview {
        operation,
        original_data: bundle.clone(),
        proposed_changes: proposal.mutations,
        reasoning: proposal.reasoning_steps.join("\n"),
        confidence_score: proposal.confidence_score.clamp(0.0, 1.0),
        estimated_impact: impact,
    }
}
