//! Refinement Events
//!
//! Progress notifications emitted during a run. Events are sent over an
//! unbounded channel so the send never suspends the loop; a closed or
//! missing receiver is ignored. Notifications must not affect control
//! flow — they exist for the frontend's progress display and telemetry.

use serde::{Deserialize, Serialize};

use crate::models::{ContinuationStrategy, RunMode};

/// Events emitted during a refinement run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RefinementEvent {
    /// Run started
    Started { mode: RunMode, max_iterations: u32 },

    /// Pre-analysis of the references completed (edit runs only)
    AnalysisCompleted { subject_count: usize },

    /// New iteration started
    IterationStarted { iteration: u32 },

    /// Generator produced an artifact
    ArtifactProduced { iteration: u32, artifact_id: String },

    /// Verifier judged the artifact
    VerificationCompleted {
        iteration: u32,
        satisfied: bool,
        issue_count: usize,
    },

    /// Next iteration's prompt was planned
    PromptPlanned {
        iteration: u32,
        strategy: ContinuationStrategy,
    },

    /// Run completed (success or budget exhausted)
    Completed { success: bool, total_iterations: u32 },
}
