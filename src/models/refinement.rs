//! Refinement Models
//!
//! Data structures for the agentic refinement loop: run configuration,
//! per-iteration trace records, and the terminal run result.

use serde::{Deserialize, Serialize};

use super::analysis::ArtifactAnalysis;
use super::artifact::Artifact;

/// How the next iteration should continue after an unsatisfied verdict.
///
/// Advisory in the current controller: the classification is logged and
/// reported on the verification record, but it does not change which
/// reference artifacts are used (edits always start from the run's
/// original references).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContinuationStrategy {
    /// Restart from the original references with a corrected instruction
    #[default]
    Fresh,
    /// Keep the composition and polish quality attributes
    Progressive,
    /// Re-edit a specific region or element
    Targeted,
}

impl std::fmt::Display for ContinuationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContinuationStrategy::Fresh => write!(f, "fresh"),
            ContinuationStrategy::Progressive => write!(f, "progressive"),
            ContinuationStrategy::Targeted => write!(f, "targeted"),
        }
    }
}

/// Mode of a refinement run, fixed when the run starts.
///
/// A run never transitions between modes: a create run that fails its
/// first iteration does NOT become an edit run on its own output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Produce a new artifact from text alone
    Create,
    /// Edit the caller's reference artifacts
    Edit,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Create => write!(f, "create"),
            RunMode::Edit => write!(f, "edit"),
        }
    }
}

/// Structured verdict from the vision verifier for one iteration.
///
/// Invariant: `satisfied == true` implies `issues` is empty and
/// `suggested_edit` is empty. The constructors and [`normalize`] enforce
/// this at construction time rather than trusting the model's output.
///
/// [`normalize`]: VerificationResult::normalize
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Whether the artifact meets the original intent
    pub satisfied: bool,
    /// Outstanding issues, ordered by the verifier
    #[serde(default)]
    pub issues: Vec<String>,
    /// The verifier's suggested next edit (empty when satisfied)
    #[serde(default)]
    pub suggested_edit: String,
    /// Continuation strategy derived from the issues
    #[serde(default)]
    pub recommended_strategy: ContinuationStrategy,
}

impl VerificationResult {
    /// A satisfied verdict with no outstanding issues.
    pub fn satisfied() -> Self {
        Self {
            satisfied: true,
            issues: Vec::new(),
            suggested_edit: String::new(),
            recommended_strategy: ContinuationStrategy::Fresh,
        }
    }

    /// An unsatisfied verdict carrying issues and a suggested edit.
    pub fn unsatisfied(
        issues: Vec<String>,
        suggested_edit: impl Into<String>,
        recommended_strategy: ContinuationStrategy,
    ) -> Self {
        Self {
            satisfied: false,
            issues,
            suggested_edit: suggested_edit.into(),
            recommended_strategy,
        }
    }

    /// Re-establish the satisfied-implies-empty invariant after decoding
    /// a model-produced verdict.
    pub fn normalize(mut self) -> Self {
        if self.satisfied {
            self.issues.clear();
            self.suggested_edit.clear();
        }
        self
    }
}

/// One completed pass of the refinement loop.
///
/// Appended to the run's ordered trace and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Iteration {
    /// 1-based iteration number
    pub number: u32,
    /// The artifact this iteration produced
    pub artifact: Artifact,
    /// The exact prompt the generator received
    pub prompt_used: String,
    /// The verifier's verdict on the artifact
    pub verification: VerificationResult,
    /// Pre-analysis of the references (first edit iteration only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ArtifactAnalysis>,
    /// When this iteration started (RFC 3339)
    pub started_at: String,
}

/// Terminal output of one refinement run.
///
/// Owned exclusively by the caller after return; the engine keeps no
/// reference to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// The last artifact produced (the satisfying one on success)
    pub final_artifact: Artifact,
    /// Ordered iteration trace
    pub iterations: Vec<Iteration>,
    /// Whether the verifier was satisfied within the budget
    pub success: bool,
    /// Number of iterations actually executed
    pub total_iterations: u32,
}

/// Configuration for a refinement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementConfig {
    /// Iteration budget (clamped to 1..=10 at run start)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Model used for artifact generation/editing
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    /// Vision model used for verification and pre-analysis
    #[serde(default = "default_verification_model")]
    pub verification_model: String,
    /// Model used for prompt planning; None disables planner calls and
    /// uses the deterministic fallbacks instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planning_model: Option<String>,
}

/// Hard bounds on the iteration budget.
pub const MIN_ITERATIONS: u32 = 1;
pub const MAX_ITERATIONS: u32 = 10;

fn default_max_iterations() -> u32 {
    3
}

fn default_generation_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_verification_model() -> String {
    "gemini-2.5-flash".to_string()
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            generation_model: default_generation_model(),
            verification_model: default_verification_model(),
            planning_model: None,
        }
    }
}

impl RefinementConfig {
    /// The iteration budget clamped into the valid range.
    pub fn effective_max_iterations(&self) -> u32 {
        self.max_iterations.clamp(MIN_ITERATIONS, MAX_ITERATIONS)
    }
}
