//! Atelier Engine
//!
//! Closed-loop refinement engine for generated visual media. The engine
//! repeatedly generates or edits an artifact, submits the result to a
//! vision-capable model for structured critique, and re-plans the next
//! attempt until the output is judged satisfactory or the iteration budget
//! is exhausted.
//!
//! ## Module Organization
//!
//! - `models` - Data structures (intent, artifacts, iteration trace, config)
//! - `services::media` - Abstract media service boundary (generate/judge/narrate)
//! - `services::refinement` - The refinement engine: controller, verifier,
//!   planner, pre-analysis, strategy selector
//! - `utils` - Engine error types
//!
//! The chat transcript UI, persistence, and HTTP transport live outside
//! this workspace; the engine only sees the [`services::media::MediaServices`]
//! seam.

pub mod models;
pub mod services;
pub mod utils;

pub use models::{
    Artifact, ArtifactAnalysis, ArtifactKind, ContinuationStrategy, Dimensions, GenerationIntent,
    Iteration, RefinementConfig, RunMode, RunResult, VerificationResult,
};
pub use services::media::{MediaServices, NarrationResponse, ServiceError, ServiceResult};
pub use services::refinement::{RefinementEngine, RefinementEvent};
pub use utils::error::{EngineError, EngineResult};
