//! Refinement Engine
//!
//! The agentic generation refinement loop and its sub-components:
//!
//! - `controller` - the iteration loop itself
//! - `verifier` - vision-based structured judgment with fail-open decode
//! - `planner` - next-prompt synthesis with deterministic fallbacks
//! - `analysis` - one-shot reference pre-analysis for edit runs
//! - `strategy` - keyword classification of issues into a continuation
//!   strategy
//! - `events` - progress notifications

pub mod analysis;
pub mod controller;
pub mod events;
pub mod planner;
pub mod strategy;
pub mod verifier;

pub use controller::RefinementEngine;
pub use events::RefinementEvent;
pub use strategy::classify;
