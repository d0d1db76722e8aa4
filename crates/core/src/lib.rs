//! Atelier Core
//!
//! Foundational types for the Atelier workspace. This crate has zero
//! dependencies on application-level code (media services, refinement
//! engine, etc.).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `parse` - Defensive JSON extraction from model output
//! - `streaming` - Reasoning/answer channel separation for incrementally
//!   delivered model responses
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/thiserror** - keeps build times minimal
//! 2. **Pure, state-machine style components** - independently testable without a runtime
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod error;
pub mod parse;
pub mod streaming;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── JSON Extraction ────────────────────────────────────────────────────
pub use parse::{decode_json, extract_json_object};

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::{split_channels, ReasoningDecoder, SplitResponse, StreamEvent};
