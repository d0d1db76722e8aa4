//! Error Handling
//!
//! Unified error types for the engine.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::services::media::ServiceError;

/// Engine-wide error type.
///
/// Transport failures from the media services are fatal to a run and
/// propagate through here; recoverable conditions (judgment-decode
/// failures, planning refusals) are handled locally and never surface.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Media service transport failure (generation, judgment, narration)
    #[error("Media service error: {0}")]
    Service(#[from] ServiceError),

    /// Invalid run input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Run cancelled by the caller
    #[error("Run cancelled")]
    Cancelled,

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for engine errors
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
