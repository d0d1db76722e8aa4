//! Media Service Boundary
//!
//! Defines the abstract services the refinement engine depends on. The
//! HTTP transport, authentication, and retry policy live behind this seam
//! in the hosting application; the engine only sees three calls:
//! generate, judge, and narrate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use atelier_core::streaming::split_channels;

use crate::models::{Artifact, Dimensions};

/// Error types for media service operations.
///
/// These are transport-level failures. The engine treats them as fatal for
/// generation and judgment calls and recovers locally for narration calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceError {
    /// Authentication failed (invalid API key)
    AuthenticationFailed { message: String },
    /// Rate limit exceeded
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },
    /// Network/connection error
    NetworkError { message: String },
    /// Server error from the provider
    ServerError {
        message: String,
        status: Option<u16>,
    },
    /// Response parsing error inside the transport
    ParseError { message: String },
    /// Provider not available
    Unavailable { message: String },
    /// Other error
    Other { message: String },
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            ServiceError::RateLimited { message, .. } => {
                write!(f, "Rate limited: {}", message)
            }
            ServiceError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            ServiceError::ServerError { message, status } => {
                if let Some(s) = status {
                    write!(f, "Server error ({}): {}", s, message)
                } else {
                    write!(f, "Server error: {}", message)
                }
            }
            ServiceError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            ServiceError::Unavailable { message } => {
                write!(f, "Provider unavailable: {}", message)
            }
            ServiceError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for ServiceError {}

/// Result type for media service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Response from a narration call, with the reasoning channel already
/// separated from the answer channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NarrationResponse {
    /// Answer-channel text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Reasoning-channel text, when the model emitted any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl NarrationResponse {
    /// A plain answer-only response.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            reasoning: None,
        }
    }

    /// Assemble a response from raw stream fragments, splitting
    /// `<think>` reasoning spans out of the answer channel.
    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let split = split_channels(fragments);
        Self {
            content: (!split.answer.is_empty()).then_some(split.answer),
            reasoning: (!split.reasoning.is_empty()).then_some(split.reasoning),
        }
    }

    /// The answer-channel text, or empty when the model produced none.
    pub fn primary_text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// The reasoning-channel text, or empty.
    pub fn reasoning_text(&self) -> &str {
        self.reasoning.as_deref().unwrap_or("")
    }
}

/// The three abstract service calls the engine depends on.
///
/// Implementations are supplied by the hosting application (HTTP clients
/// against the hosted generation/vision/planning models) or by test
/// doubles. No retry logic belongs here or in the engine; retries are the
/// transport's concern.
#[async_trait]
pub trait MediaServices: Send + Sync {
    /// Create or edit a visual artifact.
    ///
    /// `references` conditions the generation on existing artifacts (edit
    /// mode); `dimensions` asks the generator to preserve the original
    /// aspect ratio.
    async fn generate(
        &self,
        prompt: &str,
        references: Option<&[Artifact]>,
        dimensions: Option<Dimensions>,
        model: &str,
    ) -> ServiceResult<Artifact>;

    /// Vision-based critique. Returns the model's raw decoded text, which
    /// is expected to embed a JSON verdict object (possibly inside a
    /// fenced code block).
    async fn judge(
        &self,
        artifacts: &[Artifact],
        instruction: &str,
        model: &str,
    ) -> ServiceResult<String>;

    /// Single-turn text generation, optionally conditioned on reference
    /// artifacts for vision-capable models. Used by the prompt planner
    /// (no references) and pre-analysis (with references).
    async fn narrate(
        &self,
        system_instruction: &str,
        user_context: &str,
        references: Option<&[Artifact]>,
        model: &str,
    ) -> ServiceResult<NarrationResponse>;
}
