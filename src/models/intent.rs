//! Generation Intent
//!
//! The immutable original request for a refinement run. Every iteration is
//! judged against this intent, never against an intermediate prompt, which
//! is what prevents goal drift across iterations.

use serde::{Deserialize, Serialize};

use super::artifact::{Artifact, Dimensions};

/// The caller's original request: natural-language text plus optional
/// reference artifacts. Reference artifacts put the run into edit mode;
/// they are the fixed ground truth that every edit iteration starts from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationIntent {
    /// Original natural-language request
    pub text: String,
    /// Reference artifacts supplied by the caller (empty for create runs)
    #[serde(default)]
    pub references: Vec<Artifact>,
}

impl GenerationIntent {
    /// Intent for a create run (no references).
    pub fn create(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            references: Vec::new(),
        }
    }

    /// Intent for an edit run conditioned on reference artifacts.
    pub fn edit(text: impl Into<String>, references: Vec<Artifact>) -> Self {
        Self {
            text: text.into(),
            references,
        }
    }

    /// Whether this intent carries reference artifacts.
    pub fn is_edit(&self) -> bool {
        !self.references.is_empty()
    }

    /// Dimensions of the first reference artifact, used to preserve aspect
    /// ratio across edit iterations.
    pub fn reference_dimensions(&self) -> Option<Dimensions> {
        self.references.first().and_then(|a| a.dimensions)
    }
}
