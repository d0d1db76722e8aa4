//! Artifact Analysis Models
//!
//! Structured description of a reference artifact, computed once at the
//! start of an edit run and shared read-only by every planner call. The
//! wire shape is camelCase because it doubles as the JSON contract the
//! extraction prompt shows to the vision model.

use serde::{Deserialize, Serialize};

/// A detected subject (person or primary figure) in a reference artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDescription {
    /// Stable identifier within the analysis (e.g. "subject-1")
    pub id: String,
    /// Where the subject sits in the frame (e.g. "left third")
    #[serde(default)]
    pub location: String,
    /// Free-text description of the subject
    #[serde(default)]
    pub description: String,
}

/// An item attached to or worn by a subject (clothing, accessories).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedItem {
    /// The item itself (e.g. "shirt")
    pub item: String,
    /// Distinguishing attribute (e.g. "red")
    #[serde(default)]
    pub attribute: String,
    /// Where the item appears (e.g. "on the left subject")
    #[serde(default)]
    pub location: String,
}

/// Structured description of the reference artifact(s) for an edit run.
///
/// Computed at most once per run; all subsequent planner calls read it to
/// build preservation constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactAnalysis {
    /// Whether any subjects were detected
    pub has_subjects: bool,
    /// Detected subjects
    #[serde(default)]
    pub subjects: Vec<SubjectDescription>,
    /// Clothing and accessories attached to subjects
    #[serde(default)]
    pub attached_items: Vec<AttachedItem>,
    /// Free-text description of the background
    #[serde(default)]
    pub background_description: String,
    /// Salient non-subject objects in the frame
    #[serde(default)]
    pub salient_objects: Vec<String>,
    /// Synthesized instruction telling the generator what must not change
    #[serde(default)]
    pub preservation_instructions: String,
}

impl ArtifactAnalysis {
    /// Number of detected subjects.
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    /// Minimal single-subject analysis used when every extraction tier
    /// fails. Editing proceeds with generic preservation constraints
    /// rather than none at all.
    pub fn minimal(preservation_instructions: impl Into<String>) -> Self {
        Self {
            has_subjects: true,
            subjects: vec![SubjectDescription {
                id: "subject-1".to_string(),
                location: String::new(),
                description: "primary subject".to_string(),
            }],
            attached_items: Vec::new(),
            background_description: String::new(),
            salient_objects: Vec::new(),
            preservation_instructions: preservation_instructions.into(),
        }
    }
}
