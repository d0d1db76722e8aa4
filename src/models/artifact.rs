//! Artifact Models
//!
//! A generated or reference visual object carried through a refinement run.
//! Payloads are base64-encoded so artifacts can cross the service boundary
//! and the frontend bridge without re-encoding.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of visual artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Image,
    Video,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Image => write!(f, "image"),
            ArtifactKind::Video => write!(f, "video"),
        }
    }
}

/// Pixel dimensions of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A visual artifact: either a caller-supplied reference or a generator
/// output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Unique identifier for trace correlation
    pub id: String,
    /// Image or video
    pub kind: ArtifactKind,
    /// MIME type of the payload (e.g. `image/png`)
    pub media_type: String,
    /// Base64-encoded payload
    pub data: String,
    /// Pixel dimensions, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

impl Artifact {
    /// Create an image artifact, sniffing dimensions from the payload.
    pub fn image(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        let data = data.into();
        let dimensions = sniff_image_dimensions(&data);
        Self {
            id: Uuid::new_v4().to_string(),
            kind: ArtifactKind::Image,
            media_type: media_type.into(),
            data,
            dimensions,
        }
    }

    /// Create a video artifact. Video payloads are opaque to the engine,
    /// so dimensions must be supplied by the caller when known.
    pub fn video(
        media_type: impl Into<String>,
        data: impl Into<String>,
        dimensions: Option<Dimensions>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: ArtifactKind::Video,
            media_type: media_type.into(),
            data: data.into(),
            dimensions,
        }
    }
}

/// Decode the base64 payload and read pixel dimensions from the image
/// header. Returns None for payloads the image crate cannot identify.
fn sniff_image_dimensions(data: &str) -> Option<Dimensions> {
    let bytes = BASE64.decode(data).ok()?;
    let img = image::load_from_memory(&bytes).ok()?;
    Some(Dimensions::new(img.width(), img.height()))
}
