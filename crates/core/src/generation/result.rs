//! Generation results.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::imaging::{ImagePayload, SourceImage};

/// How a result came to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultOrigin {
    Generated,
    /// Re-rendered with a master style (or a free-form style instruction).
    Styled { style: String },
    /// Locally edited through a mask.
    Edited { instruction: String, parent: Uuid },
}

/// One rendering outcome. Never mutated after creation; refinements produce
/// new results.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptResult {
    pub id: Uuid,
    pub prompt: String,
    pub image: Option<ImagePayload>,
    /// Set when the image step failed but the prompt is still usable.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub origin: ResultOrigin,
}

impl PromptResult {
    pub fn new(prompt: impl Into<String>, image: Option<ImagePayload>, error: Option<String>, origin: ResultOrigin) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.into(),
            image,
            error,
            created_at: Utc::now(),
            origin,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Text and image both present.
    pub fn is_complete(&self) -> bool {
        self.image.is_some() && self.error.is_none()
    }

    /// The image as a source for further refinement, if there is one.
    pub fn image_source(&self) -> Option<SourceImage> {
        self.image.clone().map(SourceImage::from_payload)
    }

    /// A new result derived from this one with a different image.
    pub fn derive(&self, image: ImagePayload, origin: ResultOrigin) -> Self {
        Self::new(self.prompt.clone(), Some(image), None, origin)
    }
}
