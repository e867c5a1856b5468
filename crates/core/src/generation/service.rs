//! The remote generation boundary.
//!
//! The orchestrator only needs "prompt plus images in, text or image out, or
//! a failure whose text can be classified". [`crate::gemini::GeminiClient`]
//! is the production implementation; tests substitute scripted fakes.

use std::fmt;
use std::future::Future;

use super::aspect::AspectRatio;
use crate::error::Result;
use crate::imaging::ImagePayload;

/// Which pipeline step a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Analyze,
    Synthesize,
    Style,
    Edit,
    Optimize,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Analyze => "analyze",
            Operation::Synthesize => "synthesize",
            Operation::Style => "style",
            Operation::Edit => "edit",
            Operation::Optimize => "optimize",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call to the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub operation: Operation,
    pub instruction: String,
    /// Sent in order, after the instruction.
    pub images: Vec<ImagePayload>,
    /// Only meaningful for image-producing calls.
    pub aspect_ratio: Option<AspectRatio>,
}

impl GenerationRequest {
    pub fn new(operation: Operation, instruction: impl Into<String>) -> Self {
        Self {
            operation,
            instruction: instruction.into(),
            images: Vec::new(),
            aspect_ratio: None,
        }
    }

    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_images(mut self, images: impl IntoIterator<Item = ImagePayload>) -> Self {
        self.images.extend(images);
        self
    }

    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }
}

/// A capability that turns requests into text or images.
///
/// Failures must carry readable text: the orchestrator classifies them from
/// their `Display` output alone.
pub trait GenerationService {
    /// Requests a text reply.
    fn describe(&self, request: GenerationRequest) -> impl Future<Output = Result<String>> + Send;

    /// Requests an image reply.
    fn render(&self, request: GenerationRequest) -> impl Future<Output = Result<ImagePayload>> + Send;
}
