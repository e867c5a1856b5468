//! Error types for the archsketch-core library.
//!
//! This module provides granular error variants for the different failure
//! modes of mask capture and remote generation, so callers can tell a local
//! validation problem apart from a classified service refusal.

use thiserror::Error;

use crate::generation::{FailureKind, PipelineStatus};

/// Errors that can occur within the archsketch-core library.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing keys, invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required environment variable was not found.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Image processing or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// A source image could not be decoded, so no mask surface can exist for it.
    #[error("Source image could not be decoded: {0}")]
    InvalidSource(String),

    /// The request was rejected locally before any remote call was made.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Raw failure reported by the Gemini API.
    #[error("Gemini API error: {0}")]
    GeminiApi(String),

    /// A remote failure after classification.
    ///
    /// `message` is the user-facing text for the classification.
    #[error("{message}")]
    Generation { kind: FailureKind, message: String },

    /// Another pipeline is still running.
    #[error("A request is already in progress ({0})")]
    Busy(PipelineStatus),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An unclassified error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates a Gemini API error with the given message.
    pub fn gemini(msg: impl Into<String>) -> Self {
        Self::GeminiApi(msg.into())
    }

    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// The failure classification, when this error came from the remote service.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Generation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
