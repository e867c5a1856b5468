//! Image payloads exchanged with the mask engine and the remote service.
//!
//! Images travel as encoded bytes (PNG or JPEG) together with their MIME
//! type. When the pixel dimensions are known they ride along, since the mask
//! raster and the aspect-ratio selection both depend on the true size rather
//! than the size something happens to be displayed at.

use crate::error::{AppError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// An encoded image plus its declared content type.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new("image/png", bytes)
    }

    /// Encodes the bytes as standard Base64, the form the API expects.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// Builds a payload from Base64 text as returned by the API.
    pub fn from_base64(mime_type: impl Into<String>, data: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(data.trim())
            .map_err(|e| AppError::image(format!("Invalid base64 image data: {}", e)))?;
        Ok(Self::new(mime_type, bytes))
    }

    /// Renders the payload as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }

    pub fn decode(&self) -> Result<DynamicImage> {
        image::load_from_memory(&self.bytes)
            .map_err(|e| AppError::InvalidSource(e.to_string()))
    }

    /// Encodes a decoded image as PNG.
    pub fn encode_png(image: &DynamicImage) -> Result<Self> {
        let mut buffer: Vec<u8> = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| AppError::image(format!("Failed to encode image: {}", e)))?;
        Ok(Self::png(buffer))
    }
}

/// An image supplied by the user: a sketch, a context photo, a reference,
/// or a previously generated rendering being refined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    pub payload: ImagePayload,
    /// True pixel size, if known.
    pub dimensions: Option<(u32, u32)>,
}

impl SourceImage {
    /// Wraps encoded bytes, probing the header for format and dimensions.
    ///
    /// Undecodable bytes are accepted here; they only fail once something
    /// needs the pixels.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let (mime_type, dimensions) = probe(&bytes);
        Self {
            payload: ImagePayload::new(mime_type, bytes),
            dimensions,
        }
    }

    /// Wraps a payload whose dimensions the caller already knows.
    pub fn with_dimensions(payload: ImagePayload, width: u32, height: u32) -> Self {
        Self {
            payload,
            dimensions: Some((width, height)),
        }
    }

    pub fn from_payload(payload: ImagePayload) -> Self {
        let (_, dimensions) = probe(&payload.bytes);
        Self { payload, dimensions }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Ok(Self::from_bytes(bytes))
    }

    /// Decodes the full bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidSource`] if the bytes are not a supported image.
    pub fn decode(&self) -> Result<DynamicImage> {
        self.payload.decode()
    }
}

fn probe(bytes: &[u8]) -> (String, Option<(u32, u32)>) {
    let reader = match ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
        Ok(reader) => reader,
        Err(_) => return ("application/octet-stream".to_string(), None),
    };
    let mime_type = match reader.format() {
        Some(ImageFormat::Jpeg) => "image/jpeg",
        Some(ImageFormat::Png) => "image/png",
        Some(ImageFormat::WebP) => "image/webp",
        _ => "application/octet-stream",
    }
    .to_string();
    (mime_type, reader.into_dimensions().ok())
}
