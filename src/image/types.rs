//! Core types for image editing.

use crate::error::{Result, VehicleSwapError};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats the upload control accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// All formats accepted for upload.
    pub const ACCEPTED: [ImageFormat; 3] = [Self::Png, Self::Jpeg, Self::WebP];

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Attempts to detect format from a MIME type, ignoring parameters.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }

    /// Value for an HTML `accept` attribute.
    pub fn accept_attribute() -> String {
        Self::ACCEPTED
            .iter()
            .map(|f| f.mime_type())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Base64 image payload paired with its MIME type.
///
/// Used both for the uploaded image sent to the model and for the image
/// returned by it. The payload is kept as received so results pass through
/// without re-encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    /// Base64 data without a data-URL prefix.
    pub data: String,
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
}

impl InlineImage {
    /// Wraps an existing base64 payload.
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Encodes raw bytes.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// Returns the image as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decodes the base64 payload.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| VehicleSwapError::Decode(e.to_string()))
    }

    /// Format implied by the MIME type, if it is one we know.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }
}

/// A single vehicle swap request.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// The original photo.
    pub image: InlineImage,
    /// Free-text description of the replacement vehicle.
    pub vehicle: String,
}

impl EditRequest {
    /// Creates a new request.
    pub fn new(image: InlineImage, vehicle: impl Into<String>) -> Self {
        Self {
            image,
            vehicle: vehicle.into(),
        }
    }

    /// The full instruction sent to the model.
    pub fn instruction(&self) -> String {
        crate::image::prompt::compose_instruction(&self.vehicle)
    }
}

/// Metadata about the edit call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditMetadata {
    /// Model used for the edit.
    pub model: Option<String>,
    /// Round-trip duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// An image returned by the model.
#[derive(Debug, Clone, Serialize)]
#[must_use = "edited image should be displayed or saved"]
pub struct EditedImage {
    /// The payload exactly as the service returned it.
    pub image: InlineImage,
    /// Call metadata.
    pub metadata: EditMetadata,
}

impl EditedImage {
    /// Creates a new edited image.
    pub fn new(image: InlineImage, metadata: EditMetadata) -> Self {
        Self { image, metadata }
    }

    /// Returns the image as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        self.image.to_data_url()
    }

    /// Decodes and writes the image to the given path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<usize> {
        let bytes = self.image.decode()?;
        std::fs::write(path, &bytes)?;
        Ok(bytes.len())
    }
}
