//! Sources for the user's chosen image file.

use crate::error::{Result, VehicleSwapError};
use crate::image::types::ImageFormat;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A selected file that can be read (and re-read) without blocking.
#[async_trait]
pub trait ImageFile: Send + Sync {
    /// Display name of the file.
    fn name(&self) -> &str;

    /// Declared MIME type.
    fn mime_type(&self) -> &str;

    /// Reads the full contents. Failures are reported as [`VehicleSwapError::FileRead`].
    async fn read(&self) -> Result<Vec<u8>>;
}

/// Fails unless the MIME type is one the upload control accepts.
pub fn ensure_accepted(mime_type: &str) -> Result<ImageFormat> {
    ImageFormat::from_mime_type(mime_type)
        .ok_or_else(|| VehicleSwapError::UnsupportedImageType(mime_type.to_string()))
}

/// An uploaded file already held in memory.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    mime_type: String,
    data: Vec<u8>,
}

impl MemoryFile {
    /// Creates a new in-memory file.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }
}

#[async_trait]
impl ImageFile for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn read(&self) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }
}

/// A file on local disk, read on demand.
#[derive(Debug, Clone)]
pub struct DiskFile {
    path: PathBuf,
    name: String,
    mime_type: String,
}

impl DiskFile {
    /// Creates a disk file, inferring the MIME type from the extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormat::from_extension)
            .ok_or_else(|| VehicleSwapError::UnsupportedImageType(path.display().to_string()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            path,
            name,
            mime_type: format.mime_type().to_string(),
        })
    }
}

#[async_trait]
impl ImageFile for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| VehicleSwapError::FileRead(format!("{}: {e}", self.name)))
    }
}
