//! Image editor trait.

use crate::error::Result;
use crate::image::types::{EditRequest, EditedImage};
use async_trait::async_trait;

/// A service that swaps the vehicle in a photo.
///
/// `Ok(None)` means the call succeeded but the service returned no image.
/// Callers treat that as "nothing to show", not as a failure.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Performs exactly one edit exchange. No retries.
    async fn edit(&self, request: &EditRequest) -> Result<Option<EditedImage>>;

    /// Model identifier used for edits.
    fn model(&self) -> &str;

    /// Checks if the service is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
