#![warn(missing_docs)]
//! Vehicle Swap - replace the vehicle in a photo with Gemini image editing.
//!
//! The user uploads a photo, describes a replacement vehicle, and gets the
//! edited image back. Every request carries a fixed directive that keeps the
//! original style and turns the new vehicle's wheels into glossy rainbow
//! spheres.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use vehicle_swap::{DiskFile, EditForm, GeminiEditor};
//!
//! #[tokio::main]
//! async fn main() -> vehicle_swap::Result<()> {
//!     let editor = GeminiEditor::builder().build()?;
//!     let mut form = EditForm::new();
//!     form.select_image(Arc::new(DiskFile::open("car.png")?)).await?;
//!     form.set_prompt("a vintage steam train");
//!     form.submit(&editor).await?;
//!     if let Some(image) = form.generated() {
//!         image.save("train.png")?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `server`: axum web UI
//! - `cli`: `vehicle-swap` binary (implies `server`)

pub mod config;
mod error;
pub mod form;
pub mod image;

#[cfg(feature = "server")]
pub mod server;

// Re-export error types at crate root
pub use error::{Result, VehicleSwapError, GENERIC_FAILURE_MESSAGE};

pub use config::AppConfig;
pub use form::{EditForm, FormView, RequestStatus, ResultPanel, SubmitTicket};
pub use image::{
    DiskFile, EditRequest, EditedImage, GeminiEditor, GeminiEditorBuilder, GeminiModel,
    ImageEditor, ImageFile, ImageFormat, InlineImage, MemoryFile,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, VehicleSwapError};
    pub use crate::form::{EditForm, ResultPanel};
    pub use crate::image::{EditRequest, EditedImage, GeminiEditor, ImageEditor, ImageFile};
}
