//! Image editing module.

mod editor;
mod file;
mod gemini;
pub mod prompt;
mod types;

pub use editor::ImageEditor;
pub use file::{ensure_accepted, DiskFile, ImageFile, MemoryFile};
pub use gemini::{
    resolve_api_key, GeminiEditor, GeminiEditorBuilder, GeminiModel, API_KEY_ENV_VARS,
    DEFAULT_BASE_URL,
};
pub use types::{EditMetadata, EditRequest, EditedImage, ImageFormat, InlineImage};
