//! Error types for vehicle swapping.

use std::time::Duration;

/// Message shown when a failure carries no usable description.
pub const GENERIC_FAILURE_MESSAGE: &str = "An unknown error occurred while talking to the image service.";

/// Maximum length of an upstream error body kept in an error message.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while editing an image.
#[derive(Debug, thiserror::Error)]
pub enum VehicleSwapError {
    /// Startup configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// API key rejected by the service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("Gemini API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited by the image service")]
    RateLimited { retry_after: Option<Duration> },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The uploaded file is not PNG, JPEG or WEBP.
    #[error("unsupported image type: {0}")]
    UnsupportedImageType(String),

    /// Reading the uploaded file failed.
    #[error("Failed to read the image file: {0}")]
    FileRead(String),

    /// Submission attempted without an image or a prompt.
    #[error("Please upload an image and describe the new vehicle.")]
    MissingInput,

    /// Another edit request is still pending.
    #[error("an edit request is already in progress")]
    RequestInFlight,

    /// Network, transport or response decoding error, with its cause chain.
    #[error("Gemini API error: {0}")]
    Network(String),

    /// The background edit task stopped without reporting an outcome.
    #[error("the edit task stopped unexpectedly: {0}")]
    Internal(String),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VehicleSwapError {
    /// Returns the suggested retry delay, if the service sent one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Text suitable for the result panel, falling back to a generic message.
    pub fn user_message(&self) -> String {
        let detail_missing = match self {
            Self::Api { message, .. } => message.trim().is_empty(),
            Self::Config(m)
            | Self::Auth(m)
            | Self::ContentBlocked(m)
            | Self::InvalidRequest(m)
            | Self::UnsupportedImageType(m)
            | Self::FileRead(m)
            | Self::Network(m)
            | Self::Internal(m)
            | Self::Decode(m) => m.trim().is_empty(),
            _ => false,
        };
        if detail_missing {
            return GENERIC_FAILURE_MESSAGE.to_string();
        }

        match self.retry_after() {
            Some(delay) => format!("{self}. Please try again in {}s.", delay.as_secs()),
            None => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for VehicleSwapError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(error_chain(&err))
    }
}

/// Joins an error and all of its sources, skipping repeated messages.
pub(crate) fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts: Vec<String> = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !parts.iter().any(|p| p.contains(&text)) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}

/// Result type alias for vehicle swap operations.
pub type Result<T> = std::result::Result<T, VehicleSwapError>;

/// Extracts the `Retry-After` header as whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Redacts API keys and truncates long upstream error bodies.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            if let Some(pos) = word.find("key=") {
                format!("{}key=[REDACTED]", &word[..pos])
            } else if word.starts_with("AIza") && word.len() > 30 {
                "[REDACTED]".to_string()
            } else {
                word.to_string()
            }
        })
        .collect();
    let mut message = redacted.join(" ");

    if message.len() > MAX_ERROR_MESSAGE_LEN {
        let mut cut = MAX_ERROR_MESSAGE_LEN;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
        message.push_str("...");
    }
    message
}
