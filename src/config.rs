//! Process configuration.

use crate::error::{Result, VehicleSwapError};
use crate::image::{resolve_api_key, GeminiEditor, GeminiModel};
use std::net::SocketAddr;

/// Default listen address for the web UI.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Transport ceiling for uploads. The 5MB shown in the UI is advisory only.
pub const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 20 * 1024 * 1024;

/// Settings resolved once at startup.
#[derive(Clone)]
pub struct AppConfig {
    /// Gemini API key.
    pub api_key: String,
    /// Model used for edits.
    pub model: GeminiModel,
    /// Optional API root override.
    pub base_url: Option<String>,
    /// Address the web UI binds to.
    pub listen_addr: SocketAddr,
    /// Largest request body accepted by the upload route.
    pub upload_limit_bytes: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("listen_addr", &self.listen_addr)
            .field("upload_limit_bytes", &self.upload_limit_bytes)
            .finish()
    }
}

impl AppConfig {
    /// Creates a config with defaults around the given key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api_key: resolve_api_key(Some(api_key.into()))?,
            model: GeminiModel::default(),
            base_url: None,
            listen_addr: parse_addr(DEFAULT_LISTEN_ADDR)?,
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_BYTES,
        })
    }

    /// Builds the shared Gemini client.
    pub fn editor(&self) -> Result<GeminiEditor> {
        let mut builder = GeminiEditor::builder()
            .api_key(self.api_key.clone())
            .model(self.model);
        if let Some(ref url) = self.base_url {
            builder = builder.base_url(url.clone());
        }
        builder.build()
    }
}

/// Parses a listen address; a bare `:port` binds all interfaces.
pub fn parse_addr(addr: &str) -> Result<SocketAddr> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };
    addr.parse()
        .map_err(|e| VehicleSwapError::Config(format!("invalid listen address '{addr}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addr() {
        assert_eq!(parse_addr(":9000").unwrap().to_string(), "0.0.0.0:9000");
        assert_eq!(
            parse_addr("127.0.0.1:8080").unwrap().to_string(),
            "127.0.0.1:8080"
        );
        assert!(matches!(
            parse_addr("localhost"),
            Err(VehicleSwapError::Config(_))
        ));
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = AppConfig::new("test-key").unwrap();
        assert_eq!(config.model, GeminiModel::NanoBanana);
        assert_eq!(config.upload_limit_bytes, DEFAULT_UPLOAD_LIMIT_BYTES);
        assert!(config.editor().is_ok());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = AppConfig::new("super-secret").unwrap();
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
