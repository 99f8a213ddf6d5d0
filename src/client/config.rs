//! Client configuration
//!
//! Session-scoped configuration passed explicitly into the client; the
//! credential never lives in ambient global state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::VisionError;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Vision-capable model used unless overridden.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Response token ceiling for analysis requests.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1500;

/// Seconds of stream inactivity tolerated before the invocation fails.
pub const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 60;

/// Configuration for the completion client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API key; required before any request is issued
    pub api_key: Option<String>,

    /// Endpoint base URL
    pub api_base: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Response token ceiling
    pub max_output_tokens: u32,

    /// Per-fragment idle timeout in seconds
    pub stream_timeout_secs: u64,

    /// Declare every image as `image/jpeg` in the outbound data URI instead
    /// of its true media type
    pub normalize_mime_to_jpeg: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            stream_timeout_secs: DEFAULT_STREAM_TIMEOUT_SECS,
            normalize_mime_to_jpeg: false,
        }
    }
}

impl ClientConfig {
    /// Default configuration with an API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Configuration from environment variables. `OPENAI_API_KEY` and
    /// `OPENAI_API_BASE` are honored; everything else keeps its default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            config.api_key = Some(api_key);
        }

        if let Ok(api_base) = std::env::var("OPENAI_API_BASE") {
            config.api_base = api_base;
        }

        config
    }

    /// Validate the configuration. The credential is intentionally not
    /// required here: its absence is a per-invocation precondition failure,
    /// not a construction error.
    pub fn validate(&self) -> Result<(), VisionError> {
        if self.api_base.trim().is_empty() {
            return Err(VisionError::configuration("API base URL cannot be empty"));
        }

        if self.model.trim().is_empty() {
            return Err(VisionError::configuration("model identifier cannot be empty"));
        }

        if self.max_output_tokens == 0 {
            return Err(VisionError::configuration(
                "max_output_tokens must be greater than zero",
            ));
        }

        if self.stream_timeout_secs == 0 {
            return Err(VisionError::configuration(
                "stream_timeout_secs must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Whether a usable credential is present.
    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// Idle timeout as a `Duration`.
    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs)
    }
}
