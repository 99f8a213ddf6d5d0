//! Completion client
//!
//! Opens the single authenticated streaming call per analysis invocation and
//! exposes it as a sequence of incremental chunks. No retries, no
//! reconnection: a failed call is surfaced once and the caller re-triggers.

pub mod config;
pub mod sse;

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::VisionError;
use crate::types::requests::CompletionRequest;

pub use config::ClientConfig;
pub use sse::CompletionStream;

/// Client for an OpenAI-compatible vision chat completion endpoint.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl CompletionClient {
    /// Create a new client. Validates the configuration up front.
    pub fn new(config: ClientConfig) -> Result<Self, VisionError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                VisionError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { config, http })
    }

    /// Create a client with an API key and default settings.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, VisionError> {
        Self::new(ClientConfig::with_api_key(api_key))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open the streaming completion call.
    ///
    /// Non-success statuses are mapped to typed errors before any chunk is
    /// surfaced; the provider's error body is preserved verbatim where
    /// available.
    pub async fn stream_analysis(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionStream, VisionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(VisionError::MissingCredential)?;

        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );

        debug!(model = %request.model, "opening streaming completion request");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(request)
            .send()
            .await
            .map_err(|e| VisionError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "completion endpoint rejected the request");
            return Err(map_status_error(status.as_u16(), body));
        }

        Ok(CompletionStream::new(response.bytes_stream()))
    }
}

/// Map a non-success HTTP status to a typed error, keeping the response body.
fn map_status_error(status: u16, body: String) -> VisionError {
    let message = if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        body
    };

    match status {
        401 | 403 => VisionError::Authentication { message },
        429 => VisionError::RateLimited { message },
        _ => VisionError::Provider { status, message },
    }
}
