//! Error types for the vision analysis client
//!
//! All failures are terminal for the invocation that raised them; nothing in
//! this crate retries automatically.

use thiserror::Error;

/// Unified error type covering preconditions, transport, and provider failures.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum VisionError {
    #[error("no image has been provided")]
    MissingImage,

    #[error("no API credential has been provided")]
    MissingCredential,

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("authentication failed: {message}")]
    Authentication { message: String },

    #[error("rate limit exceeded: {message}")]
    RateLimited { message: String },

    #[error("provider error (status {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("failed to parse provider response: {message}")]
    ResponseParsing { message: String },

    #[error("stream timed out after {seconds}s of inactivity")]
    Timeout { seconds: u64 },
}

impl VisionError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a response parsing error
    pub fn response_parsing(message: impl Into<String>) -> Self {
        Self::ResponseParsing {
            message: message.into(),
        }
    }

    /// True for errors raised before any request is issued.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingImage | Self::MissingCredential)
    }
}

impl From<reqwest::Error> for VisionError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for VisionError {
    fn from(error: serde_json::Error) -> Self {
        Self::ResponseParsing {
            message: error.to_string(),
        }
    }
}
