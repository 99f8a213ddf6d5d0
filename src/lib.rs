//! # visionlens-rs
//!
//! Streaming image analysis over OpenAI-compatible vision endpoints.
//!
//! Give it an image and (optionally) a question; it opens one streaming chat
//! completion call and publishes the answer incrementally as it is generated,
//! settling with derived metrics or a single error.
//!
//! ## Features
//!
//! - **Streaming first**: every non-empty delta republishes the full
//!   accumulated text, so a display can repaint as the answer grows
//! - **One invocation, one outcome**: exactly one `Final` or `Error` update
//!   per analysis; partial text is never presented as a result after a failure
//! - **Supersession**: re-triggering analysis silences the in-flight
//!   invocation via a generation counter, so stale fragments cannot interleave
//! - **Typed failures**: missing preconditions, auth, rate limits, provider
//!   errors, and stream timeouts are distinct error kinds
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use visionlens_rs::{Analyzer, CompletionClient, DisplayUpdate, ImageFormat, ImagePayload, PromptSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CompletionClient::with_api_key("sk-...")?;
//!     let analyzer = Analyzer::new(client);
//!
//!     let image = ImagePayload::new(std::fs::read("cat.jpg")?, ImageFormat::Jpeg);
//!     let mut updates = analyzer.analyze(&image, &PromptSpec::describe());
//!
//!     while let Some(update) = updates.next().await {
//!         match update {
//!             DisplayUpdate::Progress { text, .. } => println!("... {text}"),
//!             DisplayUpdate::Final { text, metrics } => {
//!                 println!("{text}");
//!                 println!("~{} words, {} chars", metrics.approx_words, metrics.chars);
//!             }
//!             DisplayUpdate::Error { message } => eprintln!("failed: {message}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod client;
pub mod error;
pub mod image;
pub mod prompt;
pub mod types;

pub use analyzer::{Analyzer, DisplayUpdate, ResultMetrics};
pub use client::{ClientConfig, CompletionClient, CompletionStream};
pub use error::VisionError;
pub use image::{ImageFormat, ImagePayload};
pub use prompt::{DEFAULT_DESCRIBE_PROMPT, PromptSpec};
