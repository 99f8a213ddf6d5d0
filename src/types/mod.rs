//! Wire types for the OpenAI-compatible chat completion API

pub mod chunks;
pub mod messages;
pub mod requests;

pub use chunks::{ChatChunk, ChatDelta, FinishReason, StreamChoice, Usage};
pub use messages::{ChatMessage, ContentPart, ImageUrl, MessageContent, MessageRole};
pub use requests::CompletionRequest;
