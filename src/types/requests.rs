//! Request types for the OpenAI-compatible API

use serde::{Deserialize, Serialize};

use super::messages::{ChatMessage, ContentPart};

/// Chat completion request
///
/// Built fresh for every analysis invocation and immutable once sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model to use for completion
    pub model: String,
    /// List of messages
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Whether to stream the response
    #[serde(default)]
    pub stream: bool,
}

impl CompletionRequest {
    /// Build the single-message analysis request: one user message whose
    /// content is the resolved instruction followed by the image reference.
    /// Streaming is always enabled.
    pub fn for_analysis(
        model: impl Into<String>,
        prompt_text: impl Into<String>,
        image_data_uri: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user_with_parts(vec![
                ContentPart::text(prompt_text),
                ContentPart::image_url(image_data_uri),
            ])],
            max_tokens: Some(max_tokens),
            stream: true,
        }
    }
}
