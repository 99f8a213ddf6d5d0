//! Streaming response chunks
//!
//! One chunk per server-sent event; each carries at most one textual delta.
//! Deserialization is tolerant: providers omit fields freely between chunks.

use serde::{Deserialize, Serialize};

use super::messages::MessageRole;

/// Streaming chunk for chat completions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChunk {
    /// Unique identifier for the completion
    #[serde(default)]
    pub id: String,
    /// Object type (always "chat.completion.chunk")
    #[serde(default)]
    pub object: String,
    /// Unix timestamp of creation
    #[serde(default)]
    pub created: i64,
    /// Model used for completion
    #[serde(default)]
    pub model: String,
    /// Array of completion choices
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    /// Usage statistics (only in the final chunk, if requested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatChunk {
    /// The incremental text carried by this chunk, if any.
    pub fn delta_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
    }

    /// Finish reason of the first choice, present only on the closing chunk.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.choices.first().and_then(|choice| choice.finish_reason)
    }
}

/// Choice in a streaming chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChoice {
    /// Index of the choice
    #[serde(default)]
    pub index: u32,
    /// Delta containing the incremental content
    #[serde(default)]
    pub delta: ChatDelta,
    /// Reason for finishing (only in the final chunk)
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// Delta containing incremental content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatDelta {
    /// Role of the message (only in the first chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,
    /// Incremental content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Reason the provider stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    #[serde(other)]
    Other,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_deserialization() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion.chunk",
            "created": 1234567890,
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "delta": {"content": "Hello"},
                "finish_reason": null
            }]
        }"#;

        let chunk: ChatChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.id, "chatcmpl-123");
        assert_eq!(chunk.model, "gpt-4o");
        assert_eq!(chunk.delta_text(), Some("Hello"));
        assert_eq!(chunk.finish_reason(), None);
    }

    #[test]
    fn test_sparse_chunk_defaults() {
        let chunk: ChatChunk = serde_json::from_str(r#"{"choices":[{"delta":{}}]}"#).unwrap();
        assert_eq!(chunk.id, "");
        assert_eq!(chunk.delta_text(), None);

        let chunk: ChatChunk = serde_json::from_str("{}").unwrap();
        assert!(chunk.choices.is_empty());
        assert_eq!(chunk.delta_text(), None);
    }

    #[test]
    fn test_finish_reason_parsing() {
        let json = r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        let chunk: ChatChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.finish_reason(), Some(FinishReason::Stop));

        let json = r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#;
        let chunk: ChatChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.finish_reason(), Some(FinishReason::Other));
    }

    #[test]
    fn test_role_only_first_chunk() {
        let json = r#"{"choices":[{"delta":{"role":"assistant","content":""}}]}"#;
        let chunk: ChatChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.delta_text(), Some(""));
        assert_eq!(chunk.choices[0].delta.role, Some(MessageRole::Assistant));
    }
}
