//! Prompt selection
//!
//! A single instruction accompanies every analysis request: either the fixed
//! description prompt or a user-supplied question.

/// Instruction used when the user has not asked a specific question.
pub const DEFAULT_DESCRIBE_PROMPT: &str = "Describe in detail what you see in this image. \
Include objects, people, scenes, colors, mood, and any other relevant elements.";

/// Prompt selection: the "ask a specific question" toggle plus the question
/// text that accompanies it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptSpec {
    /// Whether the user opted into asking a specific question.
    pub ask_specific: bool,
    /// The question text, if any was supplied.
    pub question: Option<String>,
}

impl PromptSpec {
    /// The default description request.
    pub fn describe() -> Self {
        Self::default()
    }

    /// A specific question about the image.
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            ask_specific: true,
            question: Some(text.into()),
        }
    }

    /// Resolve the instruction text for the outbound request.
    ///
    /// The supplied question is used verbatim only when the toggle is set and
    /// the text is non-blank; in every other case the fixed description
    /// instruction applies.
    pub fn resolve(&self) -> &str {
        if self.ask_specific {
            if let Some(question) = &self.question {
                if !question.trim().is_empty() {
                    return question;
                }
            }
        }
        DEFAULT_DESCRIBE_PROMPT
    }
}
