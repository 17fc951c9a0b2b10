//! Completion service port
//!
//! Any model backend is consumed as a black-box `complete(messages, tools)`.

use async_trait::async_trait;
use thiserror::Error;
use tribunal_domain::{Message, ToolDefinition, ToolIntent};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    #[error("Completion service unavailable: {0}")]
    Unavailable(String),

    #[error("Completion request failed: {0}")]
    RequestFailed(String),

    #[error("Completion timed out")]
    Timeout,
}

/// Model output: text, plus a structured tool-call intent when the backend
/// supports native tool calling.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub tool_intent: Option<ToolIntent>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_intent: None,
        }
    }

    pub fn with_tool_intent(mut self, intent: ToolIntent) -> Self {
        self.tool_intent = Some(intent);
        self
    }
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// `tools` lists the definitions the caller is equipped with; empty
    /// means no tool calling.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Completion, CompletionError>;
}
