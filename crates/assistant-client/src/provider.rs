//! Completion provider trait and common chat types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AssistantError;

/// Role of a message in a conversation or thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Configuration for a chat request
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.2,
            max_tokens: 512,
        }
    }
}

/// A complete chat request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub config: ChatConfig,
}

impl ChatRequest {
    /// Single user turn with the given config
    pub fn user(content: impl Into<String>, config: ChatConfig) -> Self {
        Self {
            messages: vec![ChatMessage::user(content)],
            config,
        }
    }
}

/// Anything that can turn a chat request into response text
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logging/display
    fn name(&self) -> &'static str;

    /// Send a chat request and return the text of the first choice
    async fn complete(&self, request: ChatRequest) -> Result<String, AssistantError>;
}
