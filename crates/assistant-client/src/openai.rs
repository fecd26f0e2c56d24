//! OpenAI Chat Completions provider

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    AssistantError, OpenAIConfig, read_json,
    provider::{ChatMessage, ChatRequest, CompletionProvider, MessageRole},
};

/// OpenAI Chat Completions API provider
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Build a provider whose requests are bounded by `config.timeout`
    pub fn new(config: OpenAIConfig) -> Result<Self, AssistantError> {
        Ok(Self {
            client: config.http_client()?,
            config,
        })
    }

    /// Convert our ChatMessage to OpenAI API format
    fn message_to_openai(&self, msg: &ChatMessage) -> serde_json::Value {
        let role = match msg.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        serde_json::json!({
            "role": role,
            "content": msg.content
        })
    }

    /// Pull the first choice's text out of a completion response
    fn parse_response(&self, json: &serde_json::Value) -> Result<String, AssistantError> {
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| {
                AssistantError::ParseError("completion response has no message content".to_string())
            })
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "OpenAI"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, AssistantError> {
        let auth_header = self.config.bearer()?;

        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| self.message_to_openai(m))
            .collect();

        let payload = serde_json::json!({
            "model": request.config.model,
            "temperature": request.config.temperature,
            "max_tokens": request.config.max_tokens,
            "messages": messages
        });

        tracing::debug!(
            "[OpenAI] Sending completion: model={}, messages={}",
            request.config.model,
            messages.len()
        );

        let response = self
            .client
            .post(self.config.url("chat/completions"))
            .header("Authorization", auth_header)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AssistantError::RequestFailed(e.to_string()))?;

        let json: serde_json::Value = read_json(response).await?;
        self.parse_response(&json)
    }
}
