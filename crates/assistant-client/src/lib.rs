//! Assistant Client - HTTP client for the OpenAI APIs the article agent uses
//!
//! Two surfaces are exposed:
//! - [`AssistantsClient`]: threads, messages and runs of the Assistants API (v2),
//!   used to let a pre-configured assistant draft an article
//! - [`OpenAIProvider`]: Chat Completions behind the [`CompletionProvider`]
//!   trait, used for one-shot classification prompts
//!
//! Both are built from an [`OpenAIConfig`] so that the API key and base URL
//! come from the caller's configuration rather than the environment.

mod assistants;
mod openai;
mod provider;
mod types;

use std::time::Duration;

pub use assistants::AssistantsClient;
pub use openai::OpenAIProvider;
pub use provider::{ChatConfig, ChatMessage, ChatRequest, CompletionProvider, MessageRole};
pub use types::*;

/// Default OpenAI REST base URL
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Per-request time limit unless the caller sets one
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings shared by the OpenAI clients
#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Point the clients at a different base URL (proxies, Azure, test servers)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request made with this config
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// HTTP client honouring the configured timeout
    pub(crate) fn http_client(&self) -> Result<reqwest::Client, AssistantError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                AssistantError::RequestFailed(format!("failed to build HTTP client: {}", e))
            })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    pub(crate) fn bearer(&self) -> Result<String, AssistantError> {
        if self.api_key.trim().is_empty() {
            return Err(AssistantError::AuthError(
                "No OpenAI API key configured".to_string(),
            ));
        }
        Ok(format!("Bearer {}", self.api_key))
    }
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"***")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Error type for OpenAI client operations
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Response parse error: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),
}

/// Turn a non-success response into an [`AssistantError`], or parse its JSON body.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AssistantError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(match status.as_u16() {
            401 => AssistantError::AuthError(body),
            429 => AssistantError::RateLimited(body),
            code => AssistantError::ApiError {
                status: code,
                message: body,
            },
        });
    }

    response
        .json()
        .await
        .map_err(|e| AssistantError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_url_joining() {
        let config = OpenAIConfig::new("sk-test").with_api_base("http://localhost:8080/v1/");
        assert_eq!(config.url("/threads"), "http://localhost:8080/v1/threads");
        assert_eq!(config.url("chat/completions"), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_missing_key_is_auth_error() {
        let config = OpenAIConfig::new("  ");
        assert!(matches!(config.bearer(), Err(AssistantError::AuthError(_))));
        assert_eq!(OpenAIConfig::new("k").bearer().unwrap(), "Bearer k");
    }

    #[test]
    fn test_config_debug_masks_key() {
        let printed = format!("{:?}", OpenAIConfig::new("sk-secret"));
        assert!(!printed.contains("sk-secret"));
    }

    #[test]
    fn test_config_timeout_defaults_and_overrides() {
        let config = OpenAIConfig::new("k");
        assert_eq!(config.timeout, DEFAULT_REQUEST_TIMEOUT);

        let config = config.with_timeout(Duration::from_millis(250));
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert!(config.http_client().is_ok());
    }
}
