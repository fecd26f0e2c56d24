//! Assistants API (v2): threads, messages and runs

use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::{
    AssistantError, MessageRole, OpenAIConfig, read_json,
    types::{ListOrder, MessageList, Run, Thread, ThreadMessage},
};

/// Client for the thread/run lifecycle of the Assistants API
#[derive(Debug, Clone)]
pub struct AssistantsClient {
    client: Client,
    config: OpenAIConfig,
}

impl AssistantsClient {
    /// Build a client whose requests are bounded by `config.timeout`
    pub fn new(config: OpenAIConfig) -> Result<Self, AssistantError> {
        Ok(Self {
            client: config.http_client()?,
            config,
        })
    }

    /// Attach auth and the beta header every Assistants endpoint requires
    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, AssistantError> {
        Ok(builder
            .header("Authorization", self.config.bearer()?)
            .header("OpenAI-Beta", "assistants=v2"))
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, AssistantError> {
        let response = self
            .authorized(builder)?
            .send()
            .await
            .map_err(|e| AssistantError::RequestFailed(e.to_string()))?;
        read_json(response).await
    }

    /// Create an empty thread
    pub async fn create_thread(&self) -> Result<Thread, AssistantError> {
        let thread: Thread = self
            .send(
                self.client
                    .post(self.config.url("threads"))
                    .json(&serde_json::json!({})),
            )
            .await?;
        debug!("Created thread {}", thread.id);
        Ok(thread)
    }

    /// Append a message to a thread
    pub async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage, AssistantError> {
        self.send(
            self.client
                .post(self.config.url(&format!("threads/{}/messages", thread_id)))
                .json(&serde_json::json!({
                    "role": role,
                    "content": content
                })),
        )
        .await
    }

    /// Start a run of `assistant_id` on a thread with extra instructions
    pub async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: &str,
    ) -> Result<Run, AssistantError> {
        let run: Run = self
            .send(
                self.client
                    .post(self.config.url(&format!("threads/{}/runs", thread_id)))
                    .json(&serde_json::json!({
                        "assistant_id": assistant_id,
                        "instructions": instructions
                    })),
            )
            .await?;
        debug!("Started run {} on thread {} ({})", run.id, thread_id, run.status);
        Ok(run)
    }

    /// Fetch the current state of a run
    pub async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        self.send(
            self.client
                .get(self.config.url(&format!("threads/{}/runs/{}", thread_id, run_id))),
        )
        .await
    }

    /// Ask the service to stop a run
    pub async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        self.send(
            self.client
                .post(self.config.url(&format!("threads/{}/runs/{}/cancel", thread_id, run_id))),
        )
        .await
    }

    /// List messages of a thread
    pub async fn list_messages(
        &self,
        thread_id: &str,
        order: ListOrder,
        limit: u32,
    ) -> Result<Vec<ThreadMessage>, AssistantError> {
        let list: MessageList = self
            .send(
                self.client
                    .get(self.config.url(&format!("threads/{}/messages", thread_id)))
                    .query(&[
                        ("order", order.as_str().to_string()),
                        ("limit", limit.to_string()),
                    ]),
            )
            .await?;
        Ok(list.data)
    }
}
