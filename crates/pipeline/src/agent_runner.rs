//! Drives one assistant run from keyword to Markdown article

use std::time::{Duration, Instant};

use assistant_client::{AssistantsClient, ListOrder, MessageRole, RunStatus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};

/// Extra instructions attached to every run
pub const RUN_INSTRUCTIONS: &str = concat!(
    "Generate an SEO article, insert relevant products and images, ",
    "and prepare it for publishing to WordPress."
);

/// The message that opens each thread
pub fn user_prompt(keyword: &str, persona: &str) -> String {
    format!(
        "Please write an article for the following keyword:\nKeyword: {}\nPersona: {}",
        keyword, persona
    )
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub poll_interval: Duration,
    pub run_timeout: Duration,
    /// How many recent thread messages to search for the answer
    pub message_limit: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            run_timeout: Duration::from_secs(600),
            message_limit: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentRunner {
    client: AssistantsClient,
    config: RunnerConfig,
}

impl AgentRunner {
    pub fn new(client: AssistantsClient, config: RunnerConfig) -> Self {
        Self { client, config }
    }

    /// Ask the service to stop a run we no longer wait for. Failures are only logged.
    async fn abandon(&self, thread_id: &str, run_id: &str) {
        match self.client.cancel_run(thread_id, run_id).await {
            Ok(run) => debug!("Cancelled run {} ({})", run_id, run.status),
            Err(e) => warn!("Could not cancel run {}: {}", run_id, e),
        }
    }

    /// Run `assistant_id` for `keyword`/`persona` and return the article Markdown.
    ///
    /// `run_timeout` and `cancel` cover the whole call, thread setup included.
    /// Polling stops at the first terminal status. Once a run exists, a timeout
    /// or cancellation also cancels the remote run before returning.
    pub async fn run(
        &self,
        assistant_id: &str,
        keyword: &str,
        persona: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let started = Instant::now();
        let deadline = tokio::time::sleep(self.config.run_timeout);
        tokio::pin!(deadline);

        let setup = async {
            let thread = self.client.create_thread().await?;
            self.client
                .create_message(&thread.id, MessageRole::User, &user_prompt(keyword, persona))
                .await?;
            let run = self
                .client
                .create_run(&thread.id, assistant_id, RUN_INSTRUCTIONS)
                .await?;
            Ok::<_, PipelineError>((thread, run))
        };

        let (thread, run) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Run setup for keyword '{}' cancelled by operator", keyword);
                return Err(PipelineError::AgentCancelled);
            }
            _ = &mut deadline => {
                warn!("Run setup for keyword '{}' exceeded {:?}", keyword, self.config.run_timeout);
                return Err(PipelineError::AgentTimedOut { elapsed: started.elapsed() });
            }
            created = setup => created?,
        };
        info!("Started run {} for keyword '{}'", run.id, keyword);

        let mut current = run;
        while !current.status.is_terminal() {
            if current.status == RunStatus::RequiresAction {
                self.abandon(&thread.id, &current.id).await;
                return Err(PipelineError::AgentNoResult {
                    status: current.status,
                    detail: "assistant requested tool outputs, which are not supported"
                        .to_string(),
                });
            }

            let poll = async {
                tokio::time::sleep(self.config.poll_interval).await;
                self.client.retrieve_run(&thread.id, &current.id).await
            };

            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Run {} cancelled by operator", current.id);
                    self.abandon(&thread.id, &current.id).await;
                    return Err(PipelineError::AgentCancelled);
                }
                _ = &mut deadline => {
                    warn!(
                        "Run {} still {} after {:?}",
                        current.id, current.status, self.config.run_timeout
                    );
                    self.abandon(&thread.id, &current.id).await;
                    return Err(PipelineError::AgentTimedOut { elapsed: started.elapsed() });
                }
                next = poll => next?,
            };

            debug!("Run {} is {}", next.id, next.status);
            current = next;
        }

        if current.status != RunStatus::Completed {
            let detail = current
                .last_error
                .map(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "no error detail reported".to_string());
            return Err(PipelineError::AgentNoResult {
                status: current.status,
                detail,
            });
        }

        let messages = self
            .client
            .list_messages(&thread.id, ListOrder::Desc, self.config.message_limit)
            .await?;

        let article = messages
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .find_map(|m| m.text())
            .ok_or_else(|| PipelineError::AgentNoResult {
                status: RunStatus::Completed,
                detail: "thread has no assistant text message".to_string(),
            })?;

        info!(
            "Run {} completed in {:.1}s ({} chars)",
            current.id,
            started.elapsed().as_secs_f32(),
            article.len()
        );
        Ok(article.to_string())
    }
}
