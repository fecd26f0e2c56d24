//! Clients and pipeline components built from the resolved settings

use std::sync::Arc;

use anyhow::{Context, Result};
use assistant_client::{AssistantsClient, ChatConfig, OpenAIConfig, OpenAIProvider};
use cms_client::{CmsClient, CmsCredentials};
use pipeline::{AgentRunner, Publisher, RunnerConfig, TaxonomySuggester};

use crate::config::ResolvedSettings;

/// Everything the shell talks to, created once per process
#[derive(Debug, Clone)]
pub struct Services {
    pub cms: CmsClient,
    pub runner: AgentRunner,
    pub publisher: Publisher,
}

impl Services {
    pub fn from_settings(settings: &ResolvedSettings) -> Result<Self> {
        let cms = CmsClient::new(
            &settings.cms_url,
            CmsCredentials::new(&settings.cms_username, &settings.cms_app_password),
        )
        .context("Failed to create CMS client")?;

        // Each request is bounded by the config's default timeout
        let openai =
            OpenAIConfig::new(&settings.openai_api_key).with_api_base(&settings.openai_api_base);

        let assistants =
            AssistantsClient::new(openai.clone()).context("Failed to create Assistants client")?;
        let runner = AgentRunner::new(
            assistants,
            RunnerConfig {
                poll_interval: settings.poll_interval,
                run_timeout: settings.run_timeout,
                ..Default::default()
            },
        );

        let provider = OpenAIProvider::new(openai).context("Failed to create completion client")?;
        let suggester = TaxonomySuggester::new(
            Arc::new(provider),
            ChatConfig {
                model: settings.model.clone(),
                ..Default::default()
            },
        );

        Ok(Self {
            publisher: Publisher::new(cms.clone(), suggester)
                .context("Failed to create publisher")?,
            cms,
            runner,
        })
    }
}
