//! Configuration management for the SEO agent CLI
//!
//! Handles loading and saving configuration from ~/.seo-agent/config.toml and
//! merging it with flags and environment variables at startup.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use assistant_client::DEFAULT_API_BASE;
use serde::{Deserialize, Serialize};

/// Configuration for the SEO agent CLI
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub cms: CmsConfig,

    #[serde(default)]
    pub openai: OpenAIConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CmsConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub app_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model used for taxonomy suggestions
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            model: default_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub assistant_id: Option<String>,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
}

fn default_poll_interval() -> u64 {
    2
}

fn default_run_timeout() -> u64 {
    600
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            assistant_id: None,
            poll_interval_secs: default_poll_interval(),
            run_timeout_secs: default_run_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub keyword: Option<String>,

    #[serde(default = "default_persona")]
    pub persona: String,
}

fn default_persona() -> String {
    "aspiring engineer learning on their own".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            keyword: None,
            persona: default_persona(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub markdown_rendering: bool,

    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            markdown_rendering: true,
            color: true,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .with_context(|| format!("{} expects true or false, got {:?}", key, value))
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    let secs: u64 = value
        .parse()
        .with_context(|| format!("{} expects a number of seconds, got {:?}", key, value))?;
    if secs == 0 {
        anyhow::bail!("{} must be at least 1 second", key);
    }
    Ok(secs)
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".seo-agent")
            .join("config.toml")
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, or return defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to the default location
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get a configuration value by key path (e.g., "cms.url")
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["cms", "url"] => self.cms.url.clone(),
            ["cms", "username"] => self.cms.username.clone(),
            ["cms", "app_password"] => self.cms.app_password.clone(),
            ["openai", "api_key"] => self.openai.api_key.clone(),
            ["openai", "api_base"] => Some(self.openai.api_base.clone()),
            ["openai", "model"] => Some(self.openai.model.clone()),
            ["agent", "assistant_id"] => self.agent.assistant_id.clone(),
            ["agent", "poll_interval_secs"] => Some(self.agent.poll_interval_secs.to_string()),
            ["agent", "run_timeout_secs"] => Some(self.agent.run_timeout_secs.to_string()),
            ["defaults", "keyword"] => self.defaults.keyword.clone(),
            ["defaults", "persona"] => Some(self.defaults.persona.clone()),
            ["display", "markdown_rendering"] => Some(self.display.markdown_rendering.to_string()),
            ["display", "color"] => Some(self.display.color.to_string()),
            _ => None,
        }
    }

    /// Set a configuration value by key path. Does not touch the file.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["cms", "url"] => self.cms.url = Some(value.to_string()),
            ["cms", "username"] => self.cms.username = Some(value.to_string()),
            ["cms", "app_password"] => self.cms.app_password = Some(value.to_string()),
            ["openai", "api_key"] => self.openai.api_key = Some(value.to_string()),
            ["openai", "api_base"] => self.openai.api_base = value.to_string(),
            ["openai", "model"] => self.openai.model = value.to_string(),
            ["agent", "assistant_id"] => self.agent.assistant_id = Some(value.to_string()),
            ["agent", "poll_interval_secs"] => {
                self.agent.poll_interval_secs = parse_secs(key, value)?
            }
            ["agent", "run_timeout_secs"] => self.agent.run_timeout_secs = parse_secs(key, value)?,
            ["defaults", "keyword"] => self.defaults.keyword = Some(value.to_string()),
            ["defaults", "persona"] => self.defaults.persona = value.to_string(),
            ["display", "markdown_rendering"] => {
                self.display.markdown_rendering = parse_bool(key, value)?
            }
            ["display", "color"] => self.display.color = parse_bool(key, value)?,
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }

        Ok(())
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub cms_url: Option<String>,
    pub cms_username: Option<String>,
    pub cms_app_password: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_api_base: Option<String>,
    pub assistant_id: Option<String>,
    pub keyword: Option<String>,
    pub persona: Option<String>,
}

/// Everything the session needs, resolved once at startup
#[derive(Clone)]
pub struct ResolvedSettings {
    pub cms_url: String,
    pub cms_username: String,
    pub cms_app_password: String,
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub model: String,
    pub assistant_id: Option<String>,
    pub keyword: Option<String>,
    pub persona: String,
    pub poll_interval: Duration,
    pub run_timeout: Duration,
}

impl std::fmt::Debug for ResolvedSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSettings")
            .field("cms_url", &self.cms_url)
            .field("cms_username", &self.cms_username)
            .field("cms_app_password", &"***")
            .field("openai_api_key", &"***")
            .field("openai_api_base", &self.openai_api_base)
            .field("model", &self.model)
            .field("assistant_id", &self.assistant_id)
            .field("keyword", &self.keyword)
            .field("persona", &self.persona)
            .finish()
    }
}

/// First non-blank value
fn pick(flag: Option<String>, file: Option<String>) -> Option<String> {
    flag.into_iter()
        .chain(file)
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

impl ResolvedSettings {
    /// Merge overrides over the file. Missing credentials are an error naming every missing key.
    pub fn resolve(config: &Config, overrides: Overrides) -> Result<Self> {
        let cms_url = pick(overrides.cms_url, config.cms.url.clone());
        let cms_username = pick(overrides.cms_username, config.cms.username.clone());
        let cms_app_password = pick(overrides.cms_app_password, config.cms.app_password.clone());
        let openai_api_key = pick(overrides.openai_api_key, config.openai.api_key.clone());

        let mut missing = Vec::new();
        if cms_url.is_none() {
            missing.push("cms.url (WP_URL)");
        }
        if cms_username.is_none() {
            missing.push("cms.username (WP_USERNAME)");
        }
        if cms_app_password.is_none() {
            missing.push("cms.app_password (WP_APP_PASSWORD)");
        }
        if openai_api_key.is_none() {
            missing.push("openai.api_key (OPENAI_API_KEY)");
        }

        match (cms_url, cms_username, cms_app_password, openai_api_key) {
            (Some(cms_url), Some(cms_username), Some(cms_app_password), Some(openai_api_key)) => {
                Ok(Self {
                    cms_url,
                    cms_username,
                    cms_app_password,
                    openai_api_key,
                    openai_api_base: pick(
                        overrides.openai_api_base,
                        Some(config.openai.api_base.clone()),
                    )
                    .unwrap_or_else(default_api_base),
                    model: config.openai.model.clone(),
                    assistant_id: pick(overrides.assistant_id, config.agent.assistant_id.clone()),
                    keyword: pick(overrides.keyword, config.defaults.keyword.clone()),
                    persona: pick(overrides.persona, Some(config.defaults.persona.clone()))
                        .unwrap_or_else(default_persona),
                    poll_interval: Duration::from_secs(config.agent.poll_interval_secs.max(1)),
                    run_timeout: Duration::from_secs(config.agent.run_timeout_secs.max(1)),
                })
            }
            _ => anyhow::bail!(
                "Missing required settings: {}. Set them with \
                 `seo-agent config --set key=value` or the environment.",
                missing.join(", ")
            ),
        }
    }
}
