//! SEO Agent - keyword to published WordPress post
//!
//! Drives an OpenAI assistant to draft an SEO article, lets the operator review
//! it in the terminal, and publishes it with taxonomy and a featured image.

mod commands;
mod config;
mod output;
mod repl;
mod services;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::{Config, Overrides, ResolvedSettings},
    output::OutputHandler,
    services::Services,
    session::{ArticleInputs, Session},
};

/// SEO Agent - AI-drafted articles published to WordPress
#[derive(Parser)]
#[command(name = "seo-agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate SEO articles with an OpenAI assistant and publish them to WordPress")]
#[command(long_about = r#"
Generate SEO articles with an OpenAI assistant, review them in the terminal and
publish them to WordPress with an automatic category, tags and featured image.

Examples:
  seo-agent                                   # Start an interactive session
  seo-agent --keyword "solo programming"      # Start with a keyword preset
  seo-agent config --set cms.url=https://example.com
  seo-agent config --get agent.run_timeout_secs
  seo-agent check                             # Verify WordPress credentials
"#)]
struct Cli {
    /// WordPress site URL
    #[arg(long, env = "WP_URL")]
    cms_url: Option<String>,

    /// WordPress user name
    #[arg(long, env = "WP_USERNAME")]
    cms_username: Option<String>,

    /// WordPress application password
    #[arg(long, env = "WP_APP_PASSWORD", hide_env_values = true)]
    cms_app_password: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    openai_api_base: Option<String>,

    /// Assistant ID to run
    #[arg(short, long, env = "SEO_ASSISTANT_ID")]
    assistant: Option<String>,

    /// Initial keyword
    #[arg(short, long)]
    keyword: Option<String>,

    /// Target reader persona
    #[arg(short, long)]
    persona: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            cms_url: self.cms_url.clone(),
            cms_username: self.cms_username.clone(),
            cms_app_password: self.cms_app_password.clone(),
            openai_api_key: self.openai_api_key.clone(),
            openai_api_base: self.openai_api_base.clone(),
            assistant_id: self.assistant.clone(),
            keyword: self.keyword.clone(),
            persona: self.persona.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set a configuration value (key=value)
        #[arg(long)]
        set: Option<String>,

        /// Print a single configuration value (e.g. agent.run_timeout_secs)
        #[arg(long)]
        get: Option<String>,
    },

    /// Verify WordPress credentials
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env values become environment variables before clap reads them
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("seo_cli={0},seo_agent={0},pipeline={0},warn", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config = Config::load()?;
    if !config.display.color {
        colored::control::set_override(false);
    }

    match cli.command {
        Some(Commands::Config { show, set, get }) => {
            if show {
                commands::show_config(&config)?;
            } else if let Some(kv) = set {
                commands::set_config(&kv, &Config::config_path())?;
            } else if let Some(key) = get {
                commands::get_config(&config, &key)?;
            } else {
                commands::show_config(&config)?;
            }
        }
        Some(Commands::Check) => {
            let settings = ResolvedSettings::resolve(&config, cli.overrides())?;
            let services = Services::from_settings(&settings)?;
            commands::check(&services).await?;
        }
        None => {
            let settings = ResolvedSettings::resolve(&config, cli.overrides())?;
            tracing::debug!("Resolved settings: {:?}", settings);
            let services = Services::from_settings(&settings)?;

            let session = Session::new(ArticleInputs {
                assistant_id: settings.assistant_id.clone().unwrap_or_default(),
                keyword: settings.keyword.clone().unwrap_or_default(),
                persona: settings.persona.clone(),
            });

            // Start interactive REPL
            let mut repl = repl::SeoRepl::new(
                services,
                session,
                OutputHandler::new(config.display.markdown_rendering),
            )?;
            repl.run().await?;
        }
    }

    Ok(())
}
