//! CLI subcommand handlers
//!
//! Handles the non-interactive commands: config and check.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::{config::Config, output::OutputHandler, services::Services};

fn masked(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => "\"***\"".to_string(),
        _ => "not set".dimmed().to_string(),
    }
}

fn quoted(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("\"{}\"", v),
        None => "not set".dimmed().to_string(),
    }
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    let output = OutputHandler::new(false);

    output.print_header("Configuration");

    println!();
    println!("  {}", "[cms]".bright_cyan());
    println!("    {} = {}", "url".dimmed(), quoted(config.cms.url.as_deref()));
    println!("    {} = {}", "username".dimmed(), quoted(config.cms.username.as_deref()));
    println!(
        "    {} = {}",
        "app_password".dimmed(),
        masked(config.cms.app_password.as_deref())
    );

    println!();
    println!("  {}", "[openai]".bright_cyan());
    println!("    {} = {}", "api_key".dimmed(), masked(config.openai.api_key.as_deref()));
    println!("    {} = \"{}\"", "api_base".dimmed(), config.openai.api_base);
    println!("    {} = \"{}\"", "model".dimmed(), config.openai.model);

    println!();
    println!("  {}", "[agent]".bright_cyan());
    println!(
        "    {} = {}",
        "assistant_id".dimmed(),
        quoted(config.agent.assistant_id.as_deref())
    );
    println!("    {} = {}", "poll_interval_secs".dimmed(), config.agent.poll_interval_secs);
    println!("    {} = {}", "run_timeout_secs".dimmed(), config.agent.run_timeout_secs);

    println!();
    println!("  {}", "[defaults]".bright_cyan());
    println!("    {} = {}", "keyword".dimmed(), quoted(config.defaults.keyword.as_deref()));
    println!("    {} = \"{}\"", "persona".dimmed(), config.defaults.persona);

    println!();
    println!("  {}", "[display]".bright_cyan());
    println!(
        "    {} = {}",
        "markdown_rendering".dimmed(),
        config.display.markdown_rendering
    );
    println!("    {} = {}", "color".dimmed(), config.display.color);

    println!();
    println!(
        "  {} {}",
        "Config file:".dimmed(),
        Config::config_path().display()
    );

    Ok(())
}

fn is_secret(key: &str) -> bool {
    key.ends_with("password") || key.ends_with("api_key")
}

/// Value of `key` as shown to the operator; secrets are masked
fn displayed_value(config: &Config, key: &str) -> Option<String> {
    let value = config.get(key)?;
    Some(if is_secret(key) { "***".to_string() } else { value })
}

/// Print a single configuration value
pub fn get_config(config: &Config, key: &str) -> Result<()> {
    let output = OutputHandler::new(false);

    match displayed_value(config, key.trim()) {
        Some(value) => println!("{}", value),
        None => output.print_error(&format!("{} is unknown or not set", key.trim())),
    }

    Ok(())
}

/// Split `key=value`, trimming whitespace and surrounding quotes from the value
fn parse_assignment(kv: &str) -> Option<(&str, &str)> {
    let (key, value) = kv.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim().trim_matches('"')))
}

/// Set a configuration value in the file at `path`
pub fn set_config(kv: &str, path: &Path) -> Result<()> {
    let output = OutputHandler::new(false);

    let Some((key, value)) = parse_assignment(kv) else {
        output.print_error("Invalid format. Use: key=value");
        return Ok(());
    };

    let mut config = Config::load_from(path)?;
    match config.set(key, value) {
        Ok(()) => {
            config.save_to(path)?;
            let shown = if is_secret(key) { "***" } else { value };
            output.print_success(&format!("Set {} = \"{}\"", key, shown));
        }
        Err(e) => {
            output.print_error(&format!("Failed to set config: {}", e));
        }
    }

    Ok(())
}

/// Verify the CMS credentials by asking who they belong to
pub async fn check(services: &Services) -> Result<()> {
    let output = OutputHandler::new(false);

    output.print_header("Connection Check");

    let user = services
        .cms
        .current_user()
        .await
        .with_context(|| format!("CMS check against {} failed", services.cms.base_url()))?;

    output.print_success(&format!(
        "Authenticated as {} (id {}) on {}",
        if user.name.is_empty() { &user.slug } else { &user.name },
        user.id,
        services.cms.base_url()
    ));

    Ok(())
}
