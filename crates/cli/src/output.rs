//! Output formatting and terminal rendering
//!
//! Handles colored status lines, the draft preview and the run spinner.

use std::{
    io::Write,
    time::{Duration, Instant},
};

use colored::Colorize;
use pipeline::{PipelineWarning, PublishOutcome};
use tokio::task::JoinHandle;

use crate::session::{ArticleInputs, SessionState};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Output handler for terminal display
pub struct OutputHandler {
    pub markdown_enabled: bool,
}

/// A status line redrawn in place until stopped
pub struct Spinner {
    handle: JoinHandle<()>,
}

impl Spinner {
    pub fn stop(self) {
        self.handle.abort();
        print!("\r\x1B[2K");
        let _ = std::io::stdout().flush();
    }
}

impl OutputHandler {
    pub fn new(markdown_enabled: bool) -> Self {
        Self { markdown_enabled }
    }

    /// Print the welcome banner
    pub fn print_banner(&self, site: &str) {
        println!();
        println!(
            "{}",
            "╔═══════════════════════════════════════════════════════════════╗".bright_cyan()
        );
        println!(
            "{}",
            "║             SEO Article Agent                                 ║".bright_cyan()
        );
        println!(
            "{}",
            "╚═══════════════════════════════════════════════════════════════╝".bright_cyan()
        );
        println!("  {} {}", "Site:".dimmed(), site.bright_white());
        println!(
            "  {}",
            "Type a keyword to generate an article, or /help for commands".dimmed()
        );
        println!();
    }

    /// Print a section header
    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", format!("▶ {}", text).bright_yellow().bold());
        println!("{}", "─".repeat(60).dimmed());
    }

    /// Print a success message
    pub fn print_success(&self, text: &str) {
        println!("{} {}", "✓".bright_green(), text.bright_white());
    }

    /// Print an error message
    pub fn print_error(&self, text: &str) {
        println!("{} {}", "✗".bright_red(), text.bright_red());
    }

    /// Print a warning message
    pub fn print_warning(&self, text: &str) {
        println!("{} {}", "⚠".bright_yellow(), text.yellow());
    }

    /// Print an info message
    pub fn print_info(&self, text: &str) {
        println!("{} {}", "ℹ".bright_blue(), text);
    }

    pub fn print_warnings(&self, warnings: &[PipelineWarning]) {
        for warning in warnings {
            self.print_warning(&warning.to_string());
        }
    }

    /// Show `message` with an animated frame and elapsed seconds until stopped
    pub fn start_spinner(&self, message: &str) -> Spinner {
        let message = message.to_string();
        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = tokio::time::interval(Duration::from_millis(120));
            for frame in SPINNER_FRAMES.iter().cycle() {
                ticker.tick().await;
                print!(
                    "\r{} {} {}",
                    frame.bright_cyan(),
                    message,
                    format!("{}s", started.elapsed().as_secs()).dimmed()
                );
                let _ = std::io::stdout().flush();
            }
        });
        Spinner { handle }
    }

    pub fn print_inputs(&self, inputs: &ArticleInputs) {
        let show = |value: &str| {
            if value.is_empty() {
                "not set".dimmed().to_string()
            } else {
                value.bright_white().to_string()
            }
        };

        println!("  {} {}", "Assistant:".dimmed(), show(&inputs.assistant_id));
        println!("  {} {}", "Keyword:  ".dimmed(), show(&inputs.keyword));
        println!("  {} {}", "Persona:  ".dimmed(), show(&inputs.persona));
    }

    pub fn print_state(&self, state: &SessionState) {
        let text = match state {
            SessionState::Idle => "no draft".dimmed().to_string(),
            SessionState::DraftReady { draft, previewed } => format!(
                "draft ready ({} chars, {})",
                draft.markdown().chars().count(),
                if *previewed { "reviewed" } else { "not reviewed" }
            )
            .bright_yellow()
            .to_string(),
            SessionState::Published { url, .. } => {
                format!("published at {}", url).bright_green().to_string()
            }
        };
        println!("  {} {}", "Draft:    ".dimmed(), text);
    }

    /// Print the draft Markdown (with optional terminal styling)
    pub fn print_markdown(&self, content: &str) {
        println!();

        if self.markdown_enabled {
            let mut in_code = false;
            for line in content.lines() {
                if line.trim_start().starts_with("```") {
                    in_code = !in_code;
                    println!("{}", line.dimmed());
                } else if in_code {
                    println!("  {}", line.bright_green());
                } else {
                    println!("{}", self.render_markdown_line(line));
                }
            }
        } else {
            println!("{}", content);
        }
        println!();
    }

    pub fn print_html(&self, html: &str) {
        println!();
        for line in html.lines() {
            println!("{}", line.dimmed());
        }
        println!();
    }

    pub fn print_outcome(&self, outcome: &PublishOutcome) {
        self.print_warnings(&outcome.warnings);
        self.print_success(&format!("Published post #{}", outcome.post_id));
        println!(
            "  {} {}",
            "Category:".dimmed(),
            outcome
                .category_id
                .map(|id| format!("#{}", id))
                .unwrap_or_else(|| "none".to_string())
        );
        if !outcome.tag_ids.is_empty() {
            let tags: Vec<String> = outcome.tag_ids.iter().map(|id| format!("#{}", id)).collect();
            println!("  {} {}", "Tags:    ".dimmed(), tags.join(", "));
        }
        if let Some(media) = outcome.featured_media {
            println!("  {} #{}", "Image:   ".dimmed(), media);
        }
        println!("  {} {}", "Link:    ".dimmed(), outcome.url.bright_cyan().underline());
    }

    // ============ Helper Methods ============

    fn render_markdown_line(&self, line: &str) -> String {
        // Headers
        if let Some(text) = line.strip_prefix("### ") {
            return format!("{}", text.bright_yellow().bold());
        }
        if let Some(text) = line.strip_prefix("## ") {
            return format!("{}", text.bright_cyan().bold());
        }
        if let Some(text) = line.strip_prefix("# ") {
            return format!("{}", text.bright_white().bold().underline());
        }

        // Lists
        let (prefix, body) = match line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            Some(rest) => (format!("  {} ", "•".bright_cyan()), rest),
            None => (String::new(), line),
        };

        // Inline code
        let mut result = body.to_string();
        while let Some(start) = result.find('`') {
            if let Some(end) = result[start + 1..].find('`') {
                let code = &result[start + 1..start + 1 + end];
                result = format!(
                    "{}{}{}",
                    &result[..start],
                    code.bright_green(),
                    &result[start + 2 + end..]
                );
            } else {
                break;
            }
        }

        // Bold
        while let Some(start) = result.find("**") {
            if let Some(end) = result[start + 2..].find("**") {
                let bold_text = &result[start + 2..start + 2 + end];
                result = format!(
                    "{}{}{}",
                    &result[..start],
                    bold_text.bold(),
                    &result[start + 4 + end..]
                );
            } else {
                break;
            }
        }

        format!("{}{}", prefix, result)
    }
}
