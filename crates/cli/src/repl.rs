//! Interactive review shell
//!
//! Generate a draft, read it, then publish it once approved.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use pipeline::{CancellationToken, Draft, PipelineError};
use rustyline::{Editor, error::ReadlineError, history::DefaultHistory};

use crate::{
    output::OutputHandler,
    services::Services,
    session::{Session, SessionState},
};

const PREVIEW_FILE: &str = "seo-agent-preview.html";

/// Standalone page for the browser preview. The draft HTML is embedded as is.
fn preview_page(title: &str, body_html: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n",
            "<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n"
        ),
        html_escape::encode_text(title),
        body_html
    )
}

/// Interactive REPL for reviewing and publishing articles
pub struct SeoRepl {
    services: Services,
    session: Session,
    output: OutputHandler,
    editor: Editor<(), DefaultHistory>,
    site: String,
}

impl SeoRepl {
    pub fn new(services: Services, session: Session, output: OutputHandler) -> Result<Self> {
        let editor = Editor::new()?;
        let site = services.cms.base_url().to_string();

        Ok(Self {
            services,
            session,
            output,
            editor,
            site,
        })
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> Result<()> {
        self.output.print_banner(&self.site);
        self.output.print_inputs(&self.session.inputs);

        // Main REPL loop
        loop {
            let prompt = self.build_prompt();

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let input = line.trim();

                    if input.is_empty() {
                        continue;
                    }

                    let _ = self.editor.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_command(input).await {
                            Ok(should_exit) => {
                                if should_exit {
                                    break;
                                }
                            }
                            Err(e) => {
                                self.output.print_error(&format!("{:#}", e));
                            }
                        }
                    } else {
                        // Bare text is a new keyword
                        let keyword = input.to_string();
                        if let Err(e) = self.set_and_generate(&keyword).await {
                            self.output.print_error(&format!("{:#}", e));
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!();
                    self.output.print_info("Use /exit to quit.");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(e) => {
                    self.output.print_error(&format!("Input error: {}", e));
                    break;
                }
            }
        }

        if let Some(url) = self.session.published_url() {
            self.output.print_info(&format!("Last published post: {}", url));
        }

        Ok(())
    }

    /// Build the prompt string
    fn build_prompt(&self) -> String {
        let keyword = if self.session.inputs.keyword.is_empty() {
            "no keyword".dimmed().to_string()
        } else {
            self.session.inputs.keyword.bright_cyan().to_string()
        };

        let marker = match &self.session.state {
            SessionState::Idle => String::new(),
            SessionState::DraftReady { previewed: false, .. } => {
                format!(" {}", "draft".bright_yellow())
            }
            SessionState::DraftReady { previewed: true, .. } => {
                format!(" {}", "reviewed".bright_yellow())
            }
            SessionState::Published { .. } => format!(" {}", "published".bright_green()),
        };

        format!(
            "\n{} [{}{}] {} ",
            "seo".bright_green().bold(),
            keyword,
            marker,
            ">".bright_green()
        )
    }

    /// Handle slash commands
    async fn handle_command(&mut self, input: &str) -> Result<bool> {
        let (command, rest) = match input.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (input, ""),
        };

        match command {
            "/exit" | "/quit" | "/q" => {
                return Ok(true);
            }

            "/help" | "/h" | "/?" => {
                self.print_help();
            }

            "/set" => {
                self.handle_set(rest);
            }

            "/inputs" => {
                self.output.print_header("Inputs");
                self.output.print_inputs(&self.session.inputs);
            }

            "/generate" | "/regenerate" | "/gen" => {
                self.generate().await?;
            }

            "/show" => match self.session.mark_previewed() {
                Some(draft) => self.output.print_markdown(draft.markdown()),
                None => self.output.print_info("No draft yet. Use /generate first."),
            },

            "/html" => match self.session.draft() {
                Some(draft) => self.output.print_html(draft.html()),
                None => self.output.print_info("No draft yet. Use /generate first."),
            },

            "/preview" => {
                self.open_preview()?;
            }

            "/save" => {
                self.save_draft(rest)?;
            }

            "/publish" => {
                self.publish().await?;
            }

            "/status" => {
                self.output.print_header("Status");
                self.output.print_inputs(&self.session.inputs);
                self.output.print_state(&self.session.state);
            }

            "/clear" => {
                print!("\x1B[2J\x1B[1;1H"); // Clear screen
            }

            _ => {
                self.output.print_error(&format!(
                    "Unknown command: {}. Use /help for available commands.",
                    command
                ));
            }
        }

        Ok(false)
    }

    /// Print help information
    fn print_help(&self) {
        println!();
        println!("{}", "SEO Agent Commands".bright_white().bold());
        println!("{}", "─".repeat(50).dimmed());
        println!();

        println!("{}", "Inputs:".bright_cyan());
        println!("  {}  Set assistant, keyword or persona", "/set <field> <value>".bright_yellow());
        println!("  {}               Show current inputs", "/inputs".bright_yellow());
        println!("  {}             Set keyword and generate", "<keyword>".bright_yellow());
        println!();

        println!("{}", "Draft:".bright_cyan());
        println!(
            "  {}             Run the assistant (Ctrl-C cancels)",
            "/generate".bright_yellow()
        );
        println!("  {}                 Show the Markdown draft", "/show".bright_yellow());
        println!("  {}                 Show the rendered HTML", "/html".bright_yellow());
        println!("  {}              Open the HTML in a browser", "/preview".bright_yellow());
        println!("  {}          Write the Markdown to a file", "/save <path>".bright_yellow());
        println!();

        println!("{}", "Publishing:".bright_cyan());
        println!("  {}              Publish the reviewed draft", "/publish".bright_yellow());
        println!();

        println!("{}", "Other Commands:".bright_cyan());
        println!("  {}               Show inputs and draft state", "/status".bright_yellow());
        println!("  {}                Clear screen", "/clear".bright_yellow());
        println!("  {}                 Show this help", "/help".bright_yellow());
        println!("  {}                 Exit", "/exit".bright_yellow());
        println!();
    }

    fn handle_set(&mut self, args: &str) {
        let Some((field, value)) = args.split_once(char::is_whitespace) else {
            self.output.print_error("Usage: /set <assistant|keyword|persona> <value>");
            return;
        };

        match self.session.set_input(field, value) {
            Ok(()) => self.output.print_success(&format!("{} = {}", field, value.trim())),
            Err(e) => self.output.print_error(&e.to_string()),
        }
    }

    async fn set_and_generate(&mut self, keyword: &str) -> Result<()> {
        self.session.set_input("keyword", keyword)?;
        self.generate().await
    }

    /// Run the assistant for the current inputs; Ctrl-C cancels the run
    async fn generate(&mut self) -> Result<()> {
        if let Err(e) = self.session.ready_to_generate() {
            self.output.print_warning(&e.to_string());
            return Ok(());
        }

        let inputs = self.session.inputs.clone();
        let token = CancellationToken::new();
        let spinner = self.output.start_spinner(&format!(
            "Generating article for '{}' (Ctrl-C to cancel)",
            inputs.keyword
        ));

        let run = self
            .services
            .runner
            .run(&inputs.assistant_id, &inputs.keyword, &inputs.persona, &token);
        tokio::pin!(run);

        // First Ctrl-C cancels the remote run; a second one stops waiting for that
        let result = tokio::select! {
            result = &mut run => result,
            _ = tokio::signal::ctrl_c() => {
                token.cancel();
                tokio::select! {
                    result = &mut run => result,
                    _ = tokio::signal::ctrl_c() => Err(PipelineError::AgentCancelled),
                }
            }
        };
        spinner.stop();

        match result {
            Ok(markdown) => {
                let draft = Draft::from_markdown(markdown);
                if draft.is_empty() {
                    self.output.print_warning("The assistant returned an empty article.");
                    return Ok(());
                }

                self.session.draft_generated(draft);
                self.output.print_success("Draft ready");
                if let Some(draft) = self.session.mark_previewed() {
                    self.output.print_markdown(draft.markdown());
                }
                self.output.print_info("Use /publish to post it, or /generate for another take.");
            }
            Err(PipelineError::AgentCancelled) => {
                self.output.print_warning("Generation cancelled.");
            }
            Err(e) => {
                self.output.print_error(&e.to_string());
            }
        }

        Ok(())
    }

    fn open_preview(&self) -> Result<()> {
        let Some(draft) = self.session.draft() else {
            self.output.print_info("No draft yet. Use /generate first.");
            return Ok(());
        };

        let path = std::env::temp_dir().join(PREVIEW_FILE);
        let title = self.session.title().unwrap_or_default();
        let page = preview_page(&title, draft.html());
        std::fs::write(&path, page)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        match open::that(&path) {
            Ok(()) => self.output.print_success(&format!("Opened {}", path.display())),
            Err(e) => self.output.print_warning(&format!(
                "Could not open a browser ({}). Preview written to {}",
                e,
                path.display()
            )),
        }
        Ok(())
    }

    fn save_draft(&self, path: &str) -> Result<()> {
        if path.is_empty() {
            self.output.print_error("Usage: /save <path>");
            return Ok(());
        }
        let Some(draft) = self.session.draft() else {
            self.output.print_info("No draft yet. Use /generate first.");
            return Ok(());
        };

        let path = PathBuf::from(path);
        std::fs::write(&path, draft.markdown())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.output.print_success(&format!("Saved draft to {}", path.display()));
        Ok(())
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        match self.editor.readline(&format!("{} [y/N] ", question)) {
            Ok(answer) => Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn publish(&mut self) -> Result<()> {
        let draft = match self.session.ready_to_publish() {
            Ok(draft) => draft.clone(),
            Err(e) => {
                self.output.print_warning(&e.to_string());
                return Ok(());
            }
        };
        let title = draft.title_or(&self.session.inputs.keyword);

        if !self.confirm(&format!("Publish \"{}\" to {}?", title, self.site))? {
            self.output.print_info("Publishing skipped.");
            return Ok(());
        }

        let spinner = self.output.start_spinner("Publishing (Ctrl-C to abort)");
        let result = tokio::select! {
            result = self.services.publisher.publish_article(&title, &draft) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };
        spinner.stop();

        let Some(result) = result else {
            self.output.print_warning(
                "Publishing aborted. Terms or media may already exist on the site; \
                 check it before publishing again.",
            );
            return Ok(());
        };

        match result {
            Ok(outcome) => {
                self.output.print_outcome(&outcome);
                self.session.published(outcome.url);
            }
            Err(e) => {
                self.output.print_error(&e.to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_page_escapes_title_only() {
        let page = preview_page("<b>Tips & \"Tricks\"</b>", "<h1>Tips</h1>");

        assert!(page.contains("<title>&lt;b&gt;Tips &amp; \"Tricks\"&lt;/b&gt;</title>"));
        assert!(page.contains("<body>\n<h1>Tips</h1>\n</body>"));
        assert!(!page.contains("<b>"));
    }
}
