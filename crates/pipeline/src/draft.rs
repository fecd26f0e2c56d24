//! Draft rendering: Markdown from the agent, HTML for preview and publishing

use pulldown_cmark::{Options, Parser, html};
use scraper::{Html, Selector};

/// Unpublished article in both source and rendered form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    markdown: String,
    html: String,
}

impl Draft {
    /// Render `markdown` and keep both forms
    pub fn from_markdown(markdown: impl Into<String>) -> Self {
        let markdown = markdown.into();
        let html = render_markdown(&markdown);
        Self { markdown, html }
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn is_empty(&self) -> bool {
        self.markdown.trim().is_empty()
    }

    /// Text of the first top-level heading, if any
    pub fn title(&self) -> Option<String> {
        extract_title(&self.html)
    }

    /// Heading text, or `fallback` (usually the keyword) when the draft has none
    pub fn title_or(&self, fallback: &str) -> String {
        self.title().unwrap_or_else(|| fallback.to_string())
    }
}

/// Markdown to HTML with the GitHub-style extensions agents tend to emit
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Concatenated text of the first `<h1>` in `html`
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("h1").ok()?;

    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    if title.is_empty() { None } else { Some(title) }
}
