//! Category/tag suggestion for a finished article

use std::{iter::Peekable, str::Chars, sync::Arc};

use assistant_client::{ChatConfig, ChatRequest, CompletionProvider};
use tracing::{debug, warn};

use crate::error::PipelineWarning;

pub const DEFAULT_CATEGORY: &str = "General";
pub const MAX_TAGS: usize = 3;

const CATEGORY_LABELS: &[&str] = &["category", "カテゴリー", "カテゴリ"];
const TAG_LABELS: &[&str] = &["tags", "tag", "タグ"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomySuggestion {
    pub category: String,
    pub tags: Vec<String>,
}

impl Default for TaxonomySuggestion {
    fn default() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            tags: Vec::new(),
        }
    }
}

/// A suggestion together with whatever went wrong producing it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyOutcome {
    pub suggestion: TaxonomySuggestion,
    pub warnings: Vec<PipelineWarning>,
}

pub fn build_prompt(article: &str) -> String {
    format!(
        "Suggest WordPress taxonomy for the following Markdown article: exactly one category \
         and at most {max} tags. Keep them generic enough for a general-purpose blog and write \
         them in the same language as the article.\n\n\
         Article:\n{article}\n\n\
         Answer with exactly two lines in this format:\n\
         Category: <category name>\n\
         Tags: [\"tag1\", \"tag2\", \"tag3\"]\n",
        max = MAX_TAGS,
        article = article,
    )
}

/// If `line` starts with one of `labels` followed by a colon, the text after it.
///
/// Labels are case-insensitive and may be wrapped in Markdown bold, so both
/// `**Category:** x` and `**Category**: x` match.
fn labelled_value<'a>(line: &'a str, labels: &[&str]) -> Option<&'a str> {
    let rest = line.strip_prefix("**").unwrap_or(line);

    for label in labels {
        let Some(head) = rest.get(..label.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(label) {
            continue;
        }

        let after = &rest[label.len()..];
        let after = after.strip_prefix("**").unwrap_or(after);
        let Some(value) = after
            .strip_prefix(':')
            .or_else(|| after.strip_prefix('：'))
        else {
            continue;
        };
        let value = value.strip_prefix("**").unwrap_or(value);
        return Some(value.trim());
    }
    None
}

/// Parse completion text into a suggestion. Never fails; problems become warnings.
pub fn parse_suggestion(text: &str) -> TaxonomyOutcome {
    let mut category: Option<String> = None;
    let mut tags: Option<Vec<String>> = None;
    let mut warnings = Vec::new();

    for line in text.lines().map(str::trim) {
        if let Some(value) = labelled_value(line, CATEGORY_LABELS) {
            if !value.is_empty() {
                category = Some(value.to_string());
            }
        } else if let Some(value) = labelled_value(line, TAG_LABELS) {
            match parse_string_list(value) {
                Some(list) => tags = Some(list),
                None => {
                    warnings.push(PipelineWarning::TaxonomyFallback {
                        reason: format!("unparseable tag list {:?}", value),
                    });
                    tags = Some(Vec::new());
                }
            }
        }
    }

    if category.is_none() {
        warnings.push(PipelineWarning::TaxonomyFallback {
            reason: format!("no category suggested, using '{}'", DEFAULT_CATEGORY),
        });
    }

    TaxonomyOutcome {
        suggestion: TaxonomySuggestion {
            category: category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            tags: tags.unwrap_or_default(),
        },
        warnings,
    }
}

/// Strict parser for a list of quoted string literals such as `["a", 'b',]`.
///
/// Returns `None` for anything that is not exactly such a list. Empty strings
/// are dropped, duplicates keep their first occurrence and at most
/// [`MAX_TAGS`] items are returned.
pub fn parse_string_list(input: &str) -> Option<Vec<String>> {
    let mut chars = input.trim().chars().peekable();
    let mut items: Vec<String> = Vec::new();

    if chars.next()? != '[' {
        return None;
    }

    loop {
        skip_whitespace(&mut chars);
        match chars.next()? {
            ']' => break,
            quote @ ('"' | '\'') => {
                let item = parse_quoted(&mut chars, quote)?;
                if !item.is_empty() && !items.contains(&item) {
                    items.push(item);
                }

                skip_whitespace(&mut chars);
                match chars.next()? {
                    ',' => {}
                    ']' => break,
                    _ => return None,
                }
            }
            _ => return None,
        }
    }

    // Nothing may follow the closing bracket
    if chars.any(|c| !c.is_whitespace()) {
        return None;
    }

    items.truncate(MAX_TAGS);
    Some(items)
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn parse_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> Option<String> {
    let mut out = String::new();
    loop {
        match chars.next()? {
            '\\' => match chars.next()? {
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                '\'' => out.push('\''),
                'n' => out.push('\n'),
                't' => out.push('\t'),
                _ => return None,
            },
            c if c == quote => return Some(out.trim().to_string()),
            c => out.push(c),
        }
    }
}

/// Asks a completion model for a category and tags
#[derive(Clone)]
pub struct TaxonomySuggester {
    provider: Arc<dyn CompletionProvider>,
    config: ChatConfig,
}

impl TaxonomySuggester {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: ChatConfig) -> Self {
        Self { provider, config }
    }

    /// Never fails: an unavailable model yields the default suggestion plus a warning
    pub async fn suggest(&self, article: &str) -> TaxonomyOutcome {
        let request = ChatRequest::user(build_prompt(article), self.config.clone());

        match self.provider.complete(request).await {
            Ok(text) => {
                debug!("{} suggested taxonomy: {:?}", self.provider.name(), text);
                let outcome = parse_suggestion(&text);
                for warning in &outcome.warnings {
                    warn!("{}", warning);
                }
                outcome
            }
            Err(e) => {
                warn!("Taxonomy suggestion failed: {}", e);
                TaxonomyOutcome {
                    suggestion: TaxonomySuggestion::default(),
                    warnings: vec![PipelineWarning::TaxonomyFallback {
                        reason: e.to_string(),
                    }],
                }
            }
        }
    }
}

impl std::fmt::Debug for TaxonomySuggester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxonomySuggester")
            .field("provider", &self.provider.name())
            .field("model", &self.config.model)
            .finish()
    }
}
