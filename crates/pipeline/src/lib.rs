//! # Pipeline
//!
//! Turns a keyword into a published post: an assistant run drafts the article,
//! the operator reviews it, and the publisher pushes it to WordPress with a
//! resolved category, tags and a featured image.

pub mod agent_runner;
pub mod draft;
pub mod error;
pub mod featured_image;
pub mod publisher;
pub mod taxonomy;
pub mod terms;

#[cfg(test)]
mod pipeline_tests;
#[cfg(test)]
mod test_support;

pub use agent_runner::{AgentRunner, RUN_INSTRUCTIONS, RunnerConfig, user_prompt};
pub use draft::{Draft, extract_title, render_markdown};
pub use error::{PipelineError, PipelineWarning, Result};
pub use featured_image::{FeaturedImageExtractor, first_image_src};
pub use publisher::{PublishOutcome, Publisher};
pub use taxonomy::{
    DEFAULT_CATEGORY, MAX_TAGS, TaxonomyOutcome, TaxonomySuggester, TaxonomySuggestion,
    parse_string_list, parse_suggestion,
};
pub use terms::TermResolver;

pub use tokio_util::sync::CancellationToken;
