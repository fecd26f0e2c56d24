use std::time::Duration;

use assistant_client::{AssistantError, RunStatus};
use cms_client::{CmsClientError, TermKind};

/// Errors that halt the current action
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to create {kind} '{name}': {source}")]
    TermCreationFailed {
        kind: TermKind,
        name: String,
        #[source]
        source: CmsClientError,
    },

    #[error("Featured image {url} could not be uploaded: {reason}")]
    ImageUploadFailed { url: String, reason: String },

    #[error("Publishing failed with status {status}: {body}")]
    PublishFailed { status: u16, body: String },

    #[error("Agent produced no article (run {status}): {detail}")]
    AgentNoResult { status: RunStatus, detail: String },

    #[error("Agent run timed out after {}s", .elapsed.as_secs())]
    AgentTimedOut { elapsed: Duration },

    #[error("Agent run was cancelled")]
    AgentCancelled,

    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),

    #[error(transparent)]
    Cms(#[from] CmsClientError),

    #[error(transparent)]
    Assistant(#[from] AssistantError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// A degraded enrichment step; the publish went ahead without it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    TermSkipped {
        kind: TermKind,
        name: String,
        reason: String,
    },
    ImageSkipped {
        reason: String,
    },
    TaxonomyFallback {
        reason: String,
    },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineWarning::TermSkipped { kind, name, reason } => {
                write!(f, "{} '{}' omitted: {}", kind, name, reason)
            }
            PipelineWarning::ImageSkipped { reason } => {
                write!(f, "featured image omitted: {}", reason)
            }
            PipelineWarning::TaxonomyFallback { reason } => {
                write!(f, "taxonomy suggestion degraded: {}", reason)
            }
        }
    }
}
