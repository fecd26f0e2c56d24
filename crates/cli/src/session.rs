//! Review session state
//!
//! One article at a time moves Idle -> DraftReady -> Published. Publishing is
//! only allowed once the current draft has been shown to the operator.

use pipeline::Draft;

/// The three operator inputs of a generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleInputs {
    pub assistant_id: String,
    pub keyword: String,
    pub persona: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    DraftReady { draft: Draft, previewed: bool },
    Published { draft: Draft, url: String },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("{} required. Use /set <field> <value>", .0.join(" and "))]
    MissingInputs(Vec<&'static str>),

    #[error("Unknown field '{0}'. Use assistant, keyword or persona")]
    UnknownField(String),

    #[error("No draft yet. Use /generate first")]
    NoDraft,

    #[error("Review the draft with /show before publishing")]
    NotPreviewed,

    #[error("This draft is already published at {0}. Use /generate for a new one")]
    AlreadyPublished(String),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub inputs: ArticleInputs,
    pub state: SessionState,
}

impl Session {
    pub fn new(inputs: ArticleInputs) -> Self {
        Self {
            inputs,
            state: SessionState::Idle,
        }
    }

    /// Update one input by its short name
    pub fn set_input(&mut self, field: &str, value: &str) -> Result<(), SessionError> {
        let value = value.trim().to_string();
        match field {
            "assistant" | "assistant_id" => self.inputs.assistant_id = value,
            "keyword" => self.inputs.keyword = value,
            "persona" => self.inputs.persona = value,
            other => return Err(SessionError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    /// Generation needs an assistant and a keyword; the persona may be blank
    pub fn ready_to_generate(&self) -> Result<(), SessionError> {
        let mut missing = Vec::new();
        if self.inputs.assistant_id.trim().is_empty() {
            missing.push("Assistant ID");
        }
        if self.inputs.keyword.trim().is_empty() {
            missing.push("Keyword");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SessionError::MissingInputs(missing))
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::DraftReady { draft, .. } | SessionState::Published { draft, .. } => {
                Some(draft)
            }
        }
    }

    pub fn published_url(&self) -> Option<&str> {
        match &self.state {
            SessionState::Published { url, .. } => Some(url),
            _ => None,
        }
    }

    /// A new draft replaces whatever was there, including a published one
    pub fn draft_generated(&mut self, draft: Draft) {
        self.state = SessionState::DraftReady {
            draft,
            previewed: false,
        };
    }

    /// Record that the draft was shown, returning it for display
    pub fn mark_previewed(&mut self) -> Option<&Draft> {
        if let SessionState::DraftReady { previewed, .. } = &mut self.state {
            *previewed = true;
        }
        self.draft()
    }

    /// The draft to publish, if the session allows publishing now
    pub fn ready_to_publish(&self) -> Result<&Draft, SessionError> {
        match &self.state {
            SessionState::Idle => Err(SessionError::NoDraft),
            SessionState::DraftReady {
                previewed: false, ..
            } => Err(SessionError::NotPreviewed),
            SessionState::DraftReady { draft, .. } => Ok(draft),
            SessionState::Published { url, .. } => Err(SessionError::AlreadyPublished(url.clone())),
        }
    }

    pub fn published(&mut self, url: String) {
        let state = std::mem::replace(&mut self.state, SessionState::Idle);
        self.state = match state {
            SessionState::DraftReady { draft, .. } | SessionState::Published { draft, .. } => {
                SessionState::Published { draft, url }
            }
            SessionState::Idle => SessionState::Idle,
        };
    }

    /// Title the post would get: the draft heading, else the keyword
    pub fn title(&self) -> Option<String> {
        self.draft().map(|d| d.title_or(&self.inputs.keyword))
    }
}
