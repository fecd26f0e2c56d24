//! Response types for the OpenAI Assistants API (v2)

use serde::{Deserialize, Serialize};

use crate::MessageRole;

/// A conversation thread
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Thread {
    pub id: String,
}

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

impl RunStatus {
    /// Whether the run will never change state again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Cancelled
                | RunStatus::Failed
                | RunStatus::Completed
                | RunStatus::Incomplete
                | RunStatus::Expired
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Error reported by a failed run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// One execution of an assistant against a thread
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Run {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

/// Text payload of a message content block
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextContent {
    pub value: String,
}

/// A content block of a thread message
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    /// Image files, image URLs, refusals and anything newer
    #[serde(other)]
    Other,
}

/// A message stored on a thread
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// Text of the first non-empty text block
    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            MessageContent::Text { text } if !text.value.trim().is_empty() => {
                Some(text.value.as_str())
            }
            _ => None,
        })
    }
}

/// Paged list wrapper used by list endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageList {
    pub data: Vec<ThreadMessage>,
}

/// Sort order for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    Asc,
    Desc,
}

impl ListOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListOrder::Asc => "asc",
            ListOrder::Desc => "desc",
        }
    }
}
