//! Type definitions for WordPress REST API requests and responses
//!
//! Only the fields the publish pipeline reads are modelled; WordPress returns
//! many more and serde ignores them.

use scraper::Html;
use serde::{Deserialize, Serialize};

/// Taxonomy a term belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    Category,
    Tag,
}

impl TermKind {
    /// REST collection name under `/wp-json/wp/v2/`
    pub fn collection(&self) -> &'static str {
        match self {
            TermKind::Category => "categories",
            TermKind::Tag => "tags",
        }
    }
}

impl std::fmt::Display for TermKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TermKind::Category => write!(f, "category"),
            TermKind::Tag => write!(f, "tag"),
        }
    }
}

/// A category or tag as stored on the CMS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: u64,
    pub name: String,
    pub kind: TermKind,
}

/// Raw term record as returned by `GET/POST /{categories|tags}`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TermRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

impl TermRecord {
    pub(crate) fn into_term(self, kind: TermKind) -> Term {
        Term {
            id: self.id,
            // WordPress escapes term names on output ("Tips &amp; Tricks")
            name: decode_html_entities(&self.name),
            kind,
        }
    }
}

/// Body of a term creation request
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateTermRequest<'a> {
    pub name: &'a str,
}

/// An uploaded media attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: u64,
    #[serde(default)]
    pub source_url: String,
}

/// Post creation payload for `POST /posts`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishRequest {
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub categories: Vec<u64>,
    pub tags: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<u64>,
}

/// Post visibility on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Publish,
}

/// Response of a successful post creation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreatedPost {
    pub id: u64,
    #[serde(default)]
    pub link: String,
}

/// Authenticated user returned by `GET /users/me`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CmsUser {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// Decode the HTML entities WordPress emits in rendered term names.
///
/// The name is parsed as an HTML fragment so every named and numeric
/// reference is resolved; text that is not a valid reference is kept.
pub fn decode_html_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let fragment = Html::parse_fragment(input);
    fragment.root_element().text().collect()
}
