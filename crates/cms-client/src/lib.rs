//! CMS Client - typed HTTP client for the WordPress REST API
//!
//! Wraps the handful of `wp/v2` endpoints the publish pipeline needs:
//! - **Terms**: search and create categories/tags
//! - **Media**: upload a raw image as an attachment
//! - **Posts**: create a post
//! - **Users**: resolve the authenticated user (credential check)
//!
//! Every request is authenticated with HTTP Basic auth using a WordPress
//! application password.
//!
//! ```text
//! pipeline  -->  CmsClient  -->  https://example.com/wp-json/wp/v2/...
//! ```

mod types;

pub use types::*;

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

/// Username and application password used for HTTP Basic auth
#[derive(Clone)]
pub struct CmsCredentials {
    pub username: String,
    pub app_password: String,
}

impl CmsCredentials {
    pub fn new(username: impl Into<String>, app_password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            app_password: app_password.into(),
        }
    }
}

impl std::fmt::Debug for CmsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsCredentials")
            .field("username", &self.username)
            .field("app_password", &"***")
            .finish()
    }
}

/// Error types for CMS client operations
#[derive(Debug, thiserror::Error)]
pub enum CmsClientError {
    #[error("CMS not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        source: reqwest::Error,
    },

    #[error("CMS returned error {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Failed to parse CMS response: {0}")]
    ParseError(String),

    #[error("Invalid CMS client configuration: {0}")]
    Config(String),
}

impl CmsClientError {
    /// HTTP status of an API error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            CmsClientError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Client for a WordPress-compatible CMS
#[derive(Debug, Clone)]
pub struct CmsClient {
    base_url: String,
    credentials: CmsCredentials,
    client: reqwest::Client,
}

impl CmsClient {
    /// Create a client for the site at `base_url` (e.g. `https://example.com`)
    pub fn new(base_url: &str, credentials: CmsCredentials) -> Result<Self, CmsClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CmsClientError::Config(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/wp-json/wp/v2/{}", self.base_url, path)
    }

    fn not_reachable(&self, source: reqwest::Error) -> CmsClientError {
        CmsClientError::NotReachable {
            url: self.base_url.clone(),
            source,
        }
    }

    /// Consume a response that must carry `expected`, returning its JSON body.
    async fn expect_json<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
        expected: StatusCode,
    ) -> Result<T, CmsClientError> {
        let status = resp.status();
        if status != expected {
            let body = resp.text().await.unwrap_or_default();
            return Err(CmsClientError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map_err(|e| CmsClientError::ParseError(e.to_string()))
    }

    // ============= Term Endpoints =============

    /// Search terms of `kind` whose name or slug matches `search`
    pub async fn search_terms(
        &self,
        kind: TermKind,
        search: &str,
    ) -> Result<Vec<Term>, CmsClientError> {
        let url = self.endpoint(kind.collection());
        debug!("Searching {} for {:?}", kind.collection(), search);

        let resp = self
            .client
            .get(&url)
            .query(&[("search", search), ("per_page", "100")])
            .basic_auth(&self.credentials.username, Some(&self.credentials.app_password))
            .send()
            .await
            .map_err(|e| self.not_reachable(e))?;

        let records: Vec<TermRecord> = Self::expect_json(resp, StatusCode::OK).await?;
        Ok(records.into_iter().map(|r| r.into_term(kind)).collect())
    }

    /// Create a new term of `kind`
    pub async fn create_term(&self, kind: TermKind, name: &str) -> Result<Term, CmsClientError> {
        let url = self.endpoint(kind.collection());
        debug!("Creating {} {:?}", kind, name);

        let resp = self
            .client
            .post(&url)
            .json(&CreateTermRequest { name })
            .basic_auth(&self.credentials.username, Some(&self.credentials.app_password))
            .send()
            .await
            .map_err(|e| self.not_reachable(e))?;

        let record: TermRecord = Self::expect_json(resp, StatusCode::CREATED).await?;
        Ok(record.into_term(kind))
    }

    // ============= Media Endpoints =============

    /// Upload raw bytes as a media attachment
    pub async fn upload_media(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<MediaAsset, CmsClientError> {
        let url = self.endpoint("media");
        debug!("Uploading {} bytes as {} ({})", bytes.len(), filename, content_type);

        let resp = self
            .client
            .post(&url)
            .header(
                reqwest::header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            )
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .basic_auth(&self.credentials.username, Some(&self.credentials.app_password))
            .send()
            .await
            .map_err(|e| self.not_reachable(e))?;

        Self::expect_json(resp, StatusCode::CREATED).await
    }

    // ============= Post Endpoints =============

    /// Create a post
    pub async fn create_post(
        &self,
        request: &PublishRequest,
    ) -> Result<CreatedPost, CmsClientError> {
        let url = self.endpoint("posts");
        debug!(
            "Creating post {:?} (categories={:?}, tags={:?}, featured_media={:?})",
            request.title, request.categories, request.tags, request.featured_media
        );

        let resp = self
            .client
            .post(&url)
            .json(request)
            .basic_auth(&self.credentials.username, Some(&self.credentials.app_password))
            .send()
            .await
            .map_err(|e| self.not_reachable(e))?;

        Self::expect_json(resp, StatusCode::CREATED).await
    }

    // ============= User Endpoints =============

    /// Resolve the user the credentials belong to
    pub async fn current_user(&self) -> Result<CmsUser, CmsClientError> {
        let resp = self
            .client
            .get(self.endpoint("users/me"))
            .basic_auth(&self.credentials.username, Some(&self.credentials.app_password))
            .send()
            .await
            .map_err(|e| self.not_reachable(e))?;

        Self::expect_json(resp, StatusCode::OK).await
    }
}
