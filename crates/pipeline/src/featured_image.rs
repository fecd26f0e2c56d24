//! Featured image: the first `<img>` of the article, re-hosted on the CMS

use std::time::Duration;

use cms_client::{CmsClient, MediaAsset};
use reqwest::Url;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};

/// Attachment name every featured image is uploaded under
pub const FEATURED_FILENAME: &str = "featured.jpg";
pub const FEATURED_CONTENT_TYPE: &str = "image/jpeg";

/// Time limit for fetching the source image
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// `src` of the first image element in document order
pub fn first_image_src(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("img").ok()?;

    let src = document.select(&selector).next()?.value().attr("src")?.trim();
    if src.is_empty() {
        None
    } else {
        Some(src.to_string())
    }
}

/// Downloads the article's first image and uploads it as CMS media
#[derive(Debug, Clone)]
pub struct FeaturedImageExtractor {
    cms: CmsClient,
    http: reqwest::Client,
}

impl FeaturedImageExtractor {
    pub fn new(cms: CmsClient) -> Result<Self> {
        Self::with_timeout(cms, DOWNLOAD_TIMEOUT)
    }

    pub fn with_timeout(cms: CmsClient, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::HttpClient(e.to_string()))?;

        Ok(Self { cms, http })
    }

    /// Relative sources are taken relative to the CMS site
    fn absolute_url(&self, src: &str) -> std::result::Result<Url, String> {
        match Url::parse(src) {
            Ok(url) => Ok(url),
            Err(_) => Url::parse(&format!("{}/", self.cms.base_url()))
                .and_then(|base| base.join(src))
                .map_err(|e| format!("invalid image URL: {}", e)),
        }
    }

    async fn download(&self, url: Url) -> std::result::Result<Vec<u8>, String> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| format!("download failed: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("download returned {}", resp.status()));
        }

        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| format!("download failed: {}", e))
    }

    /// Upload the first image in `html`.
    ///
    /// `Ok(None)` means the article has no usable image, which is not an error.
    pub async fn try_extract(&self, html: &str) -> Result<Option<MediaAsset>> {
        let Some(src) = first_image_src(html) else {
            debug!("No image in article, skipping featured media");
            return Ok(None);
        };

        let failed = |reason: String| PipelineError::ImageUploadFailed {
            url: src.clone(),
            reason,
        };

        let url = self.absolute_url(&src).map_err(failed)?;
        let bytes = self.download(url).await.map_err(failed)?;

        let media = self
            .cms
            .upload_media(bytes, FEATURED_FILENAME, FEATURED_CONTENT_TYPE)
            .await
            .map_err(|e| failed(e.to_string()))?;

        info!("Uploaded featured image from {} as media {}", src, media.id);
        Ok(Some(media))
    }

    /// Best-effort [`try_extract`](Self::try_extract): failures are logged and dropped
    pub async fn extract(&self, html: &str) -> Option<MediaAsset> {
        match self.try_extract(html).await {
            Ok(media) => media,
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }
}
