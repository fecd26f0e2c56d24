//! Post assembly and submission

use cms_client::{CmsClient, CmsClientError, PostStatus, PublishRequest, TermKind};
use tracing::{info, warn};

use crate::{
    draft::Draft,
    error::{PipelineError, PipelineWarning, Result},
    featured_image::FeaturedImageExtractor,
    taxonomy::{TaxonomySuggester, TaxonomySuggestion},
    terms::TermResolver,
};

/// What a successful publish produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub post_id: u64,
    pub url: String,
    pub category_id: Option<u64>,
    pub tag_ids: Vec<u64>,
    pub featured_media: Option<u64>,
    /// Enrichment steps that were skipped
    pub warnings: Vec<PipelineWarning>,
}

/// Publishes drafts as live posts with taxonomy and a featured image
#[derive(Debug, Clone)]
pub struct Publisher {
    cms: CmsClient,
    terms: TermResolver,
    images: FeaturedImageExtractor,
    suggester: TaxonomySuggester,
}

impl Publisher {
    pub fn new(cms: CmsClient, suggester: TaxonomySuggester) -> Result<Self> {
        Ok(Self {
            terms: TermResolver::new(cms.clone()),
            images: FeaturedImageExtractor::new(cms.clone())?,
            cms,
            suggester,
        })
    }

    async fn resolve_term(
        &self,
        name: &str,
        kind: TermKind,
        warnings: &mut Vec<PipelineWarning>,
    ) -> Option<u64> {
        match self.terms.resolve(name, kind).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("{}", e);
                warnings.push(PipelineWarning::TermSkipped {
                    kind,
                    name: name.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    /// Publish `html` under `title`. Only the post creation itself is mandatory.
    pub async fn publish(
        &self,
        title: &str,
        html: &str,
        suggestion: &TaxonomySuggestion,
    ) -> Result<PublishOutcome> {
        let mut warnings = Vec::new();

        let category_id = self
            .resolve_term(&suggestion.category, TermKind::Category, &mut warnings)
            .await;

        // Sequential, so creation order on the CMS follows the suggestion
        let mut tag_ids = Vec::with_capacity(suggestion.tags.len());
        for tag in &suggestion.tags {
            if let Some(id) = self.resolve_term(tag, TermKind::Tag, &mut warnings).await {
                tag_ids.push(id);
            }
        }

        let featured_media = match self.images.try_extract(html).await {
            Ok(media) => media.map(|m| m.id),
            Err(e) => {
                warn!("{}", e);
                warnings.push(PipelineWarning::ImageSkipped {
                    reason: e.to_string(),
                });
                None
            }
        };

        let request = PublishRequest {
            title: title.to_string(),
            content: html.to_string(),
            status: PostStatus::Publish,
            categories: category_id.into_iter().collect(),
            tags: tag_ids.clone(),
            featured_media,
        };

        let post = self.cms.create_post(&request).await.map_err(|e| match e {
            CmsClientError::ApiError { status, body } => {
                PipelineError::PublishFailed { status, body }
            }
            other => PipelineError::Cms(other),
        })?;

        let url = if post.link.is_empty() {
            format!("{}/?p={}", self.cms.base_url(), post.id)
        } else {
            post.link
        };

        info!("Published post {} at {}", post.id, url);
        Ok(PublishOutcome {
            post_id: post.id,
            url,
            category_id,
            tag_ids,
            featured_media,
            warnings,
        })
    }

    /// Suggest taxonomy from the draft's Markdown, then publish its HTML
    pub async fn publish_article(&self, title: &str, draft: &Draft) -> Result<PublishOutcome> {
        let taxonomy = self.suggester.suggest(draft.markdown()).await;
        info!(
            "Taxonomy: category '{}', tags {:?}",
            taxonomy.suggestion.category, taxonomy.suggestion.tags
        );

        let mut outcome = self.publish(title, draft.html(), &taxonomy.suggestion).await?;

        let mut warnings = taxonomy.warnings;
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;
        Ok(outcome)
    }
}
