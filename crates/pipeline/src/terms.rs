//! Category/tag lookup-or-create against the CMS

use cms_client::{CmsClient, TermKind};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

/// Resolves taxonomy names to CMS term ids, creating missing terms.
///
/// Nothing is cached between calls; the CMS is the only source of truth.
#[derive(Debug, Clone)]
pub struct TermResolver {
    cms: CmsClient,
}

impl TermResolver {
    pub fn new(cms: CmsClient) -> Self {
        Self { cms }
    }

    /// Id of the term named exactly `name`, creating it when no such term exists
    pub async fn resolve(&self, name: &str, kind: TermKind) -> Result<u64> {
        match self.cms.search_terms(kind, name).await {
            Ok(terms) => {
                if let Some(term) = terms.into_iter().find(|t| t.name == name) {
                    debug!("Found existing {} '{}' (id {})", kind, name, term.id);
                    return Ok(term.id);
                }
            }
            // A failed search is not fatal; creation reports the real problem
            Err(e) => debug!("Search for {} '{}' failed: {}", kind, name, e),
        }

        match self.cms.create_term(kind, name).await {
            Ok(term) => {
                info!("Created {} '{}' (id {})", kind, name, term.id);
                Ok(term.id)
            }
            Err(source) => Err(PipelineError::TermCreationFailed {
                kind,
                name: name.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CmsState, FakeCms};

    #[tokio::test]
    async fn test_existing_term_matches_exactly() {
        let cms = FakeCms::start(CmsState {
            categories: vec![(3, "Blog Tips".to_string()), (4, "Blog".to_string())],
            ..Default::default()
        })
        .await;

        let resolver = TermResolver::new(cms.client());
        let id = resolver.resolve("Blog", TermKind::Category).await.unwrap();

        assert_eq!(id, 4);
        assert_eq!(cms.state().term_creates, 0);
    }

    #[tokio::test]
    async fn test_entity_encoded_name_matches_without_creating() {
        let cms = FakeCms::start(CmsState {
            categories: vec![
                (8, "Tips".to_string()),
                (9, "Tips &ndash; Tricks&hellip;".to_string()),
            ],
            ..Default::default()
        })
        .await;

        let resolver = TermResolver::new(cms.client());
        let id = resolver
            .resolve("Tips \u{2013} Tricks\u{2026}", TermKind::Category)
            .await
            .unwrap();

        assert_eq!(id, 9);
        assert_eq!(cms.state().term_creates, 0);
    }

    #[tokio::test]
    async fn test_missing_term_is_created() {
        let cms = FakeCms::start(CmsState {
            preset_ids: [("Blog".to_string(), 42)].into_iter().collect(),
            ..Default::default()
        })
        .await;

        let resolver = TermResolver::new(cms.client());
        let id = resolver.resolve("Blog", TermKind::Category).await.unwrap();

        assert_eq!(id, 42);
        assert_eq!(cms.state().categories, vec![(42, "Blog".to_string())]);
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let cms = FakeCms::start(CmsState::default()).await;
        let resolver = TermResolver::new(cms.client());

        for (name, kind) in [
            ("独学", TermKind::Tag),
            ("Programming", TermKind::Tag),
            ("Programming", TermKind::Category),
        ] {
            let first = resolver.resolve(name, kind).await.unwrap();
            let second = resolver.resolve(name, kind).await.unwrap();
            assert_eq!(first, second, "{} {:?}", name, kind);
        }

        // One creation per distinct (name, kind)
        assert_eq!(cms.state().term_creates, 3);
    }

    #[tokio::test]
    async fn test_creation_failure_is_surfaced() {
        let cms = FakeCms::start(CmsState {
            failing_terms: ["Broken".to_string()].into_iter().collect(),
            ..Default::default()
        })
        .await;

        let resolver = TermResolver::new(cms.client());
        let err = resolver.resolve("Broken", TermKind::Tag).await.unwrap_err();

        match err {
            PipelineError::TermCreationFailed { kind, name, source } => {
                assert_eq!(kind, TermKind::Tag);
                assert_eq!(name, "Broken");
                assert_eq!(source.status(), Some(500));
                assert!(source.to_string().contains("db_insert_error"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
