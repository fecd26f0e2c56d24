//! Whole-flow tests: agent run, draft rendering and publishing against fakes

use std::{sync::Arc, time::Duration};

use assistant_client::ChatConfig;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::{
    test_support::{AgentState, CmsState, FakeAssistants, FakeCms, StubProvider},
    AgentRunner, Draft, PipelineError, Publisher, RunnerConfig, TaxonomySuggester,
    TaxonomySuggestion,
};

fn fast_runner(fake: &FakeAssistants) -> AgentRunner {
    AgentRunner::new(
        fake.client(),
        RunnerConfig {
            poll_interval: Duration::from_millis(5),
            run_timeout: Duration::from_secs(5),
            message_limit: 20,
        },
    )
}

fn publisher(cms: &FakeCms, taxonomy_reply: &str) -> Publisher {
    let provider = Arc::new(StubProvider::replying(taxonomy_reply));
    Publisher::new(cms.client(), TaxonomySuggester::new(provider, ChatConfig::default())).unwrap()
}

#[tokio::test]
async fn test_generated_article_title_matches_heading() {
    let markdown = "# 独学でプログラミングを始める方法\n\n初心者エンジニア向けのガイドです。\n\n## ステップ1\n";
    let fake = FakeAssistants::start(
        AgentState::with_statuses(&["queued", "in_progress", "completed"]).assistant_says(markdown),
    )
    .await;

    let article = fast_runner(&fake)
        .run("asst_1", "solo programming", "beginner engineer", &CancellationToken::new())
        .await
        .unwrap();
    assert!(!article.is_empty());

    let draft = Draft::from_markdown(article);
    assert_eq!(draft.html().matches("<h1>").count(), 1);
    assert_eq!(draft.title_or("solo programming"), "独学でプログラミングを始める方法");
}

#[tokio::test]
async fn test_publish_new_category_with_featured_image() {
    let cms = FakeCms::start(CmsState {
        preset_ids: [("Blog".to_string(), 42)].into_iter().collect(),
        media_id: 7,
        post_link: "http://site/p/1".to_string(),
        ..Default::default()
    })
    .await;

    let html = format!(
        r#"<h1>Title</h1><img src="{}"><p>Body</p>"#,
        cms.image_url("y.jpg")
    );
    let suggestion = TaxonomySuggestion {
        category: "Blog".to_string(),
        tags: Vec::new(),
    };

    let outcome = publisher(&cms, "").publish("Title", &html, &suggestion).await.unwrap();
    assert_eq!(outcome.url, "http://site/p/1");

    let state = cms.state();
    assert_eq!(state.posts.len(), 1);
    assert_eq!(state.posts[0]["featured_media"], json!(7));
    assert_eq!(state.posts[0]["categories"], json!([42]));
}

#[tokio::test]
async fn test_generate_then_publish_article() {
    let markdown = "# Solo Programming Guide\n\n![cover](IMAGE)\n\nStart small.\n";
    let cms = FakeCms::start(CmsState {
        tags: vec![(9, "Beginners".to_string())],
        ..Default::default()
    })
    .await;
    let markdown = markdown.replace("IMAGE", &cms.image_url("cover.jpg"));

    let fake =
        FakeAssistants::start(AgentState::with_statuses(&["completed"]).assistant_says(&markdown))
            .await;
    let article = fast_runner(&fake)
        .run("asst_1", "solo programming", "beginner engineer", &CancellationToken::new())
        .await
        .unwrap();
    let draft = Draft::from_markdown(article);

    let outcome = publisher(&cms, "Category: Programming\nTags: [\"Beginners\", \"Self-study\"]")
        .publish_article(&draft.title_or("solo programming"), &draft)
        .await
        .unwrap();

    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    assert_eq!(outcome.tag_ids.len(), 2);
    assert_eq!(outcome.tag_ids[0], 9);
    assert_eq!(outcome.featured_media, Some(7));

    let state = cms.state();
    let post = &state.posts[0];
    assert_eq!(post["title"], "Solo Programming Guide");
    assert_eq!(post["status"], "publish");
    assert_eq!(state.uploads[0].disposition, "attachment; filename=featured.jpg");
    assert_eq!(state.categories[0].1, "Programming");
}

#[tokio::test]
async fn test_taxonomy_outage_still_publishes() {
    let cms = FakeCms::start(CmsState::default()).await;
    let suggester =
        TaxonomySuggester::new(Arc::new(StubProvider::failing()), ChatConfig::default());
    let publisher = Publisher::new(cms.client(), suggester).unwrap();

    let draft = Draft::from_markdown("# Plain\n\nNo pictures here.");
    let outcome = publisher.publish_article("Plain", &draft).await.unwrap();

    assert_eq!(outcome.featured_media, None);
    assert!(outcome.tag_ids.is_empty());
    assert_eq!(outcome.warnings.len(), 1);

    let state = cms.state();
    assert_eq!(state.categories[0].1, "General");
    assert!(state.posts[0].get("featured_media").is_none());
}

#[tokio::test]
async fn test_rejected_post_produces_no_url() {
    let cms = FakeCms::start(CmsState {
        post_status: 500,
        ..Default::default()
    })
    .await;

    let draft = Draft::from_markdown("# T\n\nx");
    let result = publisher(&cms, "Category: Blog").publish_article("T", &draft).await;

    assert!(matches!(
        result,
        Err(PipelineError::PublishFailed { status: 500, .. })
    ));
}
