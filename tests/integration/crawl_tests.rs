//! End-to-end crawl tests

use crate::support::{
    article_html, article_url, create_coordinator, create_test_config, mount_article,
    mount_leaf, mount_missing, mount_summary, COMPLETIONS_PATH,
};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use wikiscribe::storage::DEFAULT_BUSY_TIMEOUT;
use wikiscribe::{Coordinator, CrawlOutcome, SummaryLookup};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOPIC_HTML: &str = r##"<!DOCTYPE html>
<html><head><title>Topic - Wiki</title></head>
<body>
  <h1 id="firstHeading" class="firstHeading">Topic</h1>
  <div class="mw-body-content">
    <p>Para <a href="/wiki/Alpha">one</a>.<sup class="reference"><a href="#cite_note-1">[1]</a></sup></p>
    <p>Para <a href="/wiki/Beta">two</a>.
</p>
    <h2>See also</h2>
    <p><a href="/wiki/Gamma">Gamma</a></p>
  </div>
</body></html>"##;

#[tokio::test]
async fn test_topic_crawl_end_to_end() {
    let server = MockServer::start().await;

    mount_article(&server, "Topic", TOPIC_HTML.to_string()).await;
    mount_leaf(&server, "Alpha").await;
    mount_leaf(&server, "Beta").await;
    mount_summary(&server, "Topic is a short example.").await;

    Mock::given(method("GET"))
        .and(path("/wiki/Gamma"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (mut coordinator, _db_dir) = create_coordinator(&server);
    let root_url = article_url(&server, "Topic");

    let outcome = coordinator.parse_article(&root_url).await.unwrap();
    assert_eq!(
        outcome,
        CrawlOutcome::Created {
            url: root_url.clone(),
            children: 2,
            summary_attached: true,
        }
    );

    let root = coordinator.article(&root_url).unwrap().unwrap();
    assert_eq!(root.title, "Topic");
    assert_eq!(root.body, "Para one.Para two.");
    assert!(root.parents.is_empty());

    let child_titles: Vec<&str> = root.children.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(child_titles, vec!["Alpha", "Beta"]);

    let alpha = coordinator
        .article(&article_url(&server, "Alpha"))
        .unwrap()
        .unwrap();
    assert_eq!(alpha.body, "About Alpha.");
    assert_eq!(alpha.parents.len(), 1);
    assert_eq!(alpha.parents[0].url, root_url);
    assert!(alpha.children.is_empty());
    assert!(alpha.summary.is_none());

    assert_eq!(
        coordinator.summary(&root_url).unwrap(),
        SummaryLookup::Found("Topic is a short example.".to_string())
    );

    let stats = coordinator.statistics().unwrap();
    assert_eq!(stats.articles, 3);
    assert_eq!(stats.links, 2);
    assert_eq!(stats.summaries, 1);
    assert_eq!(stats.root_articles, 1);
}

#[tokio::test]
async fn test_summary_request_carries_root_body() {
    let server = MockServer::start().await;

    mount_article(&server, "Topic", TOPIC_HTML.to_string()).await;
    mount_leaf(&server, "Alpha").await;
    mount_leaf(&server, "Beta").await;

    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "max_tokens": 200,
            "messages": [
                {"role": "system"},
                {"role": "user", "content": "Summarize the following article in 5-6 sentences:\n\nPara one.Para two."}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Summary."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (mut coordinator, _db_dir) = create_coordinator(&server);
    let outcome = coordinator
        .parse_article(&article_url(&server, "Topic"))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        CrawlOutcome::Created {
            summary_attached: true,
            ..
        }
    ));
}

#[tokio::test]
async fn test_failed_children_are_skipped() {
    let server = MockServer::start().await;

    let links = ["C1", "C2", "C3", "C4", "C5"];
    mount_article(
        &server,
        "Root",
        article_html("Root", &["Root text."], &links),
    )
    .await;
    mount_leaf(&server, "C1").await;
    mount_missing(&server, "C2", 404).await;
    mount_leaf(&server, "C3").await;
    mount_missing(&server, "C4", 503).await;
    mount_leaf(&server, "C5").await;
    mount_summary(&server, "Root summary.").await;

    let (mut coordinator, _db_dir) = create_coordinator(&server);
    let root_url = article_url(&server, "Root");

    let outcome = coordinator.parse_article(&root_url).await.unwrap();
    assert!(matches!(
        outcome,
        CrawlOutcome::Created {
            children: 3,
            summary_attached: true,
            ..
        }
    ));

    let root = coordinator.article(&root_url).unwrap().unwrap();
    let child_titles: Vec<&str> = root.children.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(child_titles, vec!["C1", "C3", "C5"]);

    assert!(coordinator
        .article(&article_url(&server, "C2"))
        .unwrap()
        .is_none());
    assert_eq!(coordinator.statistics().unwrap().articles, 4);
}

#[tokio::test]
async fn test_link_cap_limits_children() {
    let server = MockServer::start().await;

    let links: Vec<String> = (1..=8).map(|i| format!("Link_{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_article(&server, "Hub", article_html("Hub", &["Hub text."], &link_refs)).await;
    for link in &links {
        mount_leaf(&server, link).await;
    }
    mount_summary(&server, "Hub summary.").await;

    let (mut coordinator, _db_dir) = create_coordinator(&server);
    let outcome = coordinator
        .parse_article(&article_url(&server, "Hub"))
        .await
        .unwrap();

    assert!(matches!(outcome, CrawlOutcome::Created { children: 5, .. }));

    let requests = server.received_requests().await.unwrap();
    let fetched_link_6 = requests.iter().any(|r| r.url.path() == "/wiki/Link_6");
    assert!(!fetched_link_6);
}

#[tokio::test]
async fn test_root_fetch_failure_writes_nothing() {
    let server = MockServer::start().await;

    mount_missing(&server, "Gone", 404).await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (mut coordinator, _db_dir) = create_coordinator(&server);
    let root_url = article_url(&server, "Gone");

    let outcome = coordinator.parse_article(&root_url).await.unwrap();
    assert_eq!(outcome, CrawlOutcome::FetchFailed { url: root_url.clone() });

    assert_eq!(coordinator.statistics().unwrap().articles, 0);
    assert_eq!(
        coordinator.summary(&root_url).unwrap(),
        SummaryLookup::ArticleNotFound
    );
}

#[tokio::test]
async fn test_second_crawl_reports_existing_article() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wiki/Topic"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(TOPIC_HTML, "text/html; charset=UTF-8"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_leaf(&server, "Alpha").await;
    mount_leaf(&server, "Beta").await;
    mount_summary(&server, "Summary.").await;

    let (mut coordinator, _db_dir) = create_coordinator(&server);
    let root_url = article_url(&server, "Topic");

    coordinator.parse_article(&root_url).await.unwrap();

    // Fragments and tracking parameters canonicalize to the stored URL
    let variant = format!("{}?utm_source=feed#History", root_url);
    let outcome = coordinator.parse_article(&variant).await.unwrap();
    assert_eq!(outcome, CrawlOutcome::AlreadyExists { url: root_url });

    let alpha_outcome = coordinator
        .parse_article(&article_url(&server, "Alpha"))
        .await
        .unwrap();
    assert!(matches!(alpha_outcome, CrawlOutcome::AlreadyExists { .. }));

    assert_eq!(coordinator.statistics().unwrap().articles, 3);
}

#[tokio::test]
async fn test_summary_failure_still_stores_crawl() {
    let server = MockServer::start().await;

    mount_article(&server, "Topic", TOPIC_HTML.to_string()).await;
    mount_leaf(&server, "Alpha").await;
    mount_leaf(&server, "Beta").await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": {"message": "overloaded"}})),
        )
        .mount(&server)
        .await;

    let (mut coordinator, _db_dir) = create_coordinator(&server);
    let root_url = article_url(&server, "Topic");

    let outcome = coordinator.parse_article(&root_url).await.unwrap();
    assert_eq!(
        outcome,
        CrawlOutcome::Created {
            url: root_url.clone(),
            children: 2,
            summary_attached: false,
        }
    );

    assert_eq!(
        coordinator.summary(&root_url).unwrap(),
        SummaryLookup::SummaryMissing
    );
    assert_eq!(coordinator.statistics().unwrap().summaries, 0);
    assert_eq!(coordinator.statistics().unwrap().articles, 3);
}

#[tokio::test]
async fn test_shared_child_is_stored_once() {
    let server = MockServer::start().await;

    mount_article(&server, "First", article_html("First", &["One."], &["Shared", "OnlyFirst"])).await;
    mount_article(&server, "Second", article_html("Second", &["Two."], &["Shared", "OnlySecond"])).await;
    mount_leaf(&server, "Shared").await;
    mount_leaf(&server, "OnlyFirst").await;
    mount_leaf(&server, "OnlySecond").await;
    mount_summary(&server, "Summary.").await;

    let (mut coordinator, _db_dir) = create_coordinator(&server);
    coordinator
        .parse_article(&article_url(&server, "First"))
        .await
        .unwrap();
    coordinator
        .parse_article(&article_url(&server, "Second"))
        .await
        .unwrap();

    let shared = coordinator
        .article(&article_url(&server, "Shared"))
        .unwrap()
        .unwrap();
    let parent_titles: Vec<&str> = shared.parents.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(parent_titles, vec!["First", "Second"]);

    let stats = coordinator.statistics().unwrap();
    assert_eq!(stats.articles, 5);
    assert_eq!(stats.links, 4);
    assert_eq!(stats.summaries, 2);
    assert_eq!(stats.root_articles, 2);
}

#[tokio::test]
async fn test_self_link_is_tolerated() {
    let server = MockServer::start().await;

    mount_article(&server, "Loop", article_html("Loop", &["Loops."], &["Loop", "Next"])).await;
    mount_leaf(&server, "Next").await;
    mount_summary(&server, "Summary.").await;

    let (mut coordinator, _db_dir) = create_coordinator(&server);
    let root_url = article_url(&server, "Loop");

    let outcome = coordinator.parse_article(&root_url).await.unwrap();
    assert!(matches!(outcome, CrawlOutcome::Created { children: 2, .. }));

    let root = coordinator.article(&root_url).unwrap().unwrap();
    assert_eq!(root.parents.len(), 1);
    assert_eq!(root.parents[0].url, root_url);
    assert_eq!(root.children.len(), 2);
    assert_eq!(coordinator.statistics().unwrap().articles, 2);
}

#[tokio::test]
async fn test_page_without_content_container_is_stored() {
    let server = MockServer::start().await;

    mount_article(
        &server,
        "Bare",
        "<html><body><p>No container here.</p></body></html>".to_string(),
    )
    .await;
    mount_summary(&server, "Nothing much.").await;

    let (mut coordinator, _db_dir) = create_coordinator(&server);
    let root_url = article_url(&server, "Bare");

    let outcome = coordinator.parse_article(&root_url).await.unwrap();
    assert!(matches!(outcome, CrawlOutcome::Created { children: 0, .. }));

    let root = coordinator.article(&root_url).unwrap().unwrap();
    assert_eq!(root.title, "Title");
    assert!(root.body.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_crawls_of_same_article() {
    let server = MockServer::start().await;

    mount_article(&server, "Topic", TOPIC_HTML.to_string()).await;
    mount_leaf(&server, "Alpha").await;
    mount_leaf(&server, "Beta").await;

    // The first crawl holds the write lock longer than the default wait
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "Summary."}}]
                }))
                .set_delay(DEFAULT_BUSY_TIMEOUT + Duration::from_secs(1)),
        )
        .mount(&server)
        .await;

    let db_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &db_dir);
    config.summary.timeout_secs = 15;

    let mut first = Coordinator::new(config.clone()).unwrap();
    let mut second = Coordinator::new(config).unwrap();
    let root_url = article_url(&server, "Topic");

    let first_crawl = {
        let url = root_url.clone();
        tokio::spawn(async move { first.parse_article(&url).await })
    };
    let second_crawl = {
        let url = root_url.clone();
        tokio::spawn(async move { second.parse_article(&url).await })
    };

    let outcomes = [
        first_crawl.await.unwrap().unwrap(),
        second_crawl.await.unwrap().unwrap(),
    ];

    let created = outcomes
        .iter()
        .filter(|o| matches!(o, CrawlOutcome::Created { .. }))
        .count();
    let existing = outcomes
        .iter()
        .filter(|o| matches!(o, CrawlOutcome::AlreadyExists { .. }))
        .count();
    assert_eq!(created, 1);
    assert_eq!(existing, 1);

    let reader = Coordinator::new(create_test_config(&server, &db_dir)).unwrap();
    assert_eq!(reader.statistics().unwrap().articles, 3);
}
