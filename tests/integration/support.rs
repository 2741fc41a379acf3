//! Shared fixtures for the integration tests

use serde_json::json;
use tempfile::TempDir;
use wikiscribe::config::{
    Config, FetcherConfig, OutputConfig, SiteConfig, SummaryConfig, UserAgentConfig,
};
use wikiscribe::Coordinator;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Builds a configuration pointing the site and the summary endpoint at `server`
pub fn create_test_config(server: &MockServer, db_dir: &TempDir) -> Config {
    Config {
        site: SiteConfig {
            base_url: server.uri(),
            max_child_links: 5,
        },
        fetcher: FetcherConfig {
            timeout_secs: 5,
            connect_timeout_secs: 2,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestScribe".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        summary: SummaryConfig {
            endpoint: format!("{}{}", server.uri(), COMPLETIONS_PATH),
            model: "test-model".to_string(),
            max_tokens: 200,
            timeout_secs: 5,
            api_key_env: "WIKISCRIBE_TEST_KEY".to_string(),
            api_key: Some("test-key".to_string()),
        },
        output: OutputConfig {
            database_path: db_dir
                .path()
                .join("articles.db")
                .to_string_lossy()
                .into_owned(),
        },
    }
}

/// Starts a coordinator on a fresh temporary database
pub fn create_coordinator(server: &MockServer) -> (Coordinator, TempDir) {
    let db_dir = TempDir::new().unwrap();
    let coordinator = Coordinator::new(create_test_config(server, &db_dir)).unwrap();
    (coordinator, db_dir)
}

/// Renders an article page in the wiki's layout
pub fn article_html(title: &str, paragraphs: &[&str], links: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>", p))
        .collect();
    let related = if links.is_empty() {
        String::new()
    } else {
        let anchors: String = links
            .iter()
            .map(|l| format!(r#"<a href="/wiki/{0}">{0}</a> "#, l))
            .collect();
        format!("<p>Related: {}</p>", anchors)
    };

    format!(
        r#"<!DOCTYPE html>
<html><head><title>{0} - Wiki</title></head>
<body>
  <h1 id="firstHeading" class="firstHeading">{0}</h1>
  <div class="mw-body-content">
    {1}
    {2}
    <h2>See also</h2>
    <p>Footer text</p>
  </div>
</body></html>"#,
        title, body, related
    )
}

/// Serves `html` at `/wiki/<name>`
pub async fn mount_article(server: &MockServer, name: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(format!("/wiki/{}", name)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html, "text/html; charset=UTF-8"),
        )
        .mount(server)
        .await;
}

/// Serves a simple leaf article at `/wiki/<name>`
pub async fn mount_leaf(server: &MockServer, name: &str) {
    let text = format!("About {}.", name);
    mount_article(server, name, article_html(name, &[text.as_str()], &[])).await;
}

/// Answers `/wiki/<name>` with an HTTP error
pub async fn mount_missing(server: &MockServer, name: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/wiki/{}", name)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Answers every completion request with `content`
pub async fn mount_summary(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })))
        .mount(server)
        .await;
}

pub fn article_url(server: &MockServer, name: &str) -> String {
    format!("{}/wiki/{}", server.uri(), name)
}
