//! Common test utilities and helpers for integration tests.
//!
//! This module provides mock remote services, scheduler setup, and HTTP
//! request helpers shared by the integration tests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use collector::{Config, MetricsRegistry, Scheduler};
use http_body_util::BodyExt;
use serde_json::json;
use shared::storage::InMemoryRecordStore;
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Repository collected by the issue source.
pub const REPOSITORY: &str = "example/repo";

/// Topic label of the Q&A source.
pub const TOPIC: &str = "topic";

const SEARCH_PAGE: &str = r#"
    <html><body>
      <div class="question-summary">
        <a class="question-hyperlink" href="/questions/42/first-question">T</a>
        <div class="excerpt">E</div>
      </div>
      <div class="question-summary">
        <a class="question-hyperlink" href="/tags/no-id">Untagged</a>
        <div class="excerpt">No id here</div>
      </div>
    </body></html>
"#;

const QUESTION_PAGE: &str = r#"
    <html><body><div class="js-post-body"><p>A</p></div></body></html>
"#;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

/// Starts a server playing both the issue API and the Q&A site.
///
/// The issue API returns two issues for [`REPOSITORY`]. The search page
/// lists one answered question and one whose link carries no id.
pub async fn mock_remote() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{REPOSITORY}/issues")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "a", "body": "x"},
            {"id": 2, "title": "b", "body": ""}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(SEARCH_PAGE))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions/42/first-question"))
        .respond_with(html(QUESTION_PAGE))
        .mount(&server)
        .await;

    server
}

/// Builds configuration pointing every source at the mock server.
///
/// `overrides` replace the defaults used here.
pub fn test_config(server: &MockServer, overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("DB_HOST".to_string(), "localhost".to_string()),
        ("DB_USER".to_string(), "collector".to_string()),
        ("DB_NAME".to_string(), "threads".to_string()),
        ("ACCESS_TOKEN".to_string(), "test-token".to_string()),
        ("ISSUES_API_URL".to_string(), server.uri()),
        (
            "ISSUE_REPOSITORIES".to_string(),
            format!("https://github.com/{REPOSITORY}"),
        ),
        (
            "QA_SEARCHES".to_string(),
            format!("{TOPIC}={}/search?q={TOPIC}", server.uri()),
        ),
        ("LOOKBACK_WINDOWS".to_string(), "48h,7d".to_string()),
        ("SOURCE_INTERVAL".to_string(), "0s".to_string()),
        ("REQUEST_TIMEOUT".to_string(), "5s".to_string()),
        ("FOLLOW_UP_TIMEOUT".to_string(), "1s".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert((*key).to_string(), (*value).to_string());
    }

    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

/// Creates a scheduler with a fresh in-memory store and metrics registry.
pub fn test_scheduler(config: &Config) -> (Scheduler, Arc<InMemoryRecordStore>, MetricsRegistry) {
    let store = InMemoryRecordStore::new_shared();
    let metrics = MetricsRegistry::new().unwrap();
    let scheduler = Scheduler::from_config(config, store.clone(), metrics.clone()).unwrap();
    (scheduler, store, metrics)
}

/// Helper to make a GET request, returning the status and body text.
pub async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, String::from_utf8(body_bytes.to_vec()).unwrap())
}
