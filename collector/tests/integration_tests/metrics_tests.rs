//! Integration tests for the metrics and health endpoints.
//!
//! Tests cover:
//! - Counters and rate gauges after a matrix run
//! - Source-specific metric prefixes
//! - Health check endpoint

use axum::http::StatusCode;
use collector::create_router;
use shared::config::SourceKind;

use super::common::{get_text, mock_remote, test_config, test_scheduler, REPOSITORY, TOPIC};

/// Seconds in the last configured window (7d).
const LAST_WINDOW_SECS: f64 = 7.0 * 24.0 * 3600.0;

#[tokio::test]
async fn test_metrics_after_matrix_run() {
    let server = mock_remote().await;
    let (scheduler, _store, metrics) = test_scheduler(&test_config(&server, &[]));

    scheduler.run_matrix().await;
    let (status, body) = get_text(create_router(metrics.clone()), "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&format!("issues_api_calls_total{{repository=\"{REPOSITORY}\"}} 2")));
    assert!(body.contains(&format!(
        "issues_data_collected_total{{repository=\"{REPOSITORY}\"}} 4"
    )));
    assert!(body.contains(&format!("qa_api_calls_total{{query=\"{TOPIC}\"}} 2")));
    assert!(body.contains(&format!("qa_data_collected_total{{query=\"{TOPIC}\"}} 4")));
    assert!(body.contains("# TYPE issues_api_calls_per_second gauge"));
    assert!(body.contains("# TYPE qa_data_collected_per_second gauge"));

    let issues = metrics.for_source(SourceKind::Issues);
    let qa = metrics.for_source(SourceKind::Questions);
    assert!((issues.api_calls_per_second(REPOSITORY) - 2.0 / LAST_WINDOW_SECS).abs() < 1e-12);
    assert!((issues.data_collected_per_second(REPOSITORY) - 4.0 / LAST_WINDOW_SECS).abs() < 1e-12);
    assert!((qa.api_calls_per_second(TOPIC) - 2.0 / LAST_WINDOW_SECS).abs() < 1e-12);
    assert!((qa.data_collected_per_second(TOPIC) - 4.0 / LAST_WINDOW_SECS).abs() < 1e-12);
}

#[tokio::test]
async fn test_metrics_without_sources_has_no_series() {
    let server = mock_remote().await;
    let config = test_config(&server, &[("ISSUE_REPOSITORIES", ""), ("QA_SEARCHES", "")]);
    let (scheduler, _store, metrics) = test_scheduler(&config);

    let summary = scheduler.run_matrix().await;
    let (status, body) = get_text(create_router(metrics), "/metrics").await;

    assert_eq!(summary.iterations, 0);
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("repository=\""));
    assert!(!body.contains("query=\""));
}

#[tokio::test]
async fn test_health_check() {
    let server = mock_remote().await;
    let (_scheduler, _store, metrics) = test_scheduler(&test_config(&server, &[]));

    let (status, body) = get_text(create_router(metrics), "/health").await;
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "healthy");
    assert_eq!(response["service"], "threadwatch-collector");
}
