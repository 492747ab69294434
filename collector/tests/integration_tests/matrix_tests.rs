//! Integration tests for running the collection matrix end to end.
//!
//! Tests cover:
//! - Both sources stored in matrix order
//! - Stored rows matching the items counters
//! - Duplicate rows on a repeated run
//! - Malformed repository URLs making no requests and no writes

use shared::config::SourceKind;
use shared::models::{IssueRecord, QaRecord};
use shared::storage::{RecordStore, Table};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::{mock_remote, test_config, test_scheduler, REPOSITORY, TOPIC};

#[tokio::test]
async fn test_matrix_collects_both_sources() {
    let server = mock_remote().await;
    let (scheduler, store, _metrics) = test_scheduler(&test_config(&server, &[]));

    let summary = scheduler.run_matrix().await;

    assert_eq!(summary.iterations, 4);
    assert_eq!(summary.fetch_failures, 0);
    assert_eq!(summary.store_failures, 0);
    assert_eq!(summary.rows_stored, 8);

    let issues: Vec<IssueRecord> = store
        .issues()
        .unwrap()
        .into_iter()
        .map(|row| row.record)
        .collect();
    assert_eq!(
        issues,
        vec![
            IssueRecord::new(1, "a", "x"),
            IssueRecord::new(2, "b", ""),
            IssueRecord::new(1, "a", "x"),
            IssueRecord::new(2, "b", ""),
        ]
    );

    let questions: Vec<QaRecord> = store
        .questions()
        .unwrap()
        .into_iter()
        .map(|row| row.record)
        .collect();
    assert_eq!(questions.len(), 4);
    assert_eq!(questions[0], QaRecord::new(42, "T", "E", "A"));
    // unparseable link is kept with a zero id and no answer
    assert_eq!(questions[1], QaRecord::new(0, "Untagged", "No id here", ""));
}

#[tokio::test]
async fn test_stored_rows_match_items_counters() {
    let server = mock_remote().await;
    let (scheduler, store, metrics) = test_scheduler(&test_config(&server, &[]));

    scheduler.run_matrix().await;

    let issues = metrics.for_source(SourceKind::Issues);
    let questions = metrics.for_source(SourceKind::Questions);
    assert_eq!(issues.api_calls(REPOSITORY), 2);
    assert_eq!(questions.api_calls(TOPIC), 2);
    assert_eq!(
        store.count(Table::Issues).await.unwrap() as u64,
        issues.data_collected(REPOSITORY)
    );
    assert_eq!(
        store.count(Table::Questions).await.unwrap() as u64,
        questions.data_collected(TOPIC)
    );
}

#[tokio::test]
async fn test_rerun_appends_duplicate_rows() {
    let server = mock_remote().await;
    let (scheduler, store, _metrics) = test_scheduler(&test_config(&server, &[]));

    scheduler.run_matrix().await;
    scheduler.run_matrix().await;

    let rows = store.issues().unwrap();
    assert_eq!(rows.len(), 8);
    assert!(rows.windows(2).all(|pair| pair[0].id < pair[1].id));
    assert_eq!(rows[0].record, rows[4].record);
}

#[tokio::test]
async fn test_malformed_repository_url_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let config = test_config(
        &server,
        &[
            ("ISSUE_REPOSITORIES", "https://github.com/badurl"),
            ("QA_SEARCHES", ""),
            ("LOOKBACK_WINDOWS", "48h"),
        ],
    );
    let (scheduler, store, metrics) = test_scheduler(&config);

    let summary = scheduler.run_matrix().await;

    assert_eq!(summary.fetch_failures, 1);
    assert!(!store.has_table(Table::Issues).unwrap());
    let issues = metrics.for_source(SourceKind::Issues);
    assert_eq!(issues.api_calls("badurl"), 0);
    assert_eq!(issues.data_collected("badurl"), 0);
}

#[tokio::test]
async fn test_remote_failure_skips_only_that_source() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let remote = mock_remote().await;
    let searches = format!(
        "down={}/search?q=down,{TOPIC}={}/search?q={TOPIC}",
        server.uri(),
        remote.uri()
    );
    let config = test_config(&remote, &[("QA_SEARCHES", searches.as_str())]);
    let (scheduler, store, metrics) = test_scheduler(&config);

    let summary = scheduler.run_matrix().await;

    assert_eq!(summary.iterations, 6);
    assert_eq!(summary.fetch_failures, 2);
    assert_eq!(store.questions().unwrap().len(), 4);
    // Q&A calls are counted before the search page is fetched
    assert_eq!(metrics.for_source(SourceKind::Questions).api_calls("down"), 2);
    assert_eq!(
        metrics.for_source(SourceKind::Questions).data_collected("down"),
        0
    );
}
