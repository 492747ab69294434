//! Source adapters.
//!
//! Each adapter maps one remote data source to the shared record shape. The
//! scheduler drives them through the [`Source`] trait.

pub mod issues;
pub mod questions;

pub use issues::{parse_repo_url, IssueSettings, IssueSource};
pub use questions::{question_id_from_href, QuestionSettings, QuestionSource};

use crate::error::CollectError;
use crate::metrics::MetricsRegistry;
use async_trait::async_trait;
use shared::config::{LookbackWindow, SourceKind, SourceSpec};
use shared::models::RecordBatch;

/// A remote data source the scheduler can collect from.
#[async_trait]
pub trait Source: Send + Sync {
    /// The configured source this adapter serves.
    fn spec(&self) -> &SourceSpec;

    /// Collects records changed within the lookback window.
    ///
    /// Adapters update their own calls and items counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be reached or its response
    /// cannot be understood.
    async fn collect(&self, window: LookbackWindow) -> Result<RecordBatch, CollectError>;
}

/// Builds the HTTP client shared by all adapters.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn http_client() -> Result<reqwest::Client, CollectError> {
    reqwest::Client::builder()
        .user_agent(concat!("threadwatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CollectError::Config(format!("failed to build HTTP client: {e}")))
}

/// Builds one adapter per configured source, in order.
///
/// # Errors
///
/// Returns an error if an issue source is configured without a credential or
/// a Q&A search URL cannot be parsed.
pub fn build_sources(
    specs: &[SourceSpec],
    client: &reqwest::Client,
    issue_settings: Option<&IssueSettings>,
    question_settings: &QuestionSettings,
    metrics: &MetricsRegistry,
) -> Result<Vec<Box<dyn Source>>, CollectError> {
    specs
        .iter()
        .map(|spec| -> Result<Box<dyn Source>, CollectError> {
            let source_metrics = metrics.for_source(spec.kind).clone();
            match spec.kind {
                SourceKind::Issues => {
                    let settings = issue_settings.ok_or_else(|| {
                        CollectError::Config(format!(
                            "ACCESS_TOKEN is required for issue source {}",
                            spec.url
                        ))
                    })?;
                    Ok(Box::new(IssueSource::new(
                        spec.clone(),
                        client.clone(),
                        settings.clone(),
                        source_metrics,
                    )))
                }
                SourceKind::Questions => Ok(Box::new(QuestionSource::new(
                    spec.clone(),
                    client.clone(),
                    *question_settings,
                    source_metrics,
                )?)),
            }
        })
        .collect()
}
