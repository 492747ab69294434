//! Issue source adapter.
//!
//! Lists the issues of one repository updated since `now - window`, using a
//! single authenticated request (first page only).

use super::Source;
use crate::error::CollectError;
use crate::metrics::SourceMetrics;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use shared::config::{LookbackWindow, SourceSpec};
use shared::models::{IssueRecord, RecordBatch};
use std::time::Duration;
use url::Url;

/// Default issue API base.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Settings shared by every issue source.
#[derive(Clone)]
pub struct IssueSettings {
    /// Base URL of the issue API.
    pub api_base: Url,
    /// Bearer credential.
    pub token: String,
    /// Deadline for each list request.
    pub timeout: Duration,
}

impl std::fmt::Debug for IssueSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueSettings")
            .field("api_base", &self.api_base.as_str())
            .field("token", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Issue as returned by the API. Only the selected fields are decoded.
#[derive(Debug, Deserialize)]
struct RawIssue {
    id: Option<i64>,
    title: Option<String>,
    body: Option<String>,
}

impl RawIssue {
    fn into_record(self) -> Option<IssueRecord> {
        Some(IssueRecord::new(self.id?, self.title?, self.body?))
    }
}

/// Splits a repository URL of the form `https://<host>/<owner>/<repo>`.
///
/// # Errors
///
/// Returns `CollectError::InvalidRepoUrl` unless the path is exactly two
/// non-empty segments.
///
/// # Example
///
/// ```
/// use collector::sources::parse_repo_url;
///
/// let (owner, repo) = parse_repo_url("https://github.com/example/repo").unwrap();
/// assert_eq!((owner.as_str(), repo.as_str()), ("example", "repo"));
///
/// assert!(parse_repo_url("https://github.com/badurl").is_err());
/// ```
pub fn parse_repo_url(repo_url: &str) -> Result<(String, String), CollectError> {
    let invalid = || CollectError::InvalidRepoUrl(repo_url.to_string());

    let parsed = Url::parse(repo_url).map_err(|_| invalid())?;
    let segments: Vec<&str> = parsed.path_segments().ok_or_else(invalid)?.collect();

    match segments.as_slice() {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
            Ok(((*owner).to_string(), (*repo).to_string()))
        }
        _ => Err(invalid()),
    }
}

/// Adapter for one repository.
pub struct IssueSource {
    spec: SourceSpec,
    client: reqwest::Client,
    settings: IssueSettings,
    metrics: SourceMetrics,
}

impl IssueSource {
    /// Creates an adapter for the given repository source.
    #[must_use]
    pub fn new(
        spec: SourceSpec,
        client: reqwest::Client,
        settings: IssueSettings,
        metrics: SourceMetrics,
    ) -> Self {
        Self {
            spec,
            client,
            settings,
            metrics,
        }
    }

    fn issues_url(&self, owner: &str, repo: &str) -> Result<Url, CollectError> {
        let mut url = self.settings.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                CollectError::Config(format!(
                    "issue API base {} cannot carry a path",
                    self.settings.api_base
                ))
            })?
            .pop_if_empty()
            .extend(["repos", owner, repo, "issues"]);
        Ok(url)
    }
}

#[async_trait]
impl Source for IssueSource {
    fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    async fn collect(&self, window: LookbackWindow) -> Result<RecordBatch, CollectError> {
        let (owner, repo) = parse_repo_url(&self.spec.url)?;
        let url = self.issues_url(&owner, &repo)?;
        let since = window
            .since(Utc::now())
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        tracing::debug!(repository = %self.spec.label, %since, "Listing issues");

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.settings.token)
            .header(ACCEPT, "application/vnd.github+json")
            .query(&[("since", since.as_str())])
            .timeout(self.settings.timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| CollectError::remote(url.as_str(), e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| CollectError::remote(url.as_str(), e))?;

        let raw: Vec<RawIssue> =
            serde_json::from_slice(&body).map_err(|e| CollectError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let received = raw.len();
        let issues: Vec<IssueRecord> = raw.into_iter().filter_map(RawIssue::into_record).collect();
        if issues.len() < received {
            tracing::debug!(
                repository = %self.spec.label,
                dropped = received - issues.len(),
                "Dropped issues with missing fields"
            );
        }

        self.metrics.record_call(&self.spec.label);
        self.metrics.record_items(&self.spec.label, issues.len());

        Ok(RecordBatch::Issues(issues))
    }
}
