//! Collector configuration module.
//!
//! Handles loading configuration from environment variables with sensible
//! defaults. Values are read through a lookup function so callers can supply
//! them from somewhere other than the process environment.

use crate::db::DatabaseConfig;
use crate::error::CollectError;
use crate::sources::issues::DEFAULT_API_URL;
use crate::sources::{IssueSettings, QuestionSettings};
use shared::config::{LookbackWindow, SourceKind, SourceSpec};
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

/// Repositories collected when `ISSUE_REPOSITORIES` is unset.
pub const DEFAULT_REPOSITORIES: [&str; 6] = [
    "https://github.com/prometheus/prometheus",
    "https://github.com/SeleniumHQ/selenium",
    "https://github.com/openai/openai-python",
    "https://github.com/docker/docs",
    "https://github.com/milvus-io/milvus",
    "https://github.com/golang/go",
];

/// Searches collected when `QA_SEARCHES` is unset.
pub const DEFAULT_SEARCHES: [(&str, &str); 6] = [
    ("Prometheus", "https://stackoverflow.com/search?q=Prometheus"),
    (
        "selenium-webdriver",
        "https://stackoverflow.com/search?q=selenium-webdriver",
    ),
    ("OpenAi", "https://stackoverflow.com/search?q=OpenAi"),
    ("docker", "https://stackoverflow.com/search?q=docker"),
    ("milvus", "https://stackoverflow.com/search?q=milvus"),
    ("golang", "https://stackoverflow.com/search?q=golang"),
];

/// Collector configuration.
///
/// Configuration values can be set via environment variables:
/// - `METRICS_HOST` / `METRICS_PORT`: bind address of `/metrics` (default: 0.0.0.0:8080)
/// - `ACCESS_TOKEN`: bearer credential, required when issue sources are configured
/// - `ISSUE_REPOSITORIES`: comma-separated repository URLs
/// - `QA_SEARCHES`: comma-separated `label=search_url` entries
/// - `LOOKBACK_WINDOWS`: comma-separated durations (default: `48h,7d,45d`)
/// - `SOURCE_INTERVAL`: pause between sources (default: `1m`)
/// - `ISSUES_API_URL`: issue API base (default: `https://api.github.com`)
/// - `REQUEST_TIMEOUT` / `FOLLOW_UP_TIMEOUT`: request deadlines (default: `30s` / `15s`)
/// - `DB_*`: see [`DatabaseConfig::from_lookup`]
///
/// An empty `ISSUE_REPOSITORIES` or `QA_SEARCHES` disables that source kind.
#[derive(Clone)]
pub struct Config {
    /// Host the metrics server binds to.
    pub metrics_host: String,
    /// Port the metrics server listens on.
    pub metrics_port: u16,
    /// Database connection parameters.
    pub database: DatabaseConfig,
    /// Credential for the issue API.
    pub access_token: Option<String>,
    /// Sources in matrix order: repositories first, then searches.
    pub sources: Vec<SourceSpec>,
    /// Lookback windows in matrix order.
    pub windows: Vec<LookbackWindow>,
    /// Pause between consecutive sources.
    pub source_interval: Duration,
    /// Issue API base URL.
    pub issues_api_url: Url,
    /// Deadline for top-level requests.
    pub request_timeout: Duration,
    /// Deadline for each answer page request.
    pub follow_up_timeout: Duration,
}

impl Config {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `CollectError::Config` if a required value is missing or any
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, CollectError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a new configuration through a variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `CollectError::Config` if a required value is missing or any
    /// value cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CollectError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConfig::from_lookup(&lookup)?;

        let metrics_host = lookup("METRICS_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let metrics_port = lookup("METRICS_PORT")
            .map(|p| {
                p.trim()
                    .parse::<u16>()
                    .map_err(|e| CollectError::Config(format!("METRICS_PORT '{p}': {e}")))
            })
            .transpose()?
            .unwrap_or(8080);

        let mut sources: Vec<SourceSpec> = match lookup("ISSUE_REPOSITORIES") {
            Some(list) => split_list(&list).map(SourceSpec::issues).collect(),
            None => DEFAULT_REPOSITORIES.iter().map(|url| SourceSpec::issues(*url)).collect(),
        };
        match lookup("QA_SEARCHES") {
            Some(list) => {
                for entry in split_list(&list) {
                    sources.push(SourceSpec::parse_search_entry(entry).map_err(config_error)?);
                }
            }
            None => sources.extend(
                DEFAULT_SEARCHES
                    .iter()
                    .map(|(label, url)| SourceSpec::questions(*label, *url)),
            ),
        }
        for source in &sources {
            source.validate_source().map_err(|e| {
                CollectError::Config(format!("{} source '{}': {e}", source.kind, source.url))
            })?;
        }

        let access_token = lookup("ACCESS_TOKEN").filter(|token| !token.trim().is_empty());
        if access_token.is_none() && sources.iter().any(|s| s.kind == SourceKind::Issues) {
            return Err(CollectError::Config(
                "ACCESS_TOKEN must be set when issue repositories are configured".to_string(),
            ));
        }

        let windows = match lookup("LOOKBACK_WINDOWS") {
            Some(list) => LookbackWindow::parse_list(&list).map_err(config_error)?,
            None => LookbackWindow::defaults(),
        };

        let issues_api_url = lookup("ISSUES_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let issues_api_url = Url::parse(&issues_api_url).map_err(|e| {
            CollectError::Config(format!("ISSUES_API_URL '{issues_api_url}': {e}"))
        })?;

        Ok(Self {
            metrics_host,
            metrics_port,
            database,
            access_token,
            sources,
            windows,
            source_interval: duration_var(&lookup, "SOURCE_INTERVAL", Duration::from_secs(60))?,
            issues_api_url,
            request_timeout: duration_var(&lookup, "REQUEST_TIMEOUT", Duration::from_secs(30))?,
            follow_up_timeout: duration_var(
                &lookup,
                "FOLLOW_UP_TIMEOUT",
                Duration::from_secs(15),
            )?,
        })
    }

    /// Returns the socket address for the metrics server.
    ///
    /// # Errors
    ///
    /// Returns an error if the host and port do not form a valid socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, CollectError> {
        format!("{}:{}", self.metrics_host, self.metrics_port)
            .parse()
            .map_err(|e| {
                CollectError::Config(format!(
                    "metrics address {}:{}: {e}",
                    self.metrics_host, self.metrics_port
                ))
            })
    }

    /// Settings for issue sources, if a credential is configured.
    #[must_use]
    pub fn issue_settings(&self) -> Option<IssueSettings> {
        self.access_token.as_ref().map(|token| IssueSettings {
            api_base: self.issues_api_url.clone(),
            token: token.clone(),
            timeout: self.request_timeout,
        })
    }

    /// Settings for Q&A sources.
    #[must_use]
    pub fn question_settings(&self) -> QuestionSettings {
        QuestionSettings {
            request_timeout: self.request_timeout,
            follow_up_timeout: self.follow_up_timeout,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("metrics_host", &self.metrics_host)
            .field("metrics_port", &self.metrics_port)
            .field("database", &self.database)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("sources", &self.sources)
            .field("windows", &self.windows)
            .field("source_interval", &self.source_interval)
            .field("issues_api_url", &self.issues_api_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("follow_up_timeout", &self.follow_up_timeout)
            .finish()
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|entry| !entry.is_empty())
}

fn config_error(err: impl std::fmt::Display) -> CollectError {
    CollectError::Config(err.to_string())
}

fn duration_var<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, CollectError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(Ok(default), |value| {
        humantime::parse_duration(value.trim())
            .map_err(|e| CollectError::Config(format!("{key} '{value}': {e}")))
    })
}
