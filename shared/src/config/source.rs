//! Source definitions for the collection matrix.
//!
//! A source pairs an adapter kind with the label its metrics are reported
//! under and the URL the adapter reads from.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Errors raised while building source and window configuration.
#[derive(Debug, Error)]
pub enum SourceConfigError {
    /// A Q&A entry was not of the form `label=url`.
    #[error("Invalid Q&A search entry '{0}': expected label=url")]
    InvalidSearchEntry(String),

    /// A lookback window could not be parsed as a duration.
    #[error("Invalid lookback window '{value}': {source}")]
    InvalidWindow {
        /// The raw value that failed to parse.
        value: String,
        /// Underlying parse error.
        source: humantime::DurationError,
    },

    /// No lookback windows were configured.
    #[error("At least one lookback window is required")]
    NoWindows,

    /// Source validation failed.
    #[error("Invalid source: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// The adapter a source is collected with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Issue threads from a source-code-hosting API.
    Issues,
    /// Question/answer threads scraped from a Q&A site.
    Questions,
}

impl SourceKind {
    /// Prefix used for this source's metric names.
    #[must_use]
    pub fn metric_prefix(self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::Questions => "qa",
        }
    }

    /// Name of the label that distinguishes series of this source.
    #[must_use]
    pub fn label_name(self) -> &'static str {
        match self {
            Self::Issues => "repository",
            Self::Questions => "query",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Issues => write!(f, "issues"),
            Self::Questions => write!(f, "questions"),
        }
    }
}

/// A single configured source.
///
/// # Example
///
/// ```
/// use shared::config::{SourceKind, SourceSpec};
///
/// let source = SourceSpec::issues("https://github.com/example/repo");
/// assert_eq!(source.kind, SourceKind::Issues);
/// assert_eq!(source.label, "example/repo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SourceSpec {
    /// Adapter kind.
    pub kind: SourceKind,

    /// Metric label value for this source.
    #[validate(length(min = 1, message = "Source label cannot be empty"))]
    pub label: String,

    /// Repository URL (issues) or search URL (questions).
    #[validate(url(message = "Source URL must be a valid URL"))]
    pub url: String,
}

impl SourceSpec {
    /// Creates an issue source for a repository URL.
    ///
    /// The label is the `owner/repo` path of the URL. If the URL has no
    /// path, the raw URL is used instead so the source is still reported.
    #[must_use]
    pub fn issues(repo_url: impl Into<String>) -> Self {
        let url = repo_url.into();
        let label = url::Url::parse(&url)
            .ok()
            .map(|parsed| parsed.path().trim_matches('/').to_string())
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| url.clone());

        Self {
            kind: SourceKind::Issues,
            label,
            url,
        }
    }

    /// Creates a Q&A source for a search URL and topic label.
    #[must_use]
    pub fn questions(label: impl Into<String>, search_url: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Questions,
            label: label.into(),
            url: search_url.into(),
        }
    }

    /// Parses a `label=search_url` entry.
    ///
    /// Only the first `=` separates the label, so the URL may carry its own
    /// query string.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry has no `=` or either side is empty.
    pub fn parse_search_entry(entry: &str) -> Result<Self, SourceConfigError> {
        let (label, url) = entry
            .trim()
            .split_once('=')
            .ok_or_else(|| SourceConfigError::InvalidSearchEntry(entry.to_string()))?;

        let (label, url) = (label.trim(), url.trim());
        if label.is_empty() || url.is_empty() {
            return Err(SourceConfigError::InvalidSearchEntry(entry.to_string()));
        }

        Ok(Self::questions(label, url))
    }

    /// Name shown in the record dump: the repository URL for issues, the
    /// topic label for Q&A searches.
    #[must_use]
    pub fn subject(&self) -> &str {
        match self.kind {
            SourceKind::Issues => &self.url,
            SourceKind::Questions => &self.label,
        }
    }

    /// Validates the source.
    ///
    /// # Errors
    ///
    /// Returns an error if the label is empty or the URL is malformed.
    pub fn validate_source(&self) -> Result<(), SourceConfigError> {
        self.validate()?;
        Ok(())
    }
}
