//! Error taxonomy for the collector.

use shared::storage::StoreError;
use thiserror::Error;

/// Errors raised while configuring or running the collection matrix.
///
/// Only [`CollectError::Config`] is fatal, and only at startup. Everything
/// else is logged with its (source, window) context and the run continues.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A repository URL did not have exactly two path segments.
    #[error("Invalid repository URL: {0}")]
    InvalidRepoUrl(String),

    /// Transport, authentication, timeout, or non-success status.
    #[error("Request to {url} failed: {source}")]
    RemoteFetch {
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode response from {url}: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder message.
        message: String,
    },

    /// A page or link could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Creating a table failed.
    #[error("Schema error: {0}")]
    Schema(#[source] StoreError),

    /// Writing a row failed.
    #[error("Insert error: {0}")]
    Insert(#[source] StoreError),
}

impl CollectError {
    pub(crate) fn remote(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::RemoteFetch {
            url: url.into(),
            source,
        }
    }
}

impl From<StoreError> for CollectError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Schema { .. } => Self::Schema(err),
            _ => Self::Insert(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::storage::Table;

    #[test]
    fn test_store_schema_error_maps_to_schema() {
        let err: CollectError = StoreError::Schema {
            table: Table::Issues,
            message: "permission denied".to_string(),
        }
        .into();

        assert!(matches!(err, CollectError::Schema(_)));
        assert!(err.to_string().contains("github_issues"));
    }

    #[test]
    fn test_store_insert_error_maps_to_insert() {
        let err: CollectError = StoreError::Insert {
            table: Table::Questions,
            index: 1,
            message: "value too long".to_string(),
        }
        .into();

        assert!(matches!(err, CollectError::Insert(_)));
    }

    #[test]
    fn test_invalid_repo_url_message() {
        let err = CollectError::InvalidRepoUrl("https://github.com/badurl".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid repository URL: https://github.com/badurl"
        );
    }
}
