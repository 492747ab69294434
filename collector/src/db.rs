//! Database connection module for `PostgreSQL`.
//!
//! Holds the connection parameters read from the environment and the single
//! long-lived pool shared by the record store.

use crate::error::CollectError;
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::str::FromStr;

/// TLS requirement for the database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// Refuse to connect without TLS.
    #[default]
    Require,
    /// Connect without TLS.
    Disable,
}

impl FromStr for SslMode {
    type Err = CollectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "require" => Ok(Self::Require),
            "disable" => Ok(Self::Disable),
            other => Err(CollectError::Config(format!(
                "DB_SSLMODE must be 'require' or 'disable', got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for SslMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Require => write!(f, "require"),
            Self::Disable => write!(f, "disable"),
        }
    }
}

/// Database configuration loaded from environment variables.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Username for authentication.
    pub user: String,
    /// Password for authentication.
    pub password: String,
    /// Database name.
    pub name: String,
    /// TLS mode.
    pub ssl_mode: SslMode,
}

impl DatabaseConfig {
    /// Load database configuration through a variable lookup.
    ///
    /// # Environment Variables
    ///
    /// - `DB_HOST`: Database host (required)
    /// - `DB_PORT`: Database port (default: 5432)
    /// - `DB_USER`: Database user (required)
    /// - `DB_PASSWORD`: Database password (default: empty)
    /// - `DB_NAME`: Database name (required)
    /// - `DB_SSLMODE`: `require` or `disable` (default: `require`)
    ///
    /// # Errors
    ///
    /// Returns `CollectError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CollectError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| CollectError::Config(format!("{key} must be set")))
        };

        let port = lookup("DB_PORT")
            .map(|p| {
                p.trim()
                    .parse::<u16>()
                    .map_err(|e| CollectError::Config(format!("DB_PORT '{p}': {e}")))
            })
            .transpose()?
            .unwrap_or(5432);

        let ssl_mode = lookup("DB_SSLMODE")
            .map(|mode| mode.parse::<SslMode>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            host: required("DB_HOST")?,
            port,
            user: required("DB_USER")?,
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            name: required("DB_NAME")?,
            ssl_mode,
        })
    }

    /// Connection options for the pool.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(match self.ssl_mode {
                SslMode::Require => PgSslMode::Require,
                SslMode::Disable => PgSslMode::Disable,
            })
    }
}

/// Keyword/value form with the password masked, for logs.
impl std::fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "host={} port={} user={} password=*** dbname={} sslmode={}",
            self.host, self.port, self.user, self.name, self.ssl_mode
        )
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DatabaseConfig({self})")
    }
}

/// Database handle providing connection pooling.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Opens the connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached or rejects the
    /// credentials.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(config.connect_options())
            .await
            .with_context(|| format!("Failed to connect to database ({config})"))?;

        Ok(Self { pool })
    }

    /// Get a handle to the underlying pool.
    #[must_use]
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    /// Test database connectivity by executing a simple query.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached or the query fails.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Failed to ping database")?;
        Ok(())
    }
}
