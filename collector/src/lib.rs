//! Threadwatch Collector
//!
//! This crate collects issue threads from a code-hosting API and
//! question/answer threads from a Q&A site, stores them in `PostgreSQL`, and
//! publishes per-source counters and rates for Prometheus.
//!
//! # Architecture
//!
//! Two tasks run side by side:
//! - the [`Scheduler`] walks every (source, lookback window) pair once
//! - an Axum server answers `GET /metrics` and `GET /health` until shutdown
//!
//! # Example
//!
//! ```no_run
//! use collector::run_collector;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_collector().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
mod routes;
pub mod scheduler;
pub mod sources;

pub use config::Config;
pub use error::CollectError;
pub use metrics::MetricsRegistry;
pub use scheduler::{MatrixSummary, Scheduler};

use anyhow::{Context, Result};
use axum::Router;
use db::Database;
use shared::storage::{PostgresRecordStore, RecordStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

/// Runs the collector.
///
/// Loads configuration from environment variables, then behaves as
/// [`run_collector_with_config`].
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The database cannot be reached
/// - The metrics server fails to bind to the configured address
pub async fn run_collector() -> Result<()> {
    let config = Config::from_env()?;
    run_collector_with_config(config).await
}

/// Runs the collector with the provided configuration.
///
/// The collection matrix runs once in the background. The metrics server
/// keeps serving the last values afterwards, until SIGTERM/SIGINT.
///
/// # Errors
///
/// Returns an error if:
/// - The database cannot be reached
/// - An adapter cannot be built from the configuration
/// - The metrics server fails to bind to the configured address
pub async fn run_collector_with_config(config: Config) -> Result<()> {
    let addr = config.socket_addr()?;

    tracing::info!(
        sources = config.sources.len(),
        windows = config.windows.len(),
        database = %config.database,
        "Threadwatch collector starting"
    );

    let metrics = MetricsRegistry::new().context("Failed to register metrics")?;

    let db = Database::connect(&config.database).await?;
    db.ping().await?;
    tracing::info!(host = %config.database.host, "Connected to database");

    let store: Arc<dyn RecordStore> = Arc::new(PostgresRecordStore::new(db.pool()));
    let scheduler = Scheduler::from_config(&config, store, metrics.clone())?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics server to {addr}"))?;
    tracing::info!(%addr, "Serving metrics");

    let matrix = tokio::spawn(async move { scheduler.run_matrix().await });
    let matrix_abort = matrix.abort_handle();
    let collection = tokio::spawn(report_collection(matrix));

    axum::serve(listener, create_router(metrics))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    matrix_abort.abort();
    collection.await.ok();
    tracing::info!("Collector shutdown complete");
    Ok(())
}

/// Waits for the collection task and logs how it ended.
///
/// Returns the summary if the matrix ran to completion.
async fn report_collection(task: JoinHandle<MatrixSummary>) -> Option<MatrixSummary> {
    match task.await {
        Ok(summary) => {
            tracing::info!(
                iterations = summary.iterations,
                fetch_failures = summary.fetch_failures,
                store_failures = summary.store_failures,
                rows_stored = summary.rows_stored,
                "Collection matrix complete, holding for metrics scrapes"
            );
            Some(summary)
        }
        Err(e) if e.is_cancelled() => {
            tracing::debug!("Collection task cancelled");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "Collection task panicked");
            None
        }
    }
}

/// Creates the router serving metrics and health checks.
///
/// This function is public to allow testing the router without starting a full server.
pub fn create_router(metrics: MetricsRegistry) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::metrics_routes(metrics))
        .layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
