//! Collection scheduler.
//!
//! Walks the matrix of sources and lookback windows once, in order. Each
//! iteration collects, prints, stores, and then refreshes the source's rate
//! gauges. Failures are logged and the walk moves on.

use crate::config::Config;
use crate::error::CollectError;
use crate::metrics::MetricsRegistry;
use crate::sources::{build_sources, http_client, Source};
use shared::config::LookbackWindow;
use shared::storage::{RecordStore, StoreError};
use std::sync::Arc;
use std::time::Duration;

/// Default pause between consecutive sources.
pub const DEFAULT_SOURCE_INTERVAL: Duration = Duration::from_secs(60);

/// Outcome counts of one pass over the matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatrixSummary {
    /// (source, window) pairs visited.
    pub iterations: usize,
    /// Iterations whose adapter call failed.
    pub fetch_failures: usize,
    /// Iterations whose batch was not fully stored.
    pub store_failures: usize,
    /// Rows written across all iterations.
    pub rows_stored: usize,
}

/// Drives every source over every lookback window.
pub struct Scheduler {
    sources: Vec<Box<dyn Source>>,
    windows: Vec<LookbackWindow>,
    store: Arc<dyn RecordStore>,
    metrics: MetricsRegistry,
    source_interval: Duration,
}

impl Scheduler {
    /// Creates a scheduler over the given sources and windows.
    #[must_use]
    pub fn new(
        sources: Vec<Box<dyn Source>>,
        windows: Vec<LookbackWindow>,
        store: Arc<dyn RecordStore>,
        metrics: MetricsRegistry,
    ) -> Self {
        Self {
            sources,
            windows,
            store,
            metrics,
            source_interval: DEFAULT_SOURCE_INTERVAL,
        }
    }

    /// Sets the pause between consecutive sources.
    #[must_use]
    pub fn with_source_interval(mut self, interval: Duration) -> Self {
        self.source_interval = interval;
        self
    }

    /// Builds the scheduler and its adapters from configuration.
    ///
    /// # Errors
    ///
    /// Returns `CollectError::Config` if the HTTP client or an adapter cannot
    /// be built.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn RecordStore>,
        metrics: MetricsRegistry,
    ) -> Result<Self, CollectError> {
        let client = http_client()?;
        let sources = build_sources(
            &config.sources,
            &client,
            config.issue_settings().as_ref(),
            &config.question_settings(),
            &metrics,
        )?;

        Ok(Self::new(sources, config.windows.clone(), store, metrics)
            .with_source_interval(config.source_interval))
    }

    /// Runs the matrix once and reports what happened.
    pub async fn run_matrix(&self) -> MatrixSummary {
        let mut summary = MatrixSummary::default();

        for (position, source) in self.sources.iter().enumerate() {
            if position > 0 && !self.source_interval.is_zero() {
                tracing::debug!(
                    interval = %humantime::format_duration(self.source_interval),
                    "Pausing before next source"
                );
                tokio::time::sleep(self.source_interval).await;
            }

            for window in &self.windows {
                self.run_iteration(source.as_ref(), *window, &mut summary)
                    .await;
            }
        }

        summary
    }

    async fn run_iteration(
        &self,
        source: &dyn Source,
        window: LookbackWindow,
        summary: &mut MatrixSummary,
    ) {
        let spec = source.spec();
        summary.iterations += 1;

        let batch = match source.collect(window).await {
            Ok(batch) => batch,
            Err(e) => {
                summary.fetch_failures += 1;
                tracing::warn!(
                    kind = %spec.kind,
                    source = %spec.label,
                    %window,
                    error = %e,
                    "Collection failed, skipping iteration"
                );
                return;
            }
        };

        tracing::info!(
            kind = %spec.kind,
            source = %spec.label,
            %window,
            records = batch.len(),
            "Collected records"
        );

        for block in batch.describe(spec.subject()) {
            println!("{block}");
        }

        match self.store.save(&batch).await {
            Ok(rows) => summary.rows_stored += rows,
            Err(e) => {
                summary.store_failures += 1;
                // rows before the failing one stay committed
                if let StoreError::Insert { index, .. } = &e {
                    summary.rows_stored += index;
                }
                let e = CollectError::from(e);
                tracing::error!(
                    kind = %spec.kind,
                    source = %spec.label,
                    %window,
                    error = %e,
                    "Failed to store batch"
                );
            }
        }

        if !self
            .metrics
            .for_source(spec.kind)
            .update_rates(&spec.label, window)
        {
            tracing::debug!(source = %spec.label, %window, "Zero window, rates left unchanged");
        }
    }
}
