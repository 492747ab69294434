//! Per-source collection counters and rate gauges.
//!
//! Every source kind owns four series, prefixed by the kind so both sources
//! can share one process:
//!
//! - `<prefix>_api_calls_total` (counter)
//! - `<prefix>_data_collected_total` (counter)
//! - `<prefix>_api_calls_per_second` (gauge)
//! - `<prefix>_data_collected_per_second` (gauge)
//!
//! Issue series are labeled by `repository`, Q&A series by `query`.

use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};
use shared::config::{LookbackWindow, SourceKind};

/// The four series of one source kind.
///
/// Cloning is cheap and shares the underlying series.
#[derive(Clone)]
pub struct SourceMetrics {
    api_calls: IntCounterVec,
    data_collected: IntCounterVec,
    api_calls_per_second: GaugeVec,
    data_collected_per_second: GaugeVec,
}

impl SourceMetrics {
    fn register(kind: SourceKind, registry: &Registry) -> Result<Self, prometheus::Error> {
        let prefix = kind.metric_prefix();
        let labels = [kind.label_name()];

        let api_calls = IntCounterVec::new(
            Opts::new(
                format!("{prefix}_api_calls_total"),
                format!("Total number of {kind} API calls"),
            ),
            &labels,
        )?;
        registry.register(Box::new(api_calls.clone()))?;

        let data_collected = IntCounterVec::new(
            Opts::new(
                format!("{prefix}_data_collected_total"),
                format!("Total number of {kind} records collected"),
            ),
            &labels,
        )?;
        registry.register(Box::new(data_collected.clone()))?;

        let api_calls_per_second = GaugeVec::new(
            Opts::new(
                format!("{prefix}_api_calls_per_second"),
                format!("{kind} API calls per second of lookback window"),
            ),
            &labels,
        )?;
        registry.register(Box::new(api_calls_per_second.clone()))?;

        let data_collected_per_second = GaugeVec::new(
            Opts::new(
                format!("{prefix}_data_collected_per_second"),
                format!("{kind} records collected per second of lookback window"),
            ),
            &labels,
        )?;
        registry.register(Box::new(data_collected_per_second.clone()))?;

        Ok(Self {
            api_calls,
            data_collected,
            api_calls_per_second,
            data_collected_per_second,
        })
    }

    /// Counts one adapter invocation.
    pub fn record_call(&self, label: &str) {
        self.api_calls.with_label_values(&[label]).inc();
    }

    /// Counts `count` collected records.
    pub fn record_items(&self, label: &str, count: usize) {
        self.data_collected
            .with_label_values(&[label])
            .inc_by(u64::try_from(count).unwrap_or(u64::MAX));
    }

    /// Current value of the calls counter.
    #[must_use]
    pub fn api_calls(&self, label: &str) -> u64 {
        self.api_calls.with_label_values(&[label]).get()
    }

    /// Current value of the items counter.
    #[must_use]
    pub fn data_collected(&self, label: &str) -> u64 {
        self.data_collected.with_label_values(&[label]).get()
    }

    /// Current value of the calls rate gauge.
    #[must_use]
    pub fn api_calls_per_second(&self, label: &str) -> f64 {
        self.api_calls_per_second.with_label_values(&[label]).get()
    }

    /// Current value of the items rate gauge.
    #[must_use]
    pub fn data_collected_per_second(&self, label: &str) -> f64 {
        self.data_collected_per_second
            .with_label_values(&[label])
            .get()
    }

    /// Sets both rate gauges to `counter / window_seconds`.
    ///
    /// Returns `false` without touching the gauges when the window has zero
    /// length.
    pub fn update_rates(&self, label: &str, window: LookbackWindow) -> bool {
        if window.is_zero() {
            return false;
        }
        let seconds = window.as_secs_f64();

        // Counter values stay far below 2^52
        #[allow(clippy::cast_precision_loss)]
        let (calls, items) = (
            self.api_calls(label) as f64,
            self.data_collected(label) as f64,
        );

        self.api_calls_per_second
            .with_label_values(&[label])
            .set(calls / seconds);
        self.data_collected_per_second
            .with_label_values(&[label])
            .set(items / seconds);
        true
    }
}

/// Process-wide metrics registry.
///
/// Owned by the entry point and handed by clone to the sources, the
/// scheduler, and the `/metrics` route. Series use atomic updates, so the
/// scheduler may write while the HTTP server gathers.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    issues: SourceMetrics,
    questions: SourceMetrics,
}

impl MetricsRegistry {
    /// Creates a registry with the series of both source kinds registered.
    ///
    /// # Errors
    ///
    /// Returns an error if a series cannot be created or registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let issues = SourceMetrics::register(SourceKind::Issues, &registry)?;
        let questions = SourceMetrics::register(SourceKind::Questions, &registry)?;

        Ok(Self {
            registry,
            issues,
            questions,
        })
    }

    /// Returns the series of the given source kind.
    #[must_use]
    pub fn for_source(&self, kind: SourceKind) -> &SourceMetrics {
        match kind {
            SourceKind::Issues => &self.issues,
            SourceKind::Questions => &self.questions,
        }
    }

    /// Content type of [`MetricsRegistry::encode`] output.
    #[must_use]
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Renders all series in the text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn window(secs: u64) -> LookbackWindow {
        LookbackWindow::new(Duration::from_secs(secs))
    }

    #[test]
    fn test_record_call_increments_by_one() {
        let metrics = MetricsRegistry::new().unwrap();
        let issues = metrics.for_source(SourceKind::Issues);

        issues.record_call("example/repo");

        assert_eq!(issues.api_calls("example/repo"), 1);
        assert_eq!(issues.api_calls("other/repo"), 0);
    }

    #[test]
    fn test_record_items_adds_count() {
        let metrics = MetricsRegistry::new().unwrap();
        let questions = metrics.for_source(SourceKind::Questions);

        questions.record_items("topic", 2);
        questions.record_items("topic", 0);
        questions.record_items("topic", 3);

        assert_eq!(questions.data_collected("topic"), 5);
    }

    #[test]
    fn test_sources_do_not_share_series() {
        let metrics = MetricsRegistry::new().unwrap();

        metrics.for_source(SourceKind::Issues).record_call("same");

        assert_eq!(metrics.for_source(SourceKind::Issues).api_calls("same"), 1);
        assert_eq!(
            metrics.for_source(SourceKind::Questions).api_calls("same"),
            0
        );
    }

    #[test]
    fn test_update_rates_divides_by_window() {
        let metrics = MetricsRegistry::new().unwrap();
        let issues = metrics.for_source(SourceKind::Issues);
        issues.record_call("r");
        issues.record_call("r");
        issues.record_items("r", 4);

        assert!(issues.update_rates("r", window(7200)));

        assert!((issues.api_calls_per_second("r") - 2.0 / 7200.0).abs() < f64::EPSILON);
        assert!((issues.data_collected_per_second("r") - 4.0 / 7200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_rates_with_zero_items_sets_zero_gauge() {
        let metrics = MetricsRegistry::new().unwrap();
        let issues = metrics.for_source(SourceKind::Issues);
        issues.record_call("r");

        assert!(issues.update_rates("r", window(3600)));

        assert!(issues.api_calls_per_second("r") > 0.0);
        assert!(issues.data_collected_per_second("r").abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_rates_skips_zero_window() {
        let metrics = MetricsRegistry::new().unwrap();
        let questions = metrics.for_source(SourceKind::Questions);
        questions.record_call("topic");
        questions.update_rates("topic", window(10));
        let before = questions.api_calls_per_second("topic");

        assert!(!questions.update_rates("topic", window(0)));

        assert!((questions.api_calls_per_second("topic") - before).abs() < f64::EPSILON);
        assert!(questions.api_calls_per_second("topic").is_finite());
    }

    #[test]
    fn test_encode_uses_prefixed_names_and_labels() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics
            .for_source(SourceKind::Issues)
            .record_call("example/repo");
        metrics.for_source(SourceKind::Questions).record_items("topic", 1);

        let text = metrics.encode().unwrap();

        assert!(text.contains("issues_api_calls_total{repository=\"example/repo\"} 1"));
        assert!(text.contains("qa_data_collected_total{query=\"topic\"} 1"));
        assert!(text.contains("# TYPE issues_api_calls_total counter"));
    }

    #[test]
    fn test_clones_share_series() {
        let metrics = MetricsRegistry::new().unwrap();
        let clone = metrics.clone();

        clone.for_source(SourceKind::Issues).record_call("r");

        assert_eq!(metrics.for_source(SourceKind::Issues).api_calls("r"), 1);
    }

    #[test]
    fn test_content_type_is_text_format() {
        let metrics = MetricsRegistry::new().unwrap();
        assert!(metrics.content_type().starts_with("text/plain"));
    }
}
