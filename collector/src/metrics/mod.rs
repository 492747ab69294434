//! Metrics collection module for collection observability.
//!
//! This module owns the counters and rate gauges published on `/metrics`.

pub mod registry;

pub use registry::{MetricsRegistry, SourceMetrics};
