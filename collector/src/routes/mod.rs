//! HTTP route definitions.
//!
//! This module organizes the routes served next to the collection worker.

mod health;
mod metrics;

pub use health::health_routes;
pub use metrics::metrics_routes;
