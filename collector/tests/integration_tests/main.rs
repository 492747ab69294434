//! Integration tests for the Threadwatch collector.
//!
//! These tests run the full collection matrix against mock remote services
//! and an in-memory record store, then scrape the metrics endpoint.

mod common;
mod matrix_tests;
mod metrics_tests;
