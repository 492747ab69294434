//! Threadwatch Shared Library
//!
//! This crate contains the record models, source configuration, and storage
//! used by the Threadwatch collector.
//!
//! # Modules
//!
//! - [`models`] - Issue and question/answer records
//! - [`config`] - Sources and lookback windows of the collection matrix
//! - [`storage`] - Append-only record storage
//!
//! # Example
//!
//! ```
//! use shared::config::{LookbackWindow, SourceSpec};
//!
//! let source = SourceSpec::issues("https://github.com/example/repo");
//! let windows = LookbackWindow::parse_list("48h,7d").unwrap();
//!
//! assert_eq!(source.label, "example/repo");
//! assert_eq!(windows.len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod models;
pub mod storage;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
pub use validator;
