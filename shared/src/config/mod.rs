//! Configuration types for the collection matrix.
//!
//! This module contains the source definitions and lookback windows that make
//! up the ordered cross-product the scheduler walks.

pub mod source;
pub mod window;

pub use source::{SourceConfigError, SourceKind, SourceSpec};
pub use window::{LookbackWindow, DEFAULT_WINDOWS};
