//! Data models for collected records.
//!
//! This module contains the normalized row shapes for both sources.

pub mod batch;
pub mod issue;
pub mod question;

pub use batch::RecordBatch;
pub use issue::IssueRecord;
pub use question::QaRecord;
