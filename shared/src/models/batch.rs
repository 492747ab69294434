//! A batch of records returned by one adapter invocation.

use super::{IssueRecord, QaRecord};
use crate::storage::Table;

/// Records produced by a single (source, window) invocation, in production order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordBatch {
    /// Issues from the issue source.
    Issues(Vec<IssueRecord>),
    /// Question/answer pairs from the Q&A source.
    Questions(Vec<QaRecord>),
}

impl RecordBatch {
    /// Returns the number of records in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Issues(issues) => issues.len(),
            Self::Questions(questions) => questions.len(),
        }
    }

    /// Returns true if the batch holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the table this batch is written to.
    #[must_use]
    pub fn table(&self) -> Table {
        match self {
            Self::Issues(_) => Table::Issues,
            Self::Questions(_) => Table::Questions,
        }
    }

    /// Renders every record as a human-readable block, one per record.
    #[must_use]
    pub fn describe(&self, subject: &str) -> Vec<String> {
        match self {
            Self::Issues(issues) => issues.iter().map(|i| i.describe(subject)).collect(),
            Self::Questions(questions) => questions.iter().map(|q| q.describe(subject)).collect(),
        }
    }
}
