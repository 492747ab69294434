//! Record storage trait and the in-memory implementation.
//!
//! Provides the `RecordStore` trait for abstracting append-only record
//! storage and an `InMemoryRecordStore` for development and testing.

use super::Table;
use crate::models::{IssueRecord, QaRecord, RecordBatch};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Creating the table failed.
    #[error("Failed to create table {table}: {message}")]
    Schema {
        /// Table whose DDL failed.
        table: Table,
        /// Backend error message.
        message: String,
    },

    /// Inserting a row failed. Rows before `index` remain committed.
    #[error("Failed to insert row {index} into {table}: {message}")]
    Insert {
        /// Table the row was destined for.
        table: Table,
        /// Position of the failing record within its batch.
        index: usize,
        /// Backend error message.
        message: String,
    },

    /// A read query failed.
    #[error("Failed to query {table}: {message}")]
    Query {
        /// Table being read.
        table: Table,
        /// Backend error message.
        message: String,
    },

    /// Failed to acquire lock on the store.
    #[error("Failed to acquire lock on record store")]
    LockError,
}

/// Trait for append-only record storage.
///
/// Implementations create each table on first use and insert records one
/// statement at a time in batch order. A batch is not transactional: on the
/// first failing row the error is returned and earlier rows stay written.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Writes every record of the batch, returning the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Schema` if the table cannot be created and
    /// `StoreError::Insert` for the first row that fails.
    async fn save(&self, batch: &RecordBatch) -> Result<usize, StoreError>;

    /// Returns the number of rows in the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the count query fails.
    async fn count(&self, table: Table) -> Result<usize, StoreError>;
}

/// A stored row with its surrogate key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow<T> {
    /// Auto-assigned, monotonically increasing key.
    pub id: u64,
    /// The record as written.
    pub record: T,
}

#[derive(Debug, Default)]
struct Tables {
    created: HashSet<Table>,
    next_id: u64,
    issues: Vec<StoredRow<IssueRecord>>,
    questions: Vec<StoredRow<QaRecord>>,
}

impl Tables {
    fn assign_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory record store implementation.
///
/// Rows are kept in `Vec`s behind a `RwLock`. Surrogate ids are assigned per
/// store in insertion order, mirroring a `SERIAL` column.
///
/// **Note:** Data is not persisted across restarts.
///
/// # Example
///
/// ```
/// use shared::models::{IssueRecord, RecordBatch};
/// use shared::storage::{InMemoryRecordStore, RecordStore, Table};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryRecordStore::new();
/// let batch = RecordBatch::Issues(vec![IssueRecord::new(1, "a", "x")]);
///
/// assert_eq!(store.save(&batch).await.unwrap(), 1);
/// assert_eq!(store.count(Table::Issues).await.unwrap(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRecordStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory store wrapped in an Arc.
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns a snapshot of the stored issues.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn issues(&self) -> Result<Vec<StoredRow<IssueRecord>>, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::LockError)?;
        Ok(tables.issues.clone())
    }

    /// Returns a snapshot of the stored questions.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn questions(&self) -> Result<Vec<StoredRow<QaRecord>>, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::LockError)?;
        Ok(tables.questions.clone())
    }

    /// Returns true once the table has been created.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn has_table(&self, table: Table) -> Result<bool, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::LockError)?;
        Ok(tables.created.contains(&table))
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn save(&self, batch: &RecordBatch) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::LockError)?;
        tables.created.insert(batch.table());

        match batch {
            RecordBatch::Issues(issues) => {
                for issue in issues {
                    let id = tables.assign_id();
                    tables.issues.push(StoredRow {
                        id,
                        record: issue.clone(),
                    });
                }
            }
            RecordBatch::Questions(questions) => {
                for question in questions {
                    let id = tables.assign_id();
                    tables.questions.push(StoredRow {
                        id,
                        record: question.clone(),
                    });
                }
            }
        }

        Ok(batch.len())
    }

    async fn count(&self, table: Table) -> Result<usize, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::LockError)?;
        Ok(match table {
            Table::Issues => tables.issues.len(),
            Table::Questions => tables.questions.len(),
        })
    }
}
