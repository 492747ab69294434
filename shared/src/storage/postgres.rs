//! `PostgreSQL`-backed record store.

use super::{RecordStore, StoreError, Table};
use crate::models::{IssueRecord, QaRecord, RecordBatch};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Mutex;

/// `PostgreSQL` record store.
///
/// Shares one long-lived connection pool. Each table's DDL runs on the first
/// save for that table and is remembered only once it succeeds, so a failed
/// DDL is attempted again on the next save.
pub struct PostgresRecordStore {
    pool: PgPool,
    ready: Mutex<HashSet<Table>>,
}

impl PostgresRecordStore {
    /// Creates a new store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            ready: Mutex::new(HashSet::new()),
        }
    }

    fn is_ready(&self, table: Table) -> Result<bool, StoreError> {
        let ready = self.ready.lock().map_err(|_| StoreError::LockError)?;
        Ok(ready.contains(&table))
    }

    async fn ensure_schema(&self, table: Table) -> Result<(), StoreError> {
        if self.is_ready(table)? {
            return Ok(());
        }

        sqlx::query(table.create_sql())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Schema {
                table,
                message: e.to_string(),
            })?;

        tracing::debug!(%table, "Table ready");
        self.ready
            .lock()
            .map_err(|_| StoreError::LockError)?
            .insert(table);
        Ok(())
    }

    async fn insert_issues(&self, issues: &[IssueRecord]) -> Result<usize, StoreError> {
        let table = Table::Issues;
        for (index, issue) in issues.iter().enumerate() {
            sqlx::query(table.insert_sql())
                .bind(issue.issue_id)
                .bind(&issue.title)
                .bind(&issue.body)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Insert {
                    table,
                    index,
                    message: e.to_string(),
                })?;
        }
        Ok(issues.len())
    }

    async fn insert_questions(&self, questions: &[QaRecord]) -> Result<usize, StoreError> {
        let table = Table::Questions;
        for (index, question) in questions.iter().enumerate() {
            sqlx::query(table.insert_sql())
                .bind(question.question_id)
                .bind(&question.title)
                .bind(&question.question_body)
                .bind(&question.answer_body)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Insert {
                    table,
                    index,
                    message: e.to_string(),
                })?;
        }
        Ok(questions.len())
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn save(&self, batch: &RecordBatch) -> Result<usize, StoreError> {
        self.ensure_schema(batch.table()).await?;

        match batch {
            RecordBatch::Issues(issues) => self.insert_issues(issues).await,
            RecordBatch::Questions(questions) => self.insert_questions(questions).await,
        }
    }

    async fn count(&self, table: Table) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar(table.count_sql())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Query {
                table,
                message: e.to_string(),
            })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
