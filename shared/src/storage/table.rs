//! Table contracts for the append-only record store.
//!
//! Each table carries an auto-assigned surrogate `id` plus the source columns.
//! The source identifier has no uniqueness constraint.

use serde::{Deserialize, Serialize};

/// The tables records are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// `github_issues(id, issue_id, title, body)`
    Issues,
    /// `questions(id, question_id, title, question_body, answer_body)`
    Questions,
}

impl Table {
    /// Table name in the database.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Issues => "github_issues",
            Self::Questions => "questions",
        }
    }

    /// Idempotent DDL creating the table.
    #[must_use]
    pub fn create_sql(self) -> &'static str {
        match self {
            Self::Issues => {
                r"
                CREATE TABLE IF NOT EXISTS github_issues (
                    id SERIAL PRIMARY KEY,
                    issue_id BIGINT NOT NULL,
                    title TEXT NOT NULL,
                    body TEXT NOT NULL
                )
                "
            }
            Self::Questions => {
                r"
                CREATE TABLE IF NOT EXISTS questions (
                    id SERIAL PRIMARY KEY,
                    question_id BIGINT,
                    title TEXT,
                    question_body TEXT,
                    answer_body TEXT
                )
                "
            }
        }
    }

    /// Parameterized single-row insert with positional bind parameters.
    #[must_use]
    pub fn insert_sql(self) -> &'static str {
        match self {
            Self::Issues => "INSERT INTO github_issues (issue_id, title, body) VALUES ($1, $2, $3)",
            Self::Questions => {
                "INSERT INTO questions (question_id, title, question_body, answer_body) \
                 VALUES ($1, $2, $3, $4)"
            }
        }
    }

    /// Row count query.
    #[must_use]
    pub fn count_sql(self) -> &'static str {
        match self {
            Self::Issues => "SELECT COUNT(*) FROM github_issues",
            Self::Questions => "SELECT COUNT(*) FROM questions",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
