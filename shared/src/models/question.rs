//! Question/answer record model.

use serde::{Deserialize, Serialize};

/// A question scraped from a Q&A search page, paired with its top answer.
///
/// `question_id` is `0` when the question link could not be parsed; such rows
/// are still stored. `answer_body` is empty when the answer page could not be
/// fetched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QaRecord {
    /// Identifier parsed from the question link.
    pub question_id: i64,
    /// Question title.
    pub title: String,
    /// Question excerpt as shown on the search page.
    pub question_body: String,
    /// Body of the first post on the question page.
    pub answer_body: String,
}

impl QaRecord {
    /// Creates a new question/answer record.
    #[must_use]
    pub fn new(
        question_id: i64,
        title: impl Into<String>,
        question_body: impl Into<String>,
        answer_body: impl Into<String>,
    ) -> Self {
        Self {
            question_id,
            title: title.into(),
            question_body: question_body.into(),
            answer_body: answer_body.into(),
        }
    }

    /// Returns true if the follow-up fetch produced an answer body.
    #[must_use]
    pub fn has_answer(&self) -> bool {
        !self.answer_body.is_empty()
    }

    /// Renders the record as a human-readable block for the given query label.
    #[must_use]
    pub fn describe(&self, query: &str) -> String {
        format!(
            "Query: {query}\nQuestion ID: {}\nTitle: {}\nQuestion Body: {}\nAnswer Body: {}\n",
            self.question_id, self.title, self.question_body, self.answer_body
        )
    }
}
