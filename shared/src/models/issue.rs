//! Issue record model.
//!
//! Defines the normalized row shape produced by the issue source adapter.

use serde::{Deserialize, Serialize};

/// A single issue retrieved from a source-code-hosting service.
///
/// The identifier is the one assigned by the remote service. It is not unique
/// in the store: repeated collection runs append duplicate rows.
///
/// # Example
///
/// ```
/// use shared::models::IssueRecord;
///
/// let issue = IssueRecord::new(1, "Crash on startup", "");
/// assert_eq!(issue.issue_id, 1);
/// assert!(issue.body.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Identifier supplied by the remote service.
    pub issue_id: i64,
    /// Issue title.
    pub title: String,
    /// Issue body, possibly empty.
    pub body: String,
}

impl IssueRecord {
    /// Creates a new issue record.
    #[must_use]
    pub fn new(issue_id: i64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            issue_id,
            title: title.into(),
            body: body.into(),
        }
    }

    /// Renders the record as a human-readable block for the given repository.
    ///
    /// # Example
    ///
    /// ```
    /// use shared::models::IssueRecord;
    ///
    /// let dump = IssueRecord::new(7, "a", "x").describe("https://github.com/example/repo");
    /// assert!(dump.starts_with("Repository: https://github.com/example/repo\n"));
    /// assert!(dump.contains("Issue ID: 7\n"));
    /// ```
    #[must_use]
    pub fn describe(&self, repository: &str) -> String {
        format!(
            "Repository: {repository}\nIssue ID: {}\nTitle: {}\nBody: {}\n",
            self.issue_id, self.title, self.body
        )
    }
}
