//! Q&A source adapter.
//!
//! Scrapes question summaries from a search results page, then follows each
//! question link to read the first post body on the question page.
//!
//! One top-level request is made per invocation plus one follow-up per
//! matched summary, sequentially. Follow-up failures leave the answer empty
//! and never fail the invocation.

use super::Source;
use crate::error::CollectError;
use crate::metrics::SourceMetrics;
use async_trait::async_trait;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use shared::config::{LookbackWindow, SourceSpec};
use shared::models::{QaRecord, RecordBatch};
use std::time::Duration;
use url::Url;

const SUMMARY_SELECTOR: &str = ".question-summary";
const HYPERLINK_SELECTOR: &str = ".question-hyperlink";
const EXCERPT_SELECTOR: &str = ".excerpt";
const POST_BODY_SELECTOR: &str = ".js-post-body";

/// Deadlines for Q&A requests.
#[derive(Debug, Clone, Copy)]
pub struct QuestionSettings {
    /// Deadline for the search page request.
    pub request_timeout: Duration,
    /// Deadline for each question page request.
    pub follow_up_timeout: Duration,
}

impl Default for QuestionSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            follow_up_timeout: Duration::from_secs(15),
        }
    }
}

/// Extracts the question identifier from a question link.
///
/// Reads the digits immediately following `/questions/`, so a trailing slug
/// is ignored.
///
/// # Example
///
/// ```
/// use collector::sources::question_id_from_href;
///
/// assert_eq!(question_id_from_href("/questions/42/how-to"), Some(42));
/// assert_eq!(question_id_from_href("/tags/rust"), None);
/// ```
#[must_use]
pub fn question_id_from_href(href: &str) -> Option<i64> {
    let (_, rest) = href.split_once("/questions/")?;
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// A question summary as read from the search page.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QuestionSummary {
    question_id: i64,
    href: Option<String>,
    title: String,
    excerpt: String,
}

struct PageSelectors {
    summary: Selector,
    hyperlink: Selector,
    excerpt: Selector,
    post_body: Selector,
}

impl PageSelectors {
    fn new() -> Result<Self, CollectError> {
        let parse = |selector: &str| {
            Selector::parse(selector)
                .map_err(|e| CollectError::Parse(format!("selector {selector}: {e}")))
        };

        Ok(Self {
            summary: parse(SUMMARY_SELECTOR)?,
            hyperlink: parse(HYPERLINK_SELECTOR)?,
            excerpt: parse(EXCERPT_SELECTOR)?,
            post_body: parse(POST_BODY_SELECTOR)?,
        })
    }

    fn summaries(&self, page: &str) -> Vec<QuestionSummary> {
        let document = Html::parse_document(page);

        document
            .select(&self.summary)
            .map(|summary| {
                let href = summary
                    .select(&self.hyperlink)
                    .next()
                    .and_then(|link| link.value().attr("href"))
                    .map(str::to_string);

                QuestionSummary {
                    question_id: href
                        .as_deref()
                        .and_then(question_id_from_href)
                        .unwrap_or_default(),
                    href,
                    title: text_of(summary.select(&self.hyperlink)),
                    excerpt: text_of(summary.select(&self.excerpt)),
                }
            })
            .collect()
    }

    fn first_post_body(&self, page: &str) -> String {
        let document = Html::parse_document(page);
        text_of(document.select(&self.post_body).take(1))
    }
}

fn text_of<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> String {
    elements
        .flat_map(|element| element.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Adapter for one search topic.
pub struct QuestionSource {
    spec: SourceSpec,
    client: reqwest::Client,
    search_url: Url,
    site_root: Url,
    settings: QuestionSettings,
    selectors: PageSelectors,
    metrics: SourceMetrics,
}

impl QuestionSource {
    /// Creates an adapter for the given search source.
    ///
    /// # Errors
    ///
    /// Returns `CollectError::Config` if the search URL cannot be parsed.
    pub fn new(
        spec: SourceSpec,
        client: reqwest::Client,
        settings: QuestionSettings,
        metrics: SourceMetrics,
    ) -> Result<Self, CollectError> {
        let search_url = Url::parse(&spec.url).map_err(|e| {
            CollectError::Config(format!("invalid search URL {}: {e}", spec.url))
        })?;
        let site_root = search_url.join("/").map_err(|e| {
            CollectError::Config(format!("search URL {} has no site root: {e}", spec.url))
        })?;

        Ok(Self {
            spec,
            client,
            search_url,
            site_root,
            settings,
            selectors: PageSelectors::new()?,
            metrics,
        })
    }

    /// Search URL with the `startdate` parameter for the window attached.
    fn dated_search_url(&self, window: LookbackWindow) -> Url {
        let start = window.since(Utc::now()).timestamp();
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("startdate", &start.to_string());
        url
    }

    async fn fetch_page(&self, url: Url, timeout: Duration) -> Result<String, CollectError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| CollectError::remote(url.as_str(), e))?;

        response
            .text()
            .await
            .map_err(|e| CollectError::remote(url.as_str(), e))
    }

    async fn fetch_answer(&self, href: &str) -> Result<String, CollectError> {
        let url = self
            .site_root
            .join(href)
            .map_err(|e| CollectError::Parse(format!("question link {href}: {e}")))?;
        let page = self
            .fetch_page(url, self.settings.follow_up_timeout)
            .await?;
        Ok(self.selectors.first_post_body(&page))
    }
}

#[async_trait]
impl Source for QuestionSource {
    fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    async fn collect(&self, window: LookbackWindow) -> Result<RecordBatch, CollectError> {
        self.metrics.record_call(&self.spec.label);

        let url = self.dated_search_url(window);
        tracing::debug!(query = %self.spec.label, %url, "Fetching search page");

        let page = self.fetch_page(url, self.settings.request_timeout).await?;
        let summaries = self.selectors.summaries(&page);

        let mut records = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let answer_body = match summary.href.as_deref() {
                Some(href) => self.fetch_answer(href).await.unwrap_or_else(|e| {
                    tracing::debug!(
                        query = %self.spec.label,
                        question_id = summary.question_id,
                        error = %e,
                        "Answer fetch failed, keeping question without answer"
                    );
                    String::new()
                }),
                None => String::new(),
            };

            records.push(QaRecord::new(
                summary.question_id,
                summary.title,
                summary.excerpt,
                answer_body,
            ));
        }

        tracing::debug!(
            query = %self.spec.label,
            questions = records.len(),
            answered = records.iter().filter(|r| r.has_answer()).count(),
            "Parsed search page"
        );
        self.metrics.record_items(&self.spec.label, records.len());

        Ok(RecordBatch::Questions(records))
    }
}
