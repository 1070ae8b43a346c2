//! Best-effort article body extraction for the summarizer.
//!
//! The article page is fetched and a fixed list of paragraph selectors is
//! tried, most specific first. The first selector whose first three matches
//! add up to more than [`MIN_BODY_CHARS`] characters wins; if none does, the
//! last non-empty attempt is kept. The result is capped at
//! [`MAX_CONTENT_CHARS`].
//!
//! The 100 character threshold is a tuning knob, not a contract.

use super::element_text;
use super::fetch::PageFetcher;
use crate::error::EnrichError;
use crate::utils::truncate_chars;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

/// Paragraph selectors tried in order.
pub const BODY_SELECTORS: &[&str] = &[
    "article p",
    ".article-content p",
    ".content p",
    ".story-body p",
    ".post-content p",
    "main p",
];

/// Paragraphs joined per selector attempt.
pub const PARAGRAPHS_PER_ATTEMPT: usize = 3;

/// An attempt must be longer than this to stop the search.
pub const MIN_BODY_CHARS: usize = 100;

/// Upper bound on returned content.
pub const MAX_CONTENT_CHARS: usize = 800;

static COMPILED_BODY_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    BODY_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

/// Body excerpt of an article page, or `None` when no selector matched text.
pub fn extract_body_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let mut last_attempt: Option<String> = None;

    for selector in COMPILED_BODY_SELECTORS.iter() {
        let paragraphs: Vec<String> = document
            .select(selector)
            .take(PARAGRAPHS_PER_ATTEMPT)
            .map(|p| element_text(&p))
            .filter(|t| !t.is_empty())
            .collect();
        if paragraphs.is_empty() {
            continue;
        }

        let joined = paragraphs.join(" ");
        let long_enough = joined.chars().count() > MIN_BODY_CHARS;
        last_attempt = Some(joined);
        if long_enough {
            break;
        }
    }

    last_attempt.map(|content| truncate_chars(&content, MAX_CONTENT_CHARS).to_string())
}

/// Fetches accepted articles and extracts their body text.
#[derive(Debug, Clone, Copy)]
pub struct ContentEnricher<'a> {
    fetcher: &'a PageFetcher,
}

impl<'a> ContentEnricher<'a> {
    pub fn new(fetcher: &'a PageFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetch `link` and extract its body text.
    pub async fn try_enrich(&self, link: &str) -> Result<String, EnrichError> {
        let html = self.fetcher.fetch_article(link).await?;
        extract_body_text(&html).ok_or_else(|| EnrichError::NoContent {
            url: link.to_string(),
        })
    }

    /// [`try_enrich`](Self::try_enrich), degrading every failure to an empty string.
    #[instrument(level = "debug", skip(self))]
    pub async fn enrich(&self, link: &str) -> String {
        match self.try_enrich(link).await {
            Ok(content) => {
                debug!(chars = content.chars().count(), "Enriched article");
                content
            }
            Err(e) => {
                warn!(%link, error = %e, "Article enrichment failed; continuing without content");
                String::new()
            }
        }
    }
}
