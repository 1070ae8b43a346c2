//! Page fetching and HTML extraction for news sources.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Indexing**: fetch a source's front page ([`fetch`]) and pull headline
//!    candidates out of it with the source's selectors ([`extract`])
//! 2. **Enrichment**: fetch an accepted article and keep a short excerpt of its
//!    body text for the summarizer ([`enrich`])
//!
//! Sources have no dedicated modules; the differences between sites live
//! entirely in their [`Selectors`](crate::models::Selectors).

pub mod enrich;
pub mod extract;
pub mod fetch;

use crate::utils::collapse_whitespace;
use scraper::ElementRef;

/// Visible text of an element with whitespace collapsed.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}
