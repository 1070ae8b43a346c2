//! Front page headline extraction driven by per-source selectors.
//!
//! Containers are scanned in document order, at most [`MAX_CONTAINERS`] per
//! page. Each container contributes at most one [`CandidateItem`]: the first
//! title match and the first link match (or the container itself when it is
//! the link). Titles under [`MIN_TITLE_CHARS`] characters, empty hrefs,
//! `javascript:`/`mailto:` links and bare in-page anchors are dropped.
//!
//! Extraction never fails. A selector that does not compile is logged and
//! yields no candidates.

use super::element_text;
use crate::error::SelectorError;
use crate::models::{CandidateItem, Selectors};
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

/// Containers examined per page.
pub const MAX_CONTAINERS: usize = 100;

/// Shorter titles are navigation labels, not headlines.
pub const MIN_TITLE_CHARS: usize = 15;

struct CompiledSelectors {
    container: Selector,
    title: Selector,
    link: Selector,
}

impl CompiledSelectors {
    fn compile(selectors: &Selectors) -> Result<Self, SelectorError> {
        Ok(Self {
            container: parse_selector(&selectors.container)?,
            title: parse_selector(&selectors.title)?,
            link: parse_selector(&selectors.link)?,
        })
    }
}

fn parse_selector(raw: &str) -> Result<Selector, SelectorError> {
    Selector::parse(raw).map_err(|e| SelectorError {
        selector: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Extract headline candidates from `html`, resolving links against `base_url`.
///
/// # Arguments
///
/// * `html` - Front page markup
/// * `selectors` - The source's container/title/link selectors
/// * `base_url` - The source's front page URL, used by [`normalize_link`]
///
/// # Returns
///
/// Candidates in document order. Empty when a selector does not compile or
/// nothing on the page qualifies.
pub fn extract(html: &str, selectors: &Selectors, base_url: &str) -> Vec<CandidateItem> {
    let compiled = match CompiledSelectors::compile(selectors) {
        Ok(compiled) => compiled,
        Err(e) => {
            warn!(error = %e, base_url, "Selector does not compile; no candidates extracted");
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);
    let mut candidates = Vec::new();
    let mut scanned = 0usize;

    for container in document.select(&compiled.container).take(MAX_CONTAINERS) {
        scanned += 1;
        let Some(title_el) = container.select(&compiled.title).next() else {
            continue;
        };
        let title = element_text(&title_el);
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }

        let link_el = container.select(&compiled.link).next().unwrap_or(container);
        let Some(href) = link_el
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|h| !h.is_empty())
        else {
            continue;
        };
        if is_excluded_href(href) {
            continue;
        }

        let link = normalize_link(base_url, href);
        if link.is_empty() || is_excluded_href(&link) {
            continue;
        }
        candidates.push(CandidateItem { title, link });
    }

    debug!(scanned, candidates = candidates.len(), base_url, "Extracted candidates");
    candidates
}

/// `javascript:` and `mailto:` links, and anchors into the same page.
pub fn is_excluded_href(href: &str) -> bool {
    let href = href.trim().to_ascii_lowercase();
    href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:")
}

/// Resolve `href` against the source's `base_url`.
///
/// Every branch is serialized through [`Url`], so one article reached through
/// different href spellings (root-relative, relative, absolute, raw or
/// percent-encoded) always yields the same ledger key.
///
/// # Arguments
///
/// * `base_url` - The source's front page URL
/// * `href` - Raw `href` attribute, already trimmed
///
/// # Returns
///
/// - `/path` resolved against the base URL's origin
/// - `//host/path` with the base URL's scheme
/// - a relative path appended to the base URL as a segment
/// - an absolute URL in canonical form
///
/// If the base URL does not parse, the href is joined to it as plain text.
pub fn normalize_link(base_url: &str, href: &str) -> String {
    let base = base_url.trim_end_matches('/');

    if let Ok(absolute) = Url::parse(href) {
        return absolute.to_string();
    }

    let resolved = if href.starts_with('/') {
        Url::parse(base_url).and_then(|b| b.join(href))
    } else {
        Url::parse(&format!("{base}/")).and_then(|b| b.join(href))
    };

    match resolved {
        Ok(url) => url.to_string(),
        Err(_) if href.starts_with("//") => format!("https:{href}"),
        Err(_) if href.starts_with('/') => format!("{base}{href}"),
        Err(_) => format!("{base}/{href}"),
    }
}
