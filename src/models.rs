//! Data models for sources, scraped candidates and accepted articles.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SourceDefinition`]: One news site and the selectors used to scrape it
//! - [`CandidateItem`]: A headline/link pair pulled off a front page
//! - [`AcceptedItem`]: An article that passed relevance and novelty checks
//! - [`Digest`]: Accepted articles of one run, grouped by source name

use serde::{Deserialize, Serialize};

/// CSS selectors locating headlines on a source's front page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Selectors {
    /// Matches one element per story (card, list item, article).
    pub container: String,
    /// First match inside a container is the headline.
    pub title: String,
    /// First match inside a container carries the `href`. Falls back to the
    /// container itself when nothing matches.
    pub link: String,
}

/// A news site scraped on every run.
///
/// Identity is [`key`](Self::key); definitions are fixed for the lifetime of
/// the process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceDefinition {
    /// Short stable identifier, e.g. `bbc_arabic`.
    pub key: String,
    /// Display name used in logs and channel messages.
    pub name: String,
    /// Front page URL; also the base for relative links and the `Referer`.
    pub url: String,
    pub selectors: Selectors,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// A headline scraped from a front page, before relevance and novelty checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    /// Headline text with whitespace collapsed.
    pub title: String,
    /// Absolute article URL.
    pub link: String,
}

/// An article accepted for publishing during the current run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AcceptedItem {
    /// Headline, capped at 200 characters.
    pub title: String,
    /// Absolute article URL. Recorded in the ledger.
    pub link: String,
    /// Display name of the source it came from.
    pub source: String,
    /// Summarizer output, or the title fallback.
    pub summary: String,
    /// First 200 characters of the enriched body text (may be empty).
    pub content_preview: String,
}

/// Accepted articles of one source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceSection {
    pub source: String,
    pub items: Vec<AcceptedItem>,
}

/// Result of one aggregation run, in source configuration order.
///
/// Sources that contributed nothing have no section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Digest {
    pub sections: Vec<SourceSection>,
}

impl Digest {
    /// Append `items` under `source`, merging into an existing section of the
    /// same name. Empty batches are ignored.
    pub fn push(&mut self, source: impl Into<String>, items: Vec<AcceptedItem>) {
        if items.is_empty() {
            return;
        }
        let source = source.into();
        match self.sections.iter_mut().find(|s| s.source == source) {
            Some(section) => section.items.extend(items),
            None => self.sections.push(SourceSection { source, items }),
        }
    }

    /// Items published under `source`, if any.
    #[cfg(test)]
    pub fn get(&self, source: &str) -> Option<&[AcceptedItem]> {
        self.sections
            .iter()
            .find(|s| s.source == source)
            .map(|s| s.items.as_slice())
    }

    pub fn total_items(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// All items in publishing order.
    pub fn items(&self) -> impl Iterator<Item = &AcceptedItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, source: &str) -> AcceptedItem {
        AcceptedItem {
            title: title.to_string(),
            link: format!("https://example.com/{title}"),
            source: source.to_string(),
            summary: "summary".to_string(),
            content_preview: String::new(),
        }
    }

    #[test]
    fn test_digest_omits_empty_batches() {
        let mut digest = Digest::default();
        digest.push("BBC", vec![]);
        assert!(digest.is_empty());
        assert_eq!(digest.get("BBC"), None);
    }

    #[test]
    fn test_digest_keeps_configuration_order() {
        let mut digest = Digest::default();
        digest.push("B", vec![item("b1", "B")]);
        digest.push("A", vec![item("a1", "A"), item("a2", "A")]);

        let names: Vec<&str> = digest.sections.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(digest.total_items(), 3);
        assert_eq!(digest.items().next().unwrap().title, "b1");
    }

    #[test]
    fn test_digest_merges_same_source() {
        let mut digest = Digest::default();
        digest.push("A", vec![item("a1", "A")]);
        digest.push("A", vec![item("a2", "A")]);
        assert_eq!(digest.sections.len(), 1);
        assert_eq!(digest.get("A").unwrap().len(), 2);
    }

    #[test]
    fn test_source_definition_enabled_defaults_to_true() {
        let yaml = r#"
key: example
name: Example
url: https://example.com
selectors:
  container: article
  title: h2
  link: a
"#;
        let source: SourceDefinition = serde_yaml::from_str(yaml).unwrap();
        assert!(source.enabled);
        assert_eq!(source.selectors.title, "h2");
    }

    #[test]
    fn test_accepted_item_serialization() {
        let json = serde_json::to_string(&item("headline", "BBC")).unwrap();
        assert!(json.contains("\"content_preview\""));
        assert!(json.contains("https://example.com/headline"));
    }
}
