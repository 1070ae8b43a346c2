//! The table of news sites scraped on every run.
//!
//! # Supported Sources
//!
//! | Key | Site | Notes |
//! |-----|------|-------|
//! | `aljazeera` | [Al Jazeera Net](https://www.aljazeera.net) | Featured cards and `.gc__` content blocks |
//! | `bbc_arabic` | [BBC Arabic](https://www.bbc.com/arabic) | Media list items and block links |
//! | `rt_arabic` | [RT Arabic](https://arabic.rt.com) | Cards and list items |
//!
//! Adding a site only needs a new [`SourceDefinition`]; the pipeline has no
//! per-site code. The built-in table can be replaced at startup with a YAML
//! list of definitions (see [`load_sources`]).

use crate::error::SourcesFileError;
use crate::models::{Selectors, SourceDefinition};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

fn source(key: &str, name: &str, url: &str, container: &str, title: &str) -> SourceDefinition {
    SourceDefinition {
        key: key.to_string(),
        name: name.to_string(),
        url: url.to_string(),
        selectors: Selectors {
            container: container.to_string(),
            title: title.to_string(),
            link: "a".to_string(),
        },
        enabled: true,
    }
}

/// The built-in, ordered source table.
pub fn default_sources() -> Vec<SourceDefinition> {
    vec![
        source(
            "aljazeera",
            "الجزيرة نت",
            "https://www.aljazeera.net",
            "article, .featured-news-item, .news-card, .gc__content",
            "h1, h2, h3, .title, .gc__title a",
        ),
        source(
            "bbc_arabic",
            "بي بي سي عربي",
            "https://www.bbc.com/arabic",
            "article, .media-list__item, .block-link",
            "h3, .media__title, .block-link__overlay-text",
        ),
        source(
            "rt_arabic",
            "روسيا اليوم",
            "https://arabic.rt.com",
            "article, .card, .list-item",
            "h2, h3, .card__heading, .list-item__title",
        ),
    ]
}

/// Load the source table.
///
/// Without a path the built-in table is returned. With a path, the file must
/// hold a non-empty YAML list of [`SourceDefinition`]s with unique keys and
/// absolute base URLs; it replaces the built-in table entirely.
#[instrument(level = "info")]
pub async fn load_sources(path: Option<&Path>) -> Result<Vec<SourceDefinition>, SourcesFileError> {
    let Some(path) = path else {
        return Ok(default_sources());
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourcesFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let sources: Vec<SourceDefinition> =
        serde_yaml::from_str(&raw).map_err(|source| SourcesFileError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
    if sources.is_empty() {
        return Err(SourcesFileError::Empty {
            path: path.to_path_buf(),
        });
    }
    validate(&sources)?;

    info!(
        count = sources.len(),
        enabled = sources.iter().filter(|s| s.enabled).count(),
        "Loaded sources file"
    );
    Ok(sources)
}

fn validate(sources: &[SourceDefinition]) -> Result<(), SourcesFileError> {
    let mut keys = HashSet::new();
    for source in sources {
        if !keys.insert(source.key.as_str()) {
            return Err(SourcesFileError::DuplicateKey {
                key: source.key.clone(),
            });
        }
        let valid = Url::parse(&source.url)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            return Err(SourcesFileError::InvalidUrl {
                key: source.key.clone(),
                url: source.url.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_sources_are_valid() {
        let sources = default_sources();
        assert_eq!(sources.len(), 3);
        assert!(sources.iter().all(|s| s.enabled));
        assert!(validate(&sources).is_ok());
        assert_eq!(sources[0].key, "aljazeera");
        assert_eq!(sources[1].url, "https://www.bbc.com/arabic");
    }

    #[tokio::test]
    async fn test_load_sources_without_path_uses_builtin_table() {
        let sources = load_sources(None).await.unwrap();
        assert_eq!(sources, default_sources());
    }

    #[tokio::test]
    async fn test_load_sources_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
- key: local
  name: Local Paper
  url: https://paper.example.com
  selectors:
    container: li.story
    title: h2
    link: a
- key: parked
  name: Parked
  url: https://parked.example.com
  enabled: false
  selectors:
    container: article
    title: h3
    link: a
"#
        )
        .unwrap();

        let sources = load_sources(Some(file.path())).await.unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].selectors.container, "li.story");
        assert!(!sources[1].enabled);
    }

    #[tokio::test]
    async fn test_load_sources_rejects_duplicate_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
- key: same
  name: One
  url: https://one.example.com
  selectors: {{ container: article, title: h2, link: a }}
- key: same
  name: Two
  url: https://two.example.com
  selectors: {{ container: article, title: h2, link: a }}
"#
        )
        .unwrap();

        let err = load_sources(Some(file.path())).await.unwrap_err();
        assert!(matches!(err, SourcesFileError::DuplicateKey { ref key } if key == "same"));
    }

    #[tokio::test]
    async fn test_load_sources_rejects_relative_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
- key: broken
  name: Broken
  url: /news
  selectors: {{ container: article, title: h2, link: a }}
"#
        )
        .unwrap();

        let err = load_sources(Some(file.path())).await.unwrap_err();
        assert!(matches!(err, SourcesFileError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_load_sources_rejects_empty_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        let err = load_sources(Some(file.path())).await.unwrap_err();
        assert!(matches!(err, SourcesFileError::Empty { .. }));
    }
}
