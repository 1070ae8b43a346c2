//! Persisted set of already-published article links.
//!
//! The ledger keeps links in insertion order so that trimming to
//! [`LEDGER_CAPACITY`] always drops the oldest entries first. On disk it is a
//! JSON array of strings, most recent link last, rewritten in full on every
//! save.
//!
//! Neither loading nor saving is ever fatal: a missing or corrupt file yields an
//! empty ledger, and a failed save is logged and the run carries on.

use crate::error::LedgerError;
use crate::utils::write_atomic;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Number of most recent links retained across runs.
pub const LEDGER_CAPACITY: usize = 1000;

/// Ordered, de-duplicated record of published links.
#[derive(Debug)]
pub struct LinkLedger {
    path: PathBuf,
    links: Vec<String>,
    index: HashSet<String>,
    capacity: usize,
}

impl LinkLedger {
    /// An empty ledger that will be saved to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            links: Vec::new(),
            index: HashSet::new(),
            capacity: LEDGER_CAPACITY,
        }
    }

    #[cfg(test)]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self.trim();
        self
    }

    /// Load the ledger at `path`, falling back to an empty one.
    ///
    /// Load failures are logged and never returned.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path).await {
            Ok(ledger) => {
                info!(links = ledger.len(), "Loaded link ledger");
                ledger
            }
            Err(LedgerError::NotFound { .. }) => {
                info!("No link ledger yet; starting with an empty one");
                Self::empty(path)
            }
            Err(e) => {
                warn!(error = %e, "Link ledger unreadable; starting with an empty one");
                Self::empty(path)
            }
        }
    }

    /// Load the ledger at `path`, reporting why it could not be read.
    pub async fn try_load(path: &Path) -> Result<Self, LedgerError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LedgerError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(LedgerError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let stored: Vec<String> =
            serde_json::from_str(&raw).map_err(|source| LedgerError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        let mut ledger = Self::empty(path);
        for link in stored {
            ledger.record(&link);
        }
        ledger.trim();
        Ok(ledger)
    }

    pub fn contains(&self, link: &str) -> bool {
        self.index.contains(link)
    }

    /// Append `link` unless it is already present. Returns `true` if added.
    pub fn record(&mut self, link: &str) -> bool {
        if self.index.contains(link) {
            return false;
        }
        self.index.insert(link.to_string());
        self.links.push(link.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Links in insertion order, oldest first.
    #[cfg(test)]
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Trim to the retention window and replace the file content.
    ///
    /// The file is rewritten in full through a temporary sibling and a rename,
    /// so a crash mid-write leaves the previous ledger intact.
    ///
    /// # Returns
    ///
    /// The number of links written, or a [`LedgerError`] if encoding or any
    /// file operation fails.
    pub async fn save(&mut self) -> Result<usize, LedgerError> {
        self.trim();
        let encoded = serde_json::to_vec(&self.links).map_err(LedgerError::Encode)?;
        write_atomic(&self.path, &encoded)
            .await
            .map_err(|source| LedgerError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(self.links.len())
    }

    /// [`save`](Self::save), logging instead of returning failures.
    ///
    /// Returns `true` when the file was written.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn persist(&mut self) -> bool {
        match self.save().await {
            Ok(count) => {
                info!(links = count, "Saved link ledger");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to save link ledger; links from this run may be re-published");
                false
            }
        }
    }

    fn trim(&mut self) {
        if self.links.len() <= self.capacity {
            return;
        }
        let excess = self.links.len() - self.capacity;
        for dropped in self.links.drain(..excess) {
            self.index.remove(&dropped);
        }
        debug!(dropped = excess, "Trimmed oldest ledger entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_yields_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent_links.json");

        assert!(matches!(
            LinkLedger::try_load(&path).await,
            Err(LedgerError::NotFound { .. })
        ));
        let ledger = LinkLedger::load(&path).await;
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_yields_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent_links.json");
        std::fs::write(&path, "{not a list").unwrap();

        assert!(matches!(
            LinkLedger::try_load(&path).await,
            Err(LedgerError::Decode { .. })
        ));
        assert!(LinkLedger::load(&path).await.is_empty());
    }

    #[test]
    fn test_record_ignores_duplicates() {
        let mut ledger = LinkLedger::empty("unused.json");
        assert!(ledger.record("https://example.com/a"));
        assert!(!ledger.record("https://example.com/a"));
        assert!(ledger.record("https://example.com/b"));
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("https://example.com/a"));
        assert!(!ledger.contains("https://example.com/c"));
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent_links.json");

        let mut ledger = LinkLedger::empty(&path);
        for i in 0..10 {
            ledger.record(&format!("https://example.com/{i}"));
        }
        assert_eq!(ledger.save().await.unwrap(), 10);

        let loaded = LinkLedger::load(&path).await;
        assert_eq!(loaded.links(), ledger.links());
    }

    #[tokio::test]
    async fn test_save_keeps_most_recent_thousand() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent_links.json");

        let mut ledger = LinkLedger::empty(&path);
        for i in 0..1005 {
            ledger.record(&format!("https://example.com/{i}"));
        }
        assert!(ledger.persist().await);
        assert_eq!(ledger.len(), LEDGER_CAPACITY);
        assert!(!ledger.contains("https://example.com/4"));
        assert!(ledger.contains("https://example.com/5"));

        let loaded = LinkLedger::load(&path).await;
        assert_eq!(loaded.len(), LEDGER_CAPACITY);
        assert_eq!(loaded.links()[0], "https://example.com/5");
        assert_eq!(loaded.links()[999], "https://example.com/1004");
    }

    #[tokio::test]
    async fn test_save_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent_links.json");
        std::fs::write(&path, r#"["https://old.example.com/x"]"#).unwrap();

        let mut ledger = LinkLedger::empty(&path);
        ledger.record("https://example.com/new");
        ledger.save().await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"["https://example.com/new"]"#);
    }

    #[tokio::test]
    async fn test_load_trims_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent_links.json");
        let links: Vec<String> = (0..1200).map(|i| format!("https://example.com/{i}")).collect();
        std::fs::write(&path, serde_json::to_string(&links).unwrap()).unwrap();

        let ledger = LinkLedger::load(&path).await;
        assert_eq!(ledger.len(), LEDGER_CAPACITY);
        assert_eq!(ledger.links()[0], "https://example.com/200");
    }

    #[tokio::test]
    async fn test_persist_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be replaced by a file rename.
        let path = dir.path().join("occupied");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let mut ledger = LinkLedger::empty(&path);
        ledger.record("https://example.com/a");
        assert!(!ledger.persist().await);
        assert!(ledger.contains("https://example.com/a"));
    }

    #[test]
    fn test_with_capacity_trims_immediately() {
        let mut ledger = LinkLedger::empty("unused.json");
        ledger.record("a");
        ledger.record("b");
        ledger.record("c");
        let ledger = ledger.with_capacity(2);
        assert_eq!(ledger.links(), ["b".to_string(), "c".to_string()]);
        assert!(!ledger.contains("a"));
    }
}
