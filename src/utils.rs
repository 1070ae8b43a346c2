//! Utility functions for text truncation and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - Character-safe truncation for titles, previews and log lines
//! - Whitespace normalization for scraped text
//! - Output directory validation and atomic file replacement

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Return at most the first `max` characters of `s`.
///
/// Counts Unicode scalar values, never splits a multi-byte character.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_chars("دمشق اليوم", 4), "دمشق");
/// assert_eq!(truncate_chars("short", 100), "short");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the omitted characters appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        format!("{}…(+{} chars)", truncate_chars(s, max), total - max)
    }
}

/// Collapse runs of whitespace into single spaces and trim both ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Data directory is writable");
    Ok(())
}

/// Replace the content of `path` in full.
///
/// The bytes are written to a sibling temporary file which is then renamed
/// over `path`, so readers never observe a half-written file.
#[instrument(level = "debug", skip(contents), fields(path = %path.display(), bytes = contents.len()))]
pub async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let tmp = temp_sibling(path);
    fs::write(&tmp, contents).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    debug!("Replaced file atomically");
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
