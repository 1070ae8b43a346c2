//! JSON snapshot of the latest run.
//!
//! Every cycle overwrites `{json_output_dir}/latest.json` with the digest it
//! produced, so external readers always see the most recent batch:
//!
//! ```text
//! {
//!   "status": "success",
//!   "timestamp": "2026-10-18T09:00:00+03:00",
//!   "news": [ { "source": "الجزيرة نت", "items": [ ... ] } ],
//!   "stats": { "total_articles": 3, "active_sources": 1, "total_sources": 3 }
//! }
//! ```

use crate::models::{Digest, SourceSection};
use crate::utils::write_atomic;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// File name of the snapshot inside the output directory.
pub const SNAPSHOT_FILE: &str = "latest.json";

#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub status: &'static str,
    pub timestamp: String,
    pub news: &'a [SourceSection],
    pub stats: SnapshotStats,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SnapshotStats {
    pub total_articles: usize,
    pub active_sources: usize,
    pub total_sources: usize,
}

impl<'a> Snapshot<'a> {
    pub fn new(digest: &'a Digest, total_sources: usize, at: DateTime<Local>) -> Self {
        Self {
            status: "success",
            timestamp: at.to_rfc3339(),
            news: &digest.sections,
            stats: SnapshotStats {
                total_articles: digest.total_items(),
                active_sources: digest.sections.len(),
                total_sources,
            },
        }
    }
}

/// Write the snapshot for `digest` to `{json_output_dir}/latest.json`.
///
/// # Arguments
///
/// * `digest` - Accepted articles of this run
/// * `total_sources` - Number of configured sources, enabled or not
/// * `json_output_dir` - Output directory, created if missing
///
/// # Returns
///
/// The snapshot path on success, or an error if the directory cannot be
/// created or the file cannot be written.
#[instrument(level = "info", skip_all, fields(dir = %json_output_dir.display()))]
pub async fn write_snapshot(
    digest: &Digest,
    total_sources: usize,
    json_output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let snapshot = Snapshot::new(digest, total_sources, Local::now());
    let json = serde_json::to_vec_pretty(&snapshot)?;
    let path = json_output_dir.join(SNAPSHOT_FILE);

    write_atomic(&path, &json).await?;
    info!(path = %path.display(), articles = snapshot.stats.total_articles, "Wrote JSON snapshot");
    Ok(path)
}
