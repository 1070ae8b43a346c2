//! Typed failures for every adapter boundary of the digest pipeline.
//!
//! Only [`SourceError`] is allowed to cancel a source's contribution to a run.
//! Every other error here is degraded to a safe default by its caller and
//! reported through a log line.

use std::path::PathBuf;
use thiserror::Error;

/// A page could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("invalid request header {name}: {reason}")]
    Header { name: &'static str, reason: String },
}

/// A configured CSS selector could not be compiled.
#[derive(Debug, Error)]
#[error("invalid selector \"{selector}\": {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

/// Best-effort article enrichment failed.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no body text found at {url}")]
    NoContent { url: String },
}

/// The summarization service was not usable for one article.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("no summarizer credential configured")]
    Unconfigured,

    #[error("summarizer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("summarizer returned HTTP status {status}")]
    Status { status: u16 },

    #[error("summarizer response was malformed: {reason}")]
    Malformed { reason: String },
}

/// Reading or writing the persisted link ledger failed.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger file {} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("ledger I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger file {} is not a JSON list of links: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode ledger: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A message could not be delivered to the channel.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("channel request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("channel rejected message with status {status}: {description}")]
    Rejected { status: u16, description: String },
}

/// A whole source contributed nothing to this run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to fetch front page of {source_key}: {source}")]
    Fetch {
        source_key: String,
        #[source]
        source: FetchError,
    },
}

/// The optional YAML source table could not be used.
#[derive(Debug, Error)]
pub enum SourcesFileError {
    #[error("failed to read sources file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("sources file {} defines no sources", path.display())]
    Empty { path: PathBuf },

    #[error("duplicate source key \"{key}\"")]
    DuplicateKey { key: String },

    #[error("source \"{key}\" has an invalid base URL \"{url}\"")]
    InvalidUrl { key: String, url: String },
}
