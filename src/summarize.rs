//! Article summarization through a hosted inference API.
//!
//! # Architecture
//!
//! - [`Summarizer`]: Core trait defining async summarization
//! - [`HuggingFaceSummarizer`]: Calls a Hugging Face inference endpoint
//! - [`summarize_or_fallback`]: Never fails; degrades to [`fallback_summary`]
//!
//! # Degradation
//!
//! Without a token, on a transport error, a non-success status, or a response
//! body without a `summary_text`, the summary becomes the first
//! [`SUMMARY_FALLBACK_CHARS`] characters of the title followed by `...`.
//! Calls are bounded by a 10 second timeout and never retried.

use crate::error::SummarizeError;
use crate::utils::{truncate_chars, truncate_for_log};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Default model endpoint.
pub const DEFAULT_SUMMARIZER_URL: &str =
    "https://api-inference.huggingface.co/models/aubmindlab/bert-base-arabertv02";

/// Title characters kept in the fallback summary.
pub const SUMMARY_FALLBACK_CHARS: usize = 100;

/// Article characters sent along with the title.
pub const SUMMARY_INPUT_CHARS: usize = 500;

const SUMMARIZER_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait for async summarization.
///
/// Implementors turn an article title and body excerpt into a short summary.
pub trait Summarizer {
    /// Summarize one article.
    ///
    /// # Arguments
    ///
    /// * `title` - The article headline
    /// * `content` - Body excerpt, possibly empty
    async fn summarize(&self, title: &str, content: &str) -> Result<String, SummarizeError>;
}

/// The title-based summary used whenever the summarizer is not usable.
pub fn fallback_summary(title: &str) -> String {
    format!("{}...", truncate_chars(title, SUMMARY_FALLBACK_CHARS))
}

/// Summarize with `summarizer`, falling back to [`fallback_summary`] on any failure.
pub async fn summarize_or_fallback<S: Summarizer>(
    summarizer: &S,
    title: &str,
    content: &str,
) -> String {
    match summarizer.summarize(title, content).await {
        Ok(summary) => summary,
        Err(SummarizeError::Unconfigured) => {
            debug!("No summarizer configured; using title fallback");
            fallback_summary(title)
        }
        Err(e) => {
            warn!(
                title = %truncate_for_log(title, 50),
                error = %e,
                "Summarization failed; using title fallback"
            );
            fallback_summary(title)
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryRequest {
    inputs: String,
    parameters: SummaryParameters,
}

#[derive(Debug, Serialize)]
struct SummaryParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary_text: Option<String>,
}

impl SummaryRequest {
    fn new(title: &str, content: &str) -> Self {
        Self {
            inputs: format!("{}. {}", title, truncate_chars(content, SUMMARY_INPUT_CHARS)),
            parameters: SummaryParameters {
                max_length: 100,
                min_length: 30,
                do_sample: false,
            },
        }
    }
}

/// Summarizer backed by a Hugging Face inference endpoint.
///
/// A missing token is a supported configuration: every call then returns
/// [`SummarizeError::Unconfigured`] without touching the network.
#[derive(Clone)]
pub struct HuggingFaceSummarizer {
    client: Client,
    endpoint: String,
    token: Option<String>,
    timeout: Duration,
}

impl fmt::Debug for HuggingFaceSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceSummarizer")
            .field("endpoint", &self.endpoint)
            .field("configured", &self.token.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HuggingFaceSummarizer {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().use_rustls_tls().build()?,
            endpoint: endpoint.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            timeout: SUMMARIZER_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }
}

impl Summarizer for HuggingFaceSummarizer {
    #[instrument(level = "debug", skip_all)]
    async fn summarize(&self, title: &str, content: &str) -> Result<String, SummarizeError> {
        let Some(token) = self.token.as_deref() else {
            return Err(SummarizeError::Unconfigured);
        };

        let t0 = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&SummaryRequest::new(title, content))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizeError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: Vec<SummaryResponse> =
            serde_json::from_str(&body).map_err(|e| SummarizeError::Malformed {
                reason: format!("{e}; body: {}", truncate_for_log(&body, 200)),
            })?;

        let summary = parsed
            .into_iter()
            .next()
            .and_then(|r| r.summary_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SummarizeError::Malformed {
                reason: "no summary_text in response".to_string(),
            })?;

        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "Summarized article");
        Ok(summary)
    }
}
