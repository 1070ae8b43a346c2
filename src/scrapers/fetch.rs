//! HTTP page fetcher with rotating browser headers and jittered pacing.
//!
//! Every request picks a user agent at random from [`FetcherConfig::user_agents`]
//! and sends a browser-like header set. Before a source's front page is
//! requested, [`PageFetcher::pause`] sleeps for a random duration inside the
//! configured jitter range so request timing is less regular.
//!
//! TLS certificates are always verified. Any transport error, timeout or
//! non-2xx status comes back as a [`FetchError`].

use crate::error::FetchError;
use rand::seq::IndexedRandom;
use rand::{Rng, rng};
use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument};

/// Desktop browser signatures rotated across requests.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "ar,en-US;q=0.7,en;q=0.3";

/// Request pacing and identity strategy.
///
/// Injected into [`PageFetcher`] so tests can pin the jitter to zero and the
/// header rotation to a single profile.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Header profiles picked from at random, one per request.
    pub user_agents: Vec<String>,
    /// Lower bound of the pre-request delay.
    pub jitter_min: Duration,
    /// Upper bound of the pre-request delay.
    pub jitter_max: Duration,
    /// Timeout for a source's front page.
    pub page_timeout: Duration,
    /// Timeout for an individual article page.
    pub article_timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agents: USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            jitter_min: Duration::from_millis(500),
            jitter_max: Duration::from_millis(2000),
            page_timeout: Duration::from_secs(15),
            article_timeout: Duration::from_secs(10),
        }
    }
}

impl FetcherConfig {
    /// Deterministic configuration: one user agent, no jitter, short timeouts.
    #[cfg(test)]
    pub fn pinned(user_agent: &str) -> Self {
        Self {
            user_agents: vec![user_agent.to_string()],
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
            page_timeout: Duration::from_secs(5),
            article_timeout: Duration::from_secs(5),
        }
    }
}

/// Shared HTTP client for front pages and article pages.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    config: FetcherConfig,
}

impl PageFetcher {
    /// Build a fetcher with certificate verification on.
    pub fn new(config: FetcherConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().use_rustls_tls().build()?;
        Ok(Self { client, config })
    }

    /// A random delay within the configured jitter range.
    pub fn jitter_delay(&self) -> Duration {
        let lo = self.config.jitter_min.as_millis() as u64;
        let hi = (self.config.jitter_max.as_millis() as u64).max(lo);
        Duration::from_millis(rng().random_range(lo..=hi))
    }

    /// Sleep for [`jitter_delay`](Self::jitter_delay) before hitting a source.
    pub async fn pause(&self) {
        let delay = self.jitter_delay();
        if delay.is_zero() {
            return;
        }
        debug!(?delay, "Pausing before request");
        sleep(delay).await;
    }

    /// A user agent from the rotation.
    pub fn pick_user_agent(&self) -> &str {
        self.config
            .user_agents
            .choose(&mut rng())
            .map(String::as_str)
            .unwrap_or(USER_AGENTS[0])
    }

    /// Fetch a source's front page with `Referer` set to the source's base URL.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_page(&self, url: &str, referer: &str) -> Result<String, FetchError> {
        self.get(url, Some(referer), self.config.page_timeout).await
    }

    /// Fetch an article page for enrichment.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_article(&self, url: &str) -> Result<String, FetchError> {
        self.get(url, None, self.config.article_timeout).await
    }

    fn headers(&self, referer: Option<&str>) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        let user_agent =
            HeaderValue::from_str(self.pick_user_agent()).map_err(|e| FetchError::Header {
                name: "user-agent",
                reason: e.to_string(),
            })?;
        headers.insert(header::USER_AGENT, user_agent);
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );
        headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        if let Some(referer) = referer {
            let value = HeaderValue::from_str(referer).map_err(|e| FetchError::Header {
                name: "referer",
                reason: e.to_string(),
            })?;
            headers.insert(header::REFERER, value);
        }
        Ok(headers)
    }

    async fn get(
        &self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let headers = self.headers(referer)?;
        let response = self
            .client
            .get(url)
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "Non-success HTTP status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify(url, e))?;
        debug!(
            %url,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: e,
        }
    }
}
