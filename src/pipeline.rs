//! Per-source fetch → extract → filter → enrich pipeline.
//!
//! A source moves through the [`Stage`]s in order. Only a failed front page
//! fetch ends it early (in [`Stage::Failed`]); every later step degrades
//! instead of failing. Filtering stops once [`MAX_ACCEPTED_PER_SOURCE`]
//! candidates are accepted, and each accepted link goes into the ledger before
//! any enrichment request is made.

use crate::error::SourceError;
use crate::ledger::LinkLedger;
use crate::models::{AcceptedItem, CandidateItem, SourceDefinition};
use crate::relevance::is_relevant;
use crate::scrapers::enrich::ContentEnricher;
use crate::scrapers::extract::extract;
use crate::scrapers::fetch::PageFetcher;
use crate::summarize::{Summarizer, summarize_or_fallback};
use crate::utils::{truncate_chars, truncate_for_log};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Accepted articles per source per run.
pub const MAX_ACCEPTED_PER_SOURCE: usize = 5;

/// Title characters kept on an accepted item.
pub const MAX_TITLE_CHARS: usize = 200;

/// Body characters kept as the item's preview.
pub const PREVIEW_CHARS: usize = 200;

/// Where a source is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Fetching,
    Extracting,
    Filtering,
    Enriching,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Filtering => "filtering",
            Stage::Enriching => "enriching",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct StageTracker<'s> {
    source: &'s str,
    stage: Stage,
}

impl<'s> StageTracker<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            stage: Stage::Idle,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!(source = self.source, from = %self.stage, to = %next, "Stage transition");
        self.stage = next;
    }
}

/// Runs sources one at a time against shared fetcher and summarizer handles.
#[derive(Debug)]
pub struct Pipeline<'a, S> {
    fetcher: &'a PageFetcher,
    summarizer: &'a S,
}

impl<'a, S: Summarizer> Pipeline<'a, S> {
    pub fn new(fetcher: &'a PageFetcher, summarizer: &'a S) -> Self {
        Self {
            fetcher,
            summarizer,
        }
    }

    /// Run one source end to end.
    ///
    /// # Arguments
    ///
    /// * `source` - The source to scrape
    /// * `ledger` - Links published so far; accepted links are added to it
    ///
    /// # Returns
    ///
    /// Up to [`MAX_ACCEPTED_PER_SOURCE`] accepted items, or
    /// [`SourceError::Fetch`] when the front page cannot be fetched. The source
    /// then contributes nothing to this run.
    #[instrument(level = "info", skip_all, fields(source = %source.key))]
    pub async fn run_source(
        &self,
        source: &SourceDefinition,
        ledger: &mut LinkLedger,
    ) -> Result<Vec<AcceptedItem>, SourceError> {
        let mut tracker = StageTracker::new(&source.key);

        tracker.advance(Stage::Fetching);
        self.fetcher.pause().await;
        let html = match self.fetcher.fetch_page(&source.url, &source.url).await {
            Ok(html) => html,
            Err(e) => {
                tracker.advance(Stage::Failed);
                return Err(SourceError::Fetch {
                    source_key: source.key.clone(),
                    source: e,
                });
            }
        };

        tracker.advance(Stage::Extracting);
        let candidates = extract(&html, &source.selectors, &source.url);
        info!(
            source = %source.name,
            candidates = candidates.len(),
            "Extracted headline candidates"
        );

        tracker.advance(Stage::Filtering);
        let accepted = select_candidates(candidates, ledger, MAX_ACCEPTED_PER_SOURCE);

        tracker.advance(Stage::Enriching);
        let enricher = ContentEnricher::new(self.fetcher);
        let mut items = Vec::with_capacity(accepted.len());
        for candidate in accepted {
            let content = enricher.enrich(&candidate.link).await;
            let summary = summarize_or_fallback(self.summarizer, &candidate.title, &content).await;
            items.push(AcceptedItem {
                title: truncate_chars(&candidate.title, MAX_TITLE_CHARS).to_string(),
                content_preview: truncate_chars(&content, PREVIEW_CHARS).to_string(),
                link: candidate.link,
                source: source.name.clone(),
                summary,
            });
        }

        tracker.advance(Stage::Done);
        info!(source = %source.name, count = items.len(), "Fetched relevant articles");
        Ok(items)
    }
}

/// Accept candidates in scan order until `limit` are taken.
///
/// A candidate is accepted when its title is relevant and its link is not in
/// the ledger. Accepted links are recorded immediately, which also rejects
/// repeats of the same link further down the page.
///
/// # Arguments
///
/// * `candidates` - Extractor output, in document order
/// * `ledger` - Links published so far; updated in place
/// * `limit` - Maximum number of accepted candidates
///
/// # Returns
///
/// The accepted candidates, at most `limit` of them, in scan order.
pub fn select_candidates(
    candidates: Vec<CandidateItem>,
    ledger: &mut LinkLedger,
    limit: usize,
) -> Vec<CandidateItem> {
    let mut accepted = Vec::new();
    for candidate in candidates {
        if accepted.len() >= limit {
            break;
        }
        if !is_relevant(&candidate.title) {
            continue;
        }
        if ledger.contains(&candidate.link) {
            debug!(link = %candidate.link, "Already published; skipping");
            continue;
        }
        ledger.record(&candidate.link);
        info!(
            title = %truncate_for_log(&candidate.title, 50),
            link = %candidate.link,
            "Found relevant article"
        );
        accepted.push(candidate);
    }
    if accepted.len() == limit {
        debug!(limit, "Accepted item cap reached; stopping scan");
    }
    accepted
}

/// Log a failed source in the same shape everywhere.
pub(crate) fn report_source_failure(source: &SourceDefinition, error: &SourceError) {
    warn!(
        source = %source.key,
        name = %source.name,
        error = %error,
        "Source failed; it contributes no articles this run"
    );
}
