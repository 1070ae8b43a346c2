//! Runs the source pipeline over every enabled source.
//!
//! Sources are processed one after another in configuration order so the
//! outbound request rate stays low. A source that fails is logged and skipped;
//! it never stops the others.

use crate::ledger::LinkLedger;
use crate::models::{Digest, SourceDefinition};
use crate::pipeline::{Pipeline, report_source_failure};
use crate::summarize::Summarizer;
use tracing::{info, instrument};

/// Collect accepted items from all enabled `sources` into a [`Digest`].
///
/// # Arguments
///
/// * `pipeline` - Shared fetcher and summarizer
/// * `sources` - The source table, in configuration order
/// * `ledger` - Links published so far; updated by every source in turn
///
/// # Returns
///
/// One section per source that produced items, in configuration order.
/// Sources that yield no items, fail, or are disabled have no section.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn run_all<S: Summarizer>(
    pipeline: &Pipeline<'_, S>,
    sources: &[SourceDefinition],
    ledger: &mut LinkLedger,
) -> Digest {
    let mut digest = Digest::default();
    let mut failed = 0usize;

    for source in sources.iter().filter(|s| s.enabled) {
        match pipeline.run_source(source, ledger).await {
            Ok(items) => digest.push(source.name.clone(), items),
            Err(e) => {
                failed += 1;
                report_source_failure(source, &e);
            }
        }
    }

    info!(
        sources_with_news = digest.sections.len(),
        failed_sources = failed,
        articles = digest.total_items(),
        "Aggregation complete"
    );
    digest
}
