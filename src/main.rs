//! # Syria News Bot
//!
//! Scrapes Arabic-language news sites for Syria coverage and relays new
//! articles to a Telegram channel.
//!
//! ## Features
//!
//! - Scrapes front pages of configured sources (Al Jazeera, BBC Arabic, RT
//!   Arabic by default, or a YAML source table)
//! - Keeps only headlines matching Syria topic keywords
//! - Remembers the last 1000 published links so nothing is sent twice
//! - Enriches each article with body text and a summary from a hosted model,
//!   falling back to the title
//! - Publishes a header, one message per article and a footer to Telegram,
//!   or logs them when no credentials are configured
//! - Optionally writes a `latest.json` snapshot of each run
//!
//! ## Usage
//!
//! ```sh
//! syria_news_bot                      # one cycle
//! syria_news_bot --every-minutes 60   # hourly until Ctrl-C
//! ```
//!
//! ## Architecture
//!
//! Each cycle runs:
//! 1. **Loading**: Read the link ledger from disk
//! 2. **Aggregation**: Fetch, extract, filter and enrich every enabled source in turn
//! 3. **Persisting**: Write the ledger back, then the optional JSON snapshot
//! 4. **Publishing**: Send the digest to the channel

use clap::Parser;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod cli;
mod error;
mod ledger;
mod models;
mod outputs;
mod pipeline;
mod publish;
mod relevance;
mod scrapers;
mod sources;
mod summarize;
mod utils;

use aggregate::run_all;
use cli::Cli;
use ledger::LinkLedger;
use models::SourceDefinition;
use outputs::json;
use pipeline::Pipeline;
use publish::{ChannelPublisher, Pacing, publish_digest};
use scrapers::fetch::{FetcherConfig, PageFetcher};
use summarize::HuggingFaceSummarizer;
use utils::ensure_writable_dir;

/// Console output plus a plain-text copy appended to `log_path`.
fn init_tracing(log_path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new().create(true).append(true).open(log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tfmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(UtcTime::rfc_3339()),
        )
        .with(
            tfmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(Mutex::new(log_file)),
        )
        .try_init()?;
    Ok(())
}

/// Everything a cycle needs, built once at startup.
struct Runtime {
    fetcher: PageFetcher,
    summarizer: HuggingFaceSummarizer,
    publisher: ChannelPublisher,
    sources: Vec<SourceDefinition>,
    ledger_path: PathBuf,
    json_output_dir: Option<PathBuf>,
    pacing: Pacing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CycleReport {
    collected: usize,
    published: usize,
}

/// One full scrape and publish cycle. Never fails; problems are logged.
#[instrument(level = "info", skip_all)]
async fn run_cycle(runtime: &Runtime) -> CycleReport {
    let start = Instant::now();
    let mut ledger = LinkLedger::load(&runtime.ledger_path).await;
    if ledger.is_empty() {
        info!("Ledger is empty; every relevant article counts as new");
    } else {
        debug!(known_links = ledger.len(), "Ledger loaded");
    }

    let pipeline = Pipeline::new(&runtime.fetcher, &runtime.summarizer);
    let digest = run_all(&pipeline, &runtime.sources, &mut ledger).await;

    ledger.persist().await;

    if let Some(dir) = &runtime.json_output_dir {
        if let Err(e) = json::write_snapshot(&digest, runtime.sources.len(), dir).await {
            error!(error = %e, "Failed to write JSON snapshot");
        }
    }

    let published = publish_digest(&runtime.publisher, &digest, runtime.pacing).await;
    let report = CycleReport {
        collected: digest.total_items(),
        published,
    };

    let elapsed = start.elapsed();
    info!(
        collected = report.collected,
        published = report.published,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Cycle complete"
    );
    report
}

/// Run a cycle now and then every `minutes` until Ctrl-C.
async fn run_scheduled(runtime: &Runtime, minutes: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(minutes * 60));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(minutes, "Scheduler started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_cycle(runtime).await;
            }
            res = &mut shutdown => {
                if let Err(e) = res {
                    error!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Shutdown requested; stopping scheduler");
                break;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    init_tracing(&args.log_path())?;

    info!(version = env!("CARGO_PKG_VERSION"), "syria_news_bot starting up");
    debug!(data_dir = %args.data_dir.display(), ledger = %args.ledger_path().display(), "Parsed CLI arguments");

    if let Err(e) = ensure_writable_dir(&args.data_dir).await {
        error!(
            path = %args.data_dir.display(),
            error = %e,
            "Data directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let sources = sources::load_sources(args.sources_file.as_deref()).await?;
    info!(
        total = sources.len(),
        enabled = sources.iter().filter(|s| s.enabled).count(),
        "Sources loaded"
    );

    let summarizer = HuggingFaceSummarizer::new(args.summarizer_url.clone(), args.hf_token.clone())?
        .with_timeout(Duration::from_secs(args.summarizer_timeout_secs));
    if !summarizer.is_configured() {
        warn!("HUGGING_FACE_TOKEN not set; summaries will fall back to titles");
    }

    let publisher = ChannelPublisher::from_credentials(
        args.telegram_token.as_deref(),
        args.chat_id.as_deref(),
        &args.telegram_api_base,
    )?;
    if publisher.is_dry_run() {
        warn!("TELEGRAM_TOKEN or CHAT_ID not set; messages will be logged, not sent");
    }

    let runtime = Runtime {
        fetcher: PageFetcher::new(FetcherConfig::default())?,
        summarizer,
        publisher,
        sources,
        ledger_path: args.ledger_path(),
        json_output_dir: args.json_output_dir.clone(),
        pacing: Pacing::default(),
    };

    match args.every_minutes {
        Some(minutes) => run_scheduled(&runtime, minutes).await,
        None => {
            run_cycle(&runtime).await;
        }
    }

    info!("syria_news_bot finished");
    Ok(())
}
