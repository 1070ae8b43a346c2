//! Command-line interface definitions for the Syria news bot.
//!
//! Every option can also come from the environment where an `env` name is
//! given. Credentials are optional: without a bot token and chat id the run is
//! a dry run, and without a Hugging Face token summaries fall back to titles.

use clap::Parser;
use std::path::PathBuf;

use crate::publish::TELEGRAM_API_BASE;
use crate::summarize::DEFAULT_SUMMARIZER_URL;

/// Command-line arguments for the Syria news bot.
///
/// # Examples
///
/// ```sh
/// # One cycle, logging messages instead of sending them
/// syria_news_bot
///
/// # Hourly schedule publishing to a channel
/// TELEGRAM_TOKEN=... CHAT_ID=@channel syria_news_bot --every-minutes 60
///
/// # Custom sources and a JSON snapshot
/// syria_news_bot -s sources.yaml -j ./public
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the link ledger and log file
    #[arg(short, long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Path of the link ledger (default: <data-dir>/sent_links.json)
    #[arg(long)]
    pub ledger_file: Option<PathBuf>,

    /// Path of the log file (default: <data-dir>/bot_log.txt)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    pub telegram_token: Option<String>,

    /// Telegram chat id or @channel name
    #[arg(long, env = "CHAT_ID")]
    pub chat_id: Option<String>,

    /// Telegram Bot API server (a self-hosted one, for instance)
    #[arg(long, env = "TELEGRAM_API_BASE", default_value = TELEGRAM_API_BASE)]
    pub telegram_api_base: String,

    /// Hugging Face inference API token
    #[arg(long, env = "HUGGING_FACE_TOKEN", hide_env_values = true)]
    pub hf_token: Option<String>,

    /// Summarization endpoint
    #[arg(long, default_value = DEFAULT_SUMMARIZER_URL)]
    pub summarizer_url: String,

    /// Upper bound on one summarization request, in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub summarizer_timeout_secs: u64,

    /// Optional YAML file replacing the built-in source table
    #[arg(short, long)]
    pub sources_file: Option<PathBuf>,

    /// Directory for the latest.json snapshot
    #[arg(short, long)]
    pub json_output_dir: Option<PathBuf>,

    /// Run a cycle every N minutes instead of once
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub every_minutes: Option<u64>,
}

impl Cli {
    pub fn ledger_path(&self) -> PathBuf {
        self.ledger_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("sent_links.json"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("bot_log.txt"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["syria_news_bot"]);

        assert_eq!(cli.data_dir, PathBuf::from("data"));
        assert_eq!(cli.ledger_path(), PathBuf::from("data/sent_links.json"));
        assert_eq!(cli.log_path(), PathBuf::from("data/bot_log.txt"));
        assert_eq!(cli.summarizer_url, DEFAULT_SUMMARIZER_URL);
        assert_eq!(cli.summarizer_timeout_secs, 10);
        assert_eq!(cli.telegram_api_base, TELEGRAM_API_BASE);
        assert_eq!(cli.every_minutes, None);
        assert_eq!(cli.json_output_dir, None);
    }

    #[test]
    fn test_cli_paths_follow_data_dir() {
        let cli = Cli::parse_from(["syria_news_bot", "--data-dir", "/var/lib/bot"]);
        assert_eq!(cli.ledger_path(), PathBuf::from("/var/lib/bot/sent_links.json"));
        assert_eq!(cli.log_path(), PathBuf::from("/var/lib/bot/bot_log.txt"));
    }

    #[test]
    fn test_cli_explicit_files_win() {
        let cli = Cli::parse_from([
            "syria_news_bot",
            "--ledger-file",
            "/tmp/ledger.json",
            "--log-file",
            "/tmp/bot.log",
        ]);
        assert_eq!(cli.ledger_path(), PathBuf::from("/tmp/ledger.json"));
        assert_eq!(cli.log_path(), PathBuf::from("/tmp/bot.log"));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "syria_news_bot",
            "-s",
            "sources.yaml",
            "-j",
            "/tmp/json",
            "-e",
            "60",
        ]);

        assert_eq!(cli.sources_file, Some(PathBuf::from("sources.yaml")));
        assert_eq!(cli.json_output_dir, Some(PathBuf::from("/tmp/json")));
        assert_eq!(cli.every_minutes, Some(60));
    }

    #[test]
    fn test_cli_service_overrides() {
        let cli = Cli::parse_from([
            "syria_news_bot",
            "--telegram-api-base",
            "http://localhost:8081",
            "--summarizer-timeout-secs",
            "30",
        ]);
        assert_eq!(cli.telegram_api_base, "http://localhost:8081");
        assert_eq!(cli.summarizer_timeout_secs, 30);
    }

    #[test]
    fn test_cli_rejects_zero_interval() {
        assert!(Cli::try_parse_from(["syria_news_bot", "--every-minutes", "0"]).is_err());
    }
}
