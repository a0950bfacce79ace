use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use relay_engine::DEFAULT_LEDGER_FILE;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Poll a subreddit listing and forward new media posts to a Telegram chat.
#[derive(Debug, Parser)]
#[command(name = "reddit-relay", version)]
pub struct Cli {
    /// Settings file, re-read at the start of every cycle.
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Ledger of already delivered post urls.
    #[arg(long, default_value = DEFAULT_LEDGER_FILE)]
    pub ledger: PathBuf,

    /// Log file (appended to).
    #[arg(long, default_value = relay_logging::DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Log level for terminal and file output.
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,

    /// Remove duplicate ledger entries and exit.
    #[arg(long)]
    pub compact_ledger: bool,

    /// Write the settings file, filling missing values with defaults, and exit.
    #[arg(long)]
    pub write_default_settings: bool,
}
