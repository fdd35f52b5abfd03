//! CLI for the mfetch media downloader.

mod commands;
mod format;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use mfetch_core::config;
use mfetch_core::model::{MediaMode, RequesterId};
use std::path::PathBuf;
use std::process::ExitCode;

use commands::{run_batch, run_config, run_detect, run_get};

/// Top-level CLI for the mfetch media downloader.
#[derive(Debug, Parser)]
#[command(name = "mfetch")]
#[command(about = "mfetch: fetch video or audio from media sites and direct links", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options shared by commands that download.
#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    /// Output kind: video or audio.
    #[arg(long, default_value = "video")]
    pub mode: MediaMode,

    /// Requester id the per-requester limit is counted against.
    #[arg(long, default_value_t = 0, value_name = "ID")]
    pub requester: RequesterId,

    /// Directory results are copied into (default: current directory).
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one URL.
    Get {
        /// Media page or direct file URL.
        url: String,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Download every URL listed in a file (first URL on each line).
    Batch {
        /// Text file with one URL per line; blank lines and `#` comments are skipped.
        file: PathBuf,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Print which platform a URL belongs to.
    Detect {
        url: String,
    },

    /// Print the effective configuration (file plus environment overrides).
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<ExitCode> {
        let cli = Cli::parse();
        if let CliCommand::Detect { url } = &cli.command {
            return run_detect(url);
        }

        let cfg = config::load_effective()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get { url, fetch } => run_get(&cfg, &url, &fetch).await,
            CliCommand::Batch { file, fetch } => run_batch(&cfg, &file, &fetch).await,
            CliCommand::Config => run_config(&cfg),
            CliCommand::Detect { .. } => Ok(ExitCode::SUCCESS),
        }
    }
}

#[cfg(test)]
mod tests;
