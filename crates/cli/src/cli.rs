//! Command line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use reelcrawl_core::{Config, SchedulingMode};

#[derive(Parser)]
#[command(name = "reelcrawl")]
#[command(about = "Crawl episode pages for transfer links and download them, reported in order")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: $REELCRAWL_CONFIG, then ./reelcrawl.toml if present)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging (-vv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl identifiers, e.g. `reelcrawl run 1-12 15 20,21`
    Run(RunArgs),
    /// Print the effective configuration (secrets hidden)
    Config,
    /// Validate the configuration and the download program
    Check,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    Chunked,
    Dynamic,
}

impl From<ModeArg> for SchedulingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Chunked => SchedulingMode::Chunked,
            ModeArg::Dynamic => SchedulingMode::Dynamic,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Identifiers: numbers, comma lists or ranges (`1-12`)
    #[arg(required = true, num_args = 1..)]
    pub identifiers: Vec<String>,

    /// Concurrent pipelines
    #[arg(long, short)]
    pub workers: Option<usize>,

    /// Hyper mode (12 workers, 200 ms between chunks)
    #[arg(long)]
    pub hyper: bool,

    /// Pause between chunks in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Scheduling mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Download every successful extraction
    #[arg(long, overrides_with = "no_download")]
    pub download: bool,

    /// Only extract links
    #[arg(long, overrides_with = "download")]
    pub no_download: bool,

    /// Download directory
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Snapshot directory
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,

    /// Do not write a snapshot
    #[arg(long)]
    pub no_snapshot: bool,

    /// Serve the status endpoint on this port
    #[arg(long)]
    pub status_port: Option<u16>,
}

impl RunArgs {
    /// Applies command line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.scheduler.workers = workers;
        }
        if self.hyper {
            config.scheduler.hyper = true;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.scheduler.inter_chunk_delay_ms = delay_ms;
        }
        if let Some(mode) = self.mode {
            config.scheduler.mode = mode.into();
        }
        if self.download {
            config.download.auto_download = true;
        }
        if self.no_download {
            config.download.auto_download = false;
        }
        if let Some(dest) = &self.dest {
            config.download.destination_dir = dest.clone();
        }
        if let Some(dir) = &self.snapshot_dir {
            config.snapshot.directory = dir.clone();
        }
        if self.no_snapshot {
            config.snapshot.enabled = false;
        }
        if let Some(port) = self.status_port {
            config.status.enabled = true;
            config.status.port = port;
        }
    }
}
