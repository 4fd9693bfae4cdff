//! # vecsync CLI
//!
//! ## Usage
//!
//! ```bash
//! vecsync [--config ./vecsync.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vecsync scan <root>` | List the files a sync would ingest |
//! | `vecsync provision` | Create the index if missing and wait until it is ready |
//! | `vecsync sync <root>` | Embed and upsert every selected file |
//!
//! Credentials are read from `OPENAI_API_KEY` and `PINECONE_API_KEY`.
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

use vecsync::config::{self, Config};
use vecsync::ingest::{self, SyncOptions};
use vecsync::progress::ProgressMode;
use vecsync::{provision, selector};

/// vecsync: sync a source tree into a vector-search index.
#[derive(Parser)]
#[command(
    name = "vecsync",
    about = "Sync a source tree into a vector-search index",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Progress output on stderr: `human`, `json`, or `off`.
    /// Defaults to `human` when stderr is a terminal.
    #[arg(long, global = true, value_parser = parse_progress)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the files that would be synced from a directory.
    Scan {
        /// Root directory to walk.
        root: PathBuf,
    },

    /// Ensure the index exists and is ready for writes.
    Provision {
        /// Index name (overrides `[index].name`).
        #[arg(long)]
        index: Option<String>,
    },

    /// Embed every selected file and upsert it into the index.
    ///
    /// Per-file failures are reported in the summary and do not change the
    /// exit status.
    Sync {
        /// Root directory to walk.
        root: PathBuf,

        /// Index name (overrides `[index].name`).
        #[arg(long)]
        index: Option<String>,

        /// Dry run: read files but make no embedding or index calls.
        #[arg(long)]
        dry_run: bool,

        /// Files processed at once (overrides `[ingest].concurrency`).
        #[arg(long)]
        concurrency: Option<usize>,

        /// Maximum number of files to process.
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn parse_progress(s: &str) -> Result<ProgressMode, String> {
    ProgressMode::parse(s)
        .ok_or_else(|| format!("invalid progress mode '{}': expected human, json, or off", s))
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    let progress = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();

    match cli.command {
        Commands::Scan { root } => {
            selector::run_scan(&cfg, &root)?;
        }
        Commands::Provision { index } => {
            provision::run_provision(&cfg, index, progress.as_ref()).await?;
        }
        Commands::Sync {
            root,
            index,
            dry_run,
            concurrency,
            limit,
        } => {
            if concurrency == Some(0) {
                anyhow::bail!("--concurrency must be >= 1");
            }
            let opts = SyncOptions {
                root,
                index,
                dry_run,
                concurrency,
                limit,
            };
            ingest::run_sync(&cfg, opts, progress.as_ref()).await?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
