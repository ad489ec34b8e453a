// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Volna - queue-driven media publisher for Telegram forum topics.
//!
//! This is the binary entry point for the Volna service and its admin
//! commands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod populate;
mod start;
mod topics;
mod upload;

/// Volna - queue-driven media publisher for Telegram forum topics.
#[derive(Parser, Debug)]
#[command(name = "volna", version, about, long_about = None)]
struct Cli {
    /// Explicit config file path (default: XDG hierarchy).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the queue drain service.
    Start,
    /// Manage forum topics.
    Topics {
        #[command(subcommand)]
        command: TopicsCommands,
    },
    /// Enqueue media scheduled on or after a date.
    Populate {
        /// Enqueue media scheduled on or after this date (YYYY-MM-DD).
        #[arg(long, conflicts_with = "recent")]
        since: Option<NaiveDate>,
        /// Enqueue media scheduled since the most recent publish.
        #[arg(long)]
        recent: bool,
        /// Restrict to a single tag.
        #[arg(long)]
        tagid: Option<i64>,
    },
    /// Upload and send a single file, bypassing the queue.
    Upload {
        /// Path to the media file.
        #[arg(long)]
        path: PathBuf,
        /// Target forum thread id.
        #[arg(long)]
        thread: i64,
        /// Audio title (default: file name).
        #[arg(long)]
        title: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum TopicsCommands {
    /// Print all configured topics and their publish state.
    List,
    /// Create unpublished topics at the endpoint and record their threads.
    Update,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => volna_config::loader::load_config_from_path(path)
            .map_err(|e| volna_core::VolnaError::Config(e.to_string()))
            .and_then(|c| {
                volna_config::validation::validate_config(&c)?;
                Ok(c)
            }),
        None => volna_config::load_and_validate(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("volna: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.server.log_level);

    let result = match cli.command {
        Commands::Start => start::run_start(config).await,
        Commands::Topics { command } => match command {
            TopicsCommands::List => topics::run_list(config).await,
            TopicsCommands::Update => topics::run_update(config).await,
        },
        Commands::Populate {
            since,
            recent,
            tagid,
        } => populate::run_populate(config, since, recent, tagid).await,
        Commands::Upload {
            path,
            thread,
            title,
        } => upload::run_upload(config, path, thread, title).await,
    };

    if let Err(e) = result {
        eprintln!("volna: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("volna={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
