//! Kiosk CLI - Headless host for kiosk pages
//!
//! Features:
//! - Real-time page playback with a logging presenter
//! - Ahead-of-time page plans from a simulated clock
//! - Library and config checks

use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use output::ProgressWriter;
use std::path::PathBuf;

mod commands;
mod output;

/// Kiosk CLI - Page playback toolkit
#[derive(Parser)]
#[command(name = "kiosk-cli")]
#[command(author = "DreamBody Kiosk")]
#[command(version)]
#[command(about = "Play, plan, and check kiosk video pages", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a page in real time
    Play {
        /// Path to the JSON video library
        #[arg(short, long)]
        library: PathBuf,

        /// Page to play
        #[arg(short, long)]
        page: u32,

        /// Path to a JSON session config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show when each phase of a page begins
    Plan {
        /// Path to the JSON video library
        #[arg(short, long)]
        library: PathBuf,

        /// Page to plan
        #[arg(short, long)]
        page: u32,

        /// Path to a JSON session config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate the config and resolve every page
    Check {
        /// Path to the JSON video library
        #[arg(short, long)]
        library: PathBuf,

        /// Path to a JSON session config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Log lines go through the progress bar so they never overwrite it
    let progress = ProgressBar::hidden();
    let writer = progress.clone();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(move || ProgressWriter::new(writer.clone()))
        .init();

    kiosk_core::init();

    match cli.command {
        Commands::Play { library, page, config } => {
            commands::play(&library, page, config, &cli.format, progress).await?;
        }
        Commands::Plan { library, page, config } => {
            commands::plan(&library, page, config, &cli.format).await?;
        }
        Commands::Check { library, config } => {
            commands::check(&library, config, &cli.format).await?;
        }
    }

    Ok(())
}
