// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use filtercam::Tier;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "filtercam")]
#[command(about = "Capture photos and videos and run them through filters")]
#[command(version = filtercam::constants::app_info::version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available filters
    Filters {
        /// Subscription tier to check filters against (free, premium)
        #[arg(short, long)]
        tier: Option<Tier>,
    },

    /// Take a photo from a source image and process it
    Photo {
        /// Image file standing in for the camera
        source: PathBuf,

        /// Filter id (from 'filtercam filters')
        #[arg(short, long)]
        filter: Option<String>,

        /// Subscription tier (default: from the subscription backend, else free)
        #[arg(short, long)]
        tier: Option<Tier>,

        /// Output directory (default: ~/Pictures/FilterCam)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record a video from a source clip and process it
    Video {
        /// Video file standing in for the camera
        source: PathBuf,

        /// Recording duration in seconds (stops at 60 regardless)
        #[arg(short, long, default_value = "10")]
        duration: u32,

        /// Filter id (from 'filtercam filters')
        #[arg(short, long)]
        filter: Option<String>,

        /// Subscription tier (default: from the subscription backend, else free)
        #[arg(short, long)]
        tier: Option<Tier>,

        /// Output directory (default: ~/Pictures/FilterCam)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=filtercam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Filters { tier } => cli::list_filters(tier),
        Commands::Photo {
            source,
            filter,
            tier,
            output,
        } => cli::take_photo(source, filter, tier, output),
        Commands::Video {
            source,
            duration,
            filter,
            tier,
            output,
        } => cli::record_video(source, duration, filter, tier, output),
    }
}
