//! Sunlapse CLI: acquire solar images on a schedule and turn them into a time-lapse.
//!
//! Usage:
//!   sunlapse acquire [OPTIONS]     Fetch numbered frames at a fixed interval
//!   sunlapse assemble [DIR]        Encode the frames of a directory into output.mp4
//!   sunlapse sources               List the available image feeds
//!   sunlapse check                 Check system capabilities

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sunlapse_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "sunlapse",
    about = "Scheduled solar image acquisition and time-lapse assembly",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch frames from an image feed at a fixed interval
    Acquire(AcquireArgs),

    /// Assemble the frames of a directory into a video
    Assemble {
        /// Directory containing the frames (defaults to the configured frames directory)
        dir: Option<PathBuf>,

        /// Output frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Output file path (defaults to <DIR>/output.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the available image feeds
    Sources {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check system capabilities
    Check,
}

#[derive(Args)]
pub struct AcquireArgs {
    /// Number of images to fetch
    #[arg(short = 'n', long)]
    pub count: Option<u32>,

    /// Minutes between fetches
    #[arg(short, long, conflicts_with = "interval_secs")]
    pub interval_mins: Option<u64>,

    /// Seconds between fetches
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Directory to save frames to
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Image feed name (see `sunlapse sources`)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Sequence number of the first frame
    #[arg(long)]
    pub start: Option<u64>,

    /// Print status events as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    sunlapse_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Acquire(args) => commands::acquire::run(&config, args).await,
        Commands::Assemble { dir, fps, output } => {
            commands::assemble::run(&config, dir, fps, output).await
        }
        Commands::Sources { json } => commands::sources::run(json),
        Commands::Check => commands::check::run(&config),
    }
}
