//! PitchPilot CLI: command-line interface for script video rendering.
//!
//! Usage:
//!   pitchpilot render [SCRIPT]   Render a captioned video
//!   pitchpilot plan              Print the ffmpeg command a render would run
//!   pitchpilot poster <VIDEO>    Extract (or reuse) a poster frame
//!   pitchpilot check             Check ffmpeg, assets and font
//!   pitchpilot assets            Generate placeholder clips and audio

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pitchpilot_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "pitchpilot",
    about = "Captioned marketing videos from a script and stock clips",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the XDG config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a video for a script
    Render {
        /// Script text (read from --script-file or stdin when omitted)
        script: Option<String>,

        /// Read the script from a file
        #[arg(long, conflicts_with = "script")]
        script_file: Option<PathBuf>,

        /// Crop clips and add title/outro cards
        #[arg(long)]
        enhanced: bool,

        /// Print events and the outcome as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show the ffmpeg invocation for the current assets without running it
    Plan {
        /// Plan the enhanced variant
        #[arg(long)]
        enhanced: bool,
    },

    /// Extract a poster frame from a rendered video
    Poster {
        /// Path to the rendered video
        video: PathBuf,
    },

    /// Check ffmpeg, assets and font
    Check,

    /// Generate placeholder clips and background audio
    Assets {
        /// Replace files that already exist
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    // Initialize logging
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    pitchpilot_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Render {
            script,
            script_file,
            enhanced,
            json,
        } => commands::render::run(config.pipeline, script, script_file, enhanced, json).await,
        Commands::Plan { enhanced } => commands::plan::run(config.pipeline, enhanced),
        Commands::Poster { video } => commands::poster::run(config.pipeline, video).await,
        Commands::Check => commands::check::run(config.pipeline).await,
        Commands::Assets { force } => commands::assets::run(config.pipeline, force).await,
    }
}
