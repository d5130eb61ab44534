//! ClipScan CLI
//!
//! Ranks the most engaging segments of a video as highlight clip candidates.
//!
//! # Usage
//!
//! ```bash
//! clipscan analyze talk.mp4 --clip-duration 45 --overlap 15 --max-clips 5
//! clipscan analyze talk.mp4 --format json --output clips.json
//! clipscan windows talk.mp4 --clip-duration 1:00
//! clipscan config
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use clipscan::cli::{commands, Cli, Commands};
use clipscan::utils::logging::{LoggingConfig, LoggingSystem};

/// Main entry point for the ClipScan CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = LoggingSystem::new(LoggingConfig {
        level: cli.log_level,
        format: cli.log_format,
        ..LoggingConfig::default()
    });
    logging.initialize()?;
    logging.log_system_info();

    let settings = commands::load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze(args) => {
            info!("Executing analyze command");
            commands::analyze(args, settings).await?;
        }
        Commands::Windows(args) => {
            info!("Executing windows command");
            commands::windows(args, settings).await?;
        }
        Commands::Config => commands::show_config(&settings)?,
    }

    Ok(())
}
