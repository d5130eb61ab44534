//! CLI module for ClipScan
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::logging::{LogFormat, LogLevel};

pub mod args;
pub mod commands;

/// ClipScan highlight finder
///
/// Splits a media file into overlapping windows, measures audio energy, scene
/// changes and motion in each, and ranks the windows as clip candidates.
#[derive(Parser, Debug)]
#[command(name = "clipscan")]
#[command(about = "ClipScan - Rank the most engaging segments of a video")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    /// Configuration file (default: $CLIPSCAN_CONFIG, then ./clipscan.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank the best clip candidates of a media file
    Analyze(args::AnalyzeArgs),
    /// Show the windows an analysis would score
    Windows(args::WindowsArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "clipscan",
            "analyze",
            "talk.mp4",
            "--clip-duration",
            "1:00",
            "--max-clips",
            "3",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.log_level, LogLevel::Debug);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.asset, PathBuf::from("talk.mp4"));
                assert_eq!(args.window.clip_duration, Some(60.0));
                assert_eq!(args.max_clips, Some(3));
                assert_eq!(args.format, crate::output::OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_zero_max_clips() {
        let result = Cli::try_parse_from(["clipscan", "analyze", "a.mp4", "--max-clips", "0"]);
        assert!(result.is_err());
    }
}
