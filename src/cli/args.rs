//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;
use clap_num::number_range;

use crate::domain::model::AnalysisConfig;
use crate::output::OutputFormat;
use crate::utils::time::parse_seconds;

fn parse_max_clips(s: &str) -> Result<usize, String> {
    number_range(s, 1, 1000)
}

fn parse_workers(s: &str) -> Result<usize, String> {
    number_range(s, 1, 256)
}

fn parse_weight(s: &str) -> Result<f64, String> {
    let weight: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid weight '{}'", s))?;
    if !weight.is_finite() || weight < 0.0 {
        return Err(format!("weight must be a non-negative number, got '{}'", s));
    }
    Ok(weight)
}

/// Window planning flags shared by `analyze` and `windows`
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Candidate length (seconds, MM:SS or HH:MM:SS)
    #[arg(long, value_parser = parse_seconds)]
    pub clip_duration: Option<f64>,

    /// Overlap between consecutive windows
    #[arg(long, value_parser = parse_seconds)]
    pub overlap: Option<f64>,

    /// Shortest acceptable window
    #[arg(long, value_parser = parse_seconds)]
    pub min_clip_length: Option<f64>,
}

impl WindowArgs {
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(clip_duration) = self.clip_duration {
            config.clip_duration = clip_duration;
        }
        if let Some(overlap) = self.overlap {
            config.overlap = overlap;
        }
        if let Some(min_clip_length) = self.min_clip_length {
            config.min_clip_length = min_clip_length;
        }
    }
}

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Media file to analyze
    pub asset: PathBuf,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Maximum number of candidates to report
    #[arg(long, value_parser = parse_max_clips)]
    pub max_clips: Option<usize>,

    /// Weight of audio energy in the score
    #[arg(long, value_parser = parse_weight)]
    pub audio_weight: Option<f64>,

    /// Weight of the scene change rate in the score
    #[arg(long, value_parser = parse_weight)]
    pub visual_weight: Option<f64>,

    /// Weight of motion level in the score
    #[arg(long, value_parser = parse_weight)]
    pub motion_weight: Option<f64>,

    /// Windows analyzed concurrently
    #[arg(long, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log per-window progress at debug level only
    #[arg(long)]
    pub quiet_progress: bool,
}

impl AnalyzeArgs {
    /// Layer these flags over a loaded configuration
    pub fn apply(&self, config: &mut AnalysisConfig) {
        self.window.apply(config);
        if let Some(max_clips) = self.max_clips {
            config.max_clips = max_clips;
        }
        if let Some(audio) = self.audio_weight {
            config.weights.audio = audio;
        }
        if let Some(visual) = self.visual_weight {
            config.weights.visual = visual;
        }
        if let Some(motion) = self.motion_weight {
            config.weights.motion = motion;
        }
    }
}

/// Arguments for the windows command
#[derive(Args, Debug)]
pub struct WindowsArgs {
    /// Media file to plan
    pub asset: PathBuf,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Listing format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
