//! ClipScan Highlight Analysis Library
//!
//! Splits a media asset into overlapping time windows, measures audio energy,
//! scene change rate and motion level per window with ffmpeg, and ranks the
//! windows as highlight clip candidates.
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use clipscan::adapters::FfmpegMetricsProvider;
//! use clipscan::app::AnalyzeInteractor;
//! use clipscan::domain::model::AnalysisConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(FfmpegMetricsProvider::new()?);
//! let interactor = AnalyzeInteractor::new(provider, 4, std::env::temp_dir());
//! let clips = interactor
//!     .analyze(Path::new("talk.mp4"), &AnalysisConfig::default(), None)
//!     .await?;
//! for clip in clips {
//!     println!("{} {:.2} {}", clip.id, clip.score, clip.score_label);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod error;
pub mod output;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{AnalysisOutcome, AnalyzeInteractor};
pub use domain::errors::{AnalysisError, AnalysisResult};
pub use domain::model::{
    AnalysisConfig, AnalysisWindow, ClipCandidate, MetricSample, ScoreLabel, ScoreWeights,
};
pub use error::{ClipScanError, ClipScanResult};
pub use ports::{JobReporter, JobStatus, JobUpdate, MetricsProvider};
