// Ports - Interface definitions (contracts)

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::errors::AnalysisError;
use crate::domain::model::{AnalysisWindow, MetricReading};

/// Port for per-window media measurements
///
/// Implementations recover single-metric failures themselves (see
/// `MetricReading::assemble`) and only return an error when the asset cannot
/// be read at all or the underlying tool is missing.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Total asset duration in seconds
    async fn duration(&self, asset: &Path) -> Result<f64, AnalysisError>;

    /// Measure one window. `scratch` is a directory owned by the calling
    /// analysis run and removed when it ends.
    async fn sample(
        &self,
        asset: &Path,
        window: &AnalysisWindow,
        scratch: &Path,
    ) -> Result<MetricReading, AnalysisError>;
}

/// Lifecycle state reported to a job tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(status)
    }
}

/// Payload accompanying a status update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    /// Percentage in 0..=100
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobUpdate {
    pub fn progress(progress: u8) -> Self {
        Self {
            progress: progress.min(100),
            message: None,
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Failure inside a job reporter; never affects the analysis
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Job reporter failed: {message}")]
pub struct ReporterError {
    pub message: String,
}

impl ReporterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Port for progress reporting to an external job tracker
///
/// Fire-and-forget: implementations must return promptly and must not block
/// the caller.
pub trait JobReporter: Send + Sync {
    fn report(&self, status: JobStatus, update: JobUpdate) -> Result<(), ReporterError>;
}
