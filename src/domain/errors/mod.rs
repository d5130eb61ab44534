// Domain errors - Error taxonomy for the analysis engine

use thiserror::Error;

use crate::domain::model::AnalysisWindow;

/// Fatal analysis errors.
///
/// Degraded metrics never appear here: they are recovered inside the metrics
/// provider and only observable through logs and `MetricReading::degraded`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Configuration rejected before any I/O
    #[error("Invalid analysis configuration: {reason}")]
    ConfigInvalid { reason: String },

    /// Asset shorter than the shortest acceptable window
    #[error("Asset too short: {asset} is {duration:.2}s (minimum: {min_clip_length}s)")]
    AssetTooShort {
        asset: String,
        duration: f64,
        min_clip_length: f64,
    },

    /// Asset could not be opened or read at all
    #[error("Asset unreadable: {asset}{}: {reason}", window_suffix(.window))]
    AssetUnreadable {
        asset: String,
        window: Option<AnalysisWindow>,
        reason: String,
    },

    /// External media tool could not be started
    #[error("Media tool unavailable: {tool}: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    /// Worker task failure
    #[error("Internal analysis error: {reason}")]
    Internal { reason: String },
}

fn window_suffix(window: &Option<AnalysisWindow>) -> String {
    match window {
        Some(w) => format!(" (window {:.2}s-{:.2}s)", w.start, w.end),
        None => String::new(),
    }
}

impl AnalysisError {
    /// Shorthand for configuration failures
    pub fn config(reason: impl Into<String>) -> Self {
        AnalysisError::ConfigInvalid {
            reason: reason.into(),
        }
    }

    /// Shorthand for unreadable assets
    pub fn unreadable(
        asset: impl Into<String>,
        window: Option<AnalysisWindow>,
        reason: impl Into<String>,
    ) -> Self {
        AnalysisError::AssetUnreadable {
            asset: asset.into(),
            window,
            reason: reason.into(),
        }
    }

    /// Whether the error depends only on the configuration
    pub fn is_config_error(&self) -> bool {
        matches!(self, AnalysisError::ConfigInvalid { .. })
    }
}

/// Result type alias for analysis operations
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
