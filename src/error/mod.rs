//! Error handling module for ClipScan

use thiserror::Error;

use crate::domain::errors::AnalysisError;

/// Main error type for ClipScan operations outside the analysis core
#[derive(Error, Debug)]
pub enum ClipScanError {
    /// Analysis failed
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Configuration file missing or unreadable
    #[error("Configuration file error: {path}: {message}")]
    ConfigFile { path: String, message: String },

    /// Configuration file or override could not be parsed
    #[error("Invalid configuration: {message}")]
    ConfigParse { message: String },

    /// Report serialization error
    #[error("Failed to render report: {message}")]
    OutputError { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for ClipScan operations
pub type ClipScanResult<T> = std::result::Result<T, ClipScanError>;
