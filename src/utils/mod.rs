//! Common utilities and helpers

pub mod logging;
pub mod time;

pub use logging::{LogFormat, LogLevel, LoggingConfig, LoggingSystem};
pub use time::{format_timestamp, parse_seconds};
