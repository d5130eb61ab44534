// Adapters - External system implementations

pub mod metrics_ffmpeg;
pub mod metrics_memory;
pub mod toml_config;
pub mod tracing_reporter;

// Re-export adapters
pub use metrics_ffmpeg::FfmpegMetricsProvider;
pub use metrics_memory::InMemoryMetricsProvider;
pub use toml_config::{EngineSettings, Settings, TomlConfigAdapter};
pub use tracing_reporter::TracingJobReporter;
