// TOML config adapter - Settings from files and environment overrides

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::errors::{AnalysisError, AnalysisResult};
use crate::domain::model::{AnalysisConfig, DEFAULT_METRIC_FALLBACK};
use crate::error::{ClipScanError, ClipScanResult};

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "clipscan.toml";
/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "CLIPSCAN_CONFIG";

/// Execution settings of the analysis engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Window analyses running at once
    pub workers: usize,
    /// Value substituted for a failed metric extraction
    pub metric_fallback: f64,
    /// Upper bound on one ffmpeg extraction
    pub extraction_timeout_secs: u64,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    /// Parent of per-run scratch directories; system temp dir when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_root: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            metric_fallback: DEFAULT_METRIC_FALLBACK,
            extraction_timeout_secs: 120,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            scratch_root: None,
        }
    }
}

impl EngineSettings {
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if self.workers == 0 {
            return Err(AnalysisError::config("workers must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.metric_fallback) {
            return Err(AnalysisError::config(format!(
                "metric_fallback ({}) must be within [0, 1]",
                self.metric_fallback
            )));
        }
        if self.extraction_timeout_secs == 0 {
            return Err(AnalysisError::config(
                "extraction_timeout_secs must be positive",
            ));
        }
        Ok(())
    }
}

/// Complete settings: `[analysis]` and `[engine]` tables
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analysis: AnalysisConfig,
    pub engine: EngineSettings,
}

/// TOML configuration adapter
///
/// Precedence is CLI > environment > file > defaults; the CLI layer applies
/// its own overrides on top of what this adapter loads.
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse settings from TOML text
    pub fn parse(content: &str) -> ClipScanResult<Settings> {
        toml::from_str(content).map_err(|e| ClipScanError::ConfigParse {
            message: format!("Failed to parse TOML config: {}", e),
        })
    }

    /// Load settings from a file
    pub fn load_file(path: &Path) -> ClipScanResult<Settings> {
        let content = std::fs::read_to_string(path).map_err(|e| ClipScanError::ConfigFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        info!("Loading configuration from: {}", path.display());
        Self::parse(&content)
    }

    /// Resolve the config file to use, if any
    ///
    /// An explicit path must exist. Otherwise `$CLIPSCAN_CONFIG` is tried,
    /// then `clipscan.toml` in the working directory.
    pub fn locate(explicit: Option<&Path>) -> ClipScanResult<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ClipScanError::ConfigFile {
                    path: path.display().to_string(),
                    message: "file does not exist".to_string(),
                });
            }
            return Ok(Some(path.to_path_buf()));
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from) {
            return Ok(Some(path));
        }

        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        Ok(local.exists().then_some(local))
    }

    /// File settings with environment overrides applied
    pub fn load(explicit: Option<&Path>) -> ClipScanResult<Settings> {
        let mut settings = match Self::locate(explicit)? {
            Some(path) => Self::load_file(&path)?,
            None => {
                debug!("No configuration file found, using defaults");
                Settings::default()
            }
        };
        Self::apply_overrides(&mut settings, |key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Apply `CLIPSCAN_*` overrides read through `lookup`
    pub fn apply_overrides<F>(settings: &mut Settings, lookup: F) -> ClipScanResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = 0;

        if let Some(value) = lookup("CLIPSCAN_WORKERS") {
            settings.engine.workers = parse_value("CLIPSCAN_WORKERS", &value)?;
            applied += 1;
        }
        if let Some(value) = lookup("CLIPSCAN_METRIC_FALLBACK") {
            settings.engine.metric_fallback = parse_value("CLIPSCAN_METRIC_FALLBACK", &value)?;
            applied += 1;
        }
        if let Some(value) = lookup("CLIPSCAN_EXTRACTION_TIMEOUT_SECS") {
            settings.engine.extraction_timeout_secs =
                parse_value("CLIPSCAN_EXTRACTION_TIMEOUT_SECS", &value)?;
            applied += 1;
        }
        if let Some(value) = lookup("CLIPSCAN_FFMPEG") {
            settings.engine.ffmpeg_path = PathBuf::from(value);
            applied += 1;
        }
        if let Some(value) = lookup("CLIPSCAN_FFPROBE") {
            settings.engine.ffprobe_path = PathBuf::from(value);
            applied += 1;
        }
        if let Some(value) = lookup("CLIPSCAN_SCRATCH_ROOT") {
            settings.engine.scratch_root = Some(PathBuf::from(value));
            applied += 1;
        }
        if let Some(value) = lookup("CLIPSCAN_MAX_CLIPS") {
            settings.analysis.max_clips = parse_value("CLIPSCAN_MAX_CLIPS", &value)?;
            applied += 1;
        }

        if applied > 0 {
            info!("Applied {} environment variable overrides", applied);
        }
        Ok(())
    }

    /// Render settings as TOML
    pub fn render(settings: &Settings) -> ClipScanResult<String> {
        toml::to_string_pretty(settings).map_err(|e| ClipScanError::OutputError {
            message: format!("TOML serialization failed: {}", e),
        })
    }
}

fn parse_value<T>(key: &str, value: &str) -> ClipScanResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ClipScanError::ConfigParse {
            message: format!("{} = {:?}: {}", key, value, e),
        })
}
