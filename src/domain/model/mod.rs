// Domain models - Core types and data structures

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::errors::{AnalysisError, AnalysisResult};

/// Value substituted for a metric whose extraction failed.
///
/// "Below moderate, not absent": a noisy extraction neither zeroes out nor
/// inflates a window's score. Overridable through `EngineSettings`.
pub const DEFAULT_METRIC_FALLBACK: f64 = 0.3;

/// Relative weight of each signal in the composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub audio: f64,
    pub visual: f64,
    pub motion: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            audio: 0.4,
            visual: 0.3,
            motion: 0.3,
        }
    }
}

impl ScoreWeights {
    pub fn new(audio: f64, visual: f64, motion: f64) -> Self {
        Self {
            audio,
            visual,
            motion,
        }
    }

    pub fn sum(&self) -> f64 {
        self.audio + self.visual + self.motion
    }
}

/// Immutable input of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Desired candidate length in seconds
    pub clip_duration: f64,
    /// Overlap between consecutive windows in seconds
    pub overlap: f64,
    /// Shortest acceptable window in seconds
    pub min_clip_length: f64,
    /// Cap on returned candidates
    pub max_clips: usize,
    pub weights: ScoreWeights,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            clip_duration: 60.0,
            overlap: 30.0,
            min_clip_length: 10.0,
            max_clips: 10,
            weights: ScoreWeights::default(),
        }
    }
}

impl AnalysisConfig {
    /// Time advance between consecutive window starts
    pub fn step(&self) -> f64 {
        self.clip_duration - self.overlap
    }

    /// Validate the configuration without touching any asset
    pub fn validate(&self) -> AnalysisResult<()> {
        let finite = [
            ("clip_duration", self.clip_duration),
            ("overlap", self.overlap),
            ("min_clip_length", self.min_clip_length),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(AnalysisError::config(format!("{} must be finite", name)));
            }
        }

        if self.overlap < 0.0 {
            return Err(AnalysisError::config(format!(
                "overlap ({}) cannot be negative",
                self.overlap
            )));
        }
        if self.step() <= 0.0 {
            return Err(AnalysisError::config(format!(
                "clip_duration ({}) must be greater than overlap ({})",
                self.clip_duration, self.overlap
            )));
        }
        if self.min_clip_length <= 0.0 {
            return Err(AnalysisError::config(format!(
                "min_clip_length ({}) must be positive",
                self.min_clip_length
            )));
        }
        if self.max_clips == 0 {
            return Err(AnalysisError::config("max_clips must be at least 1"));
        }

        let weights = [
            ("audio", self.weights.audio),
            ("visual", self.weights.visual),
            ("motion", self.weights.motion),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AnalysisError::config(format!(
                    "{} weight ({}) must be a non-negative number",
                    name, weight
                )));
            }
        }

        Ok(())
    }
}

/// Contiguous time range of the asset considered as one candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: f64,
    pub end: f64,
}

impl AnalysisWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for AnalysisWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}s, {:.2}s]", self.start, self.end)
    }
}

/// The three independently extracted signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    AudioEnergy,
    SceneChangeRate,
    MotionLevel,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::AudioEnergy => "audio energy",
            MetricKind::SceneChangeRate => "scene change rate",
            MetricKind::MotionLevel => "motion level",
        };
        f.write_str(name)
    }
}

/// Raw per-window measurement, every value in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub audio_energy: f64,
    pub scene_change_rate: f64,
    pub motion_level: f64,
}

impl MetricSample {
    pub fn new(audio_energy: f64, scene_change_rate: f64, motion_level: f64) -> Self {
        Self {
            audio_energy,
            scene_change_rate,
            motion_level,
        }
    }

    /// Sample with every metric at the given value
    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value)
    }

    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::AudioEnergy => self.audio_energy,
            MetricKind::SceneChangeRate => self.scene_change_rate,
            MetricKind::MotionLevel => self.motion_level,
        }
    }

    /// Copy rounded to two decimals for display
    pub fn rounded(&self) -> Self {
        Self::new(
            round2(self.audio_energy),
            round2(self.scene_change_rate),
            round2(self.motion_level),
        )
    }
}

/// A sample together with the metrics that fell back to the default
#[derive(Debug, Clone, PartialEq)]
pub struct MetricReading {
    pub sample: MetricSample,
    pub degraded: Vec<MetricKind>,
}

impl MetricReading {
    pub fn new(sample: MetricSample) -> Self {
        Self {
            sample,
            degraded: Vec::new(),
        }
    }

    /// Combine three extraction outcomes, substituting `fallback` for failures.
    ///
    /// Successful values are clamped into [0, 1]; non-finite values count as
    /// failures.
    pub fn assemble(
        asset: &str,
        window: &AnalysisWindow,
        audio_energy: Result<f64, String>,
        scene_change_rate: Result<f64, String>,
        motion_level: Result<f64, String>,
        fallback: f64,
    ) -> Self {
        let mut degraded = Vec::new();
        let mut resolve = |kind: MetricKind, outcome: Result<f64, String>| -> f64 {
            match outcome {
                Ok(value) if value.is_finite() => value.clamp(0.0, 1.0),
                Ok(value) => {
                    warn!(asset, window = %window, metric = %kind, value, "Non-finite metric, using fallback");
                    degraded.push(kind);
                    fallback
                }
                Err(reason) => {
                    warn!(asset, window = %window, metric = %kind, %reason, "Metric extraction degraded, using fallback");
                    degraded.push(kind);
                    fallback
                }
            }
        };

        let sample = MetricSample::new(
            resolve(MetricKind::AudioEnergy, audio_energy),
            resolve(MetricKind::SceneChangeRate, scene_change_rate),
            resolve(MetricKind::MotionLevel, motion_level),
        );

        Self { sample, degraded }
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Qualitative bucket of a composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreLabel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScoreLabel::Excellent => "Excellent",
            ScoreLabel::Good => "Good",
            ScoreLabel::Fair => "Fair",
            ScoreLabel::Poor => "Poor",
        };
        f.write_str(label)
    }
}

/// One ranked highlight candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipCandidate {
    pub id: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub score: f64,
    pub score_label: ScoreLabel,
    pub metrics: MetricSample,
    pub reasons: Vec<String>,
}

impl ClipCandidate {
    /// Stable identifier derived from the rounded window bounds
    pub fn id_for(window: &AnalysisWindow) -> String {
        format!(
            "clip_{}_{}",
            window.start.round() as i64,
            window.end.round() as i64
        )
    }

    pub fn window(&self) -> AnalysisWindow {
        AnalysisWindow::new(self.start, self.end)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests;
