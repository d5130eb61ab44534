//! Analysis reports and their rendering

use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::app::AnalysisOutcome;
use crate::domain::model::{AnalysisConfig, AnalysisWindow, ClipCandidate, ScoreWeights};
use crate::error::{ClipScanError, ClipScanResult};
use crate::utils::time::format_timestamp;

pub mod writer;

pub use writer::ReportWriter;

/// Report serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    Json,
    Yaml,
}

/// Candidate with its 1-based position in the ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedClip {
    pub rank: usize,
    #[serde(flatten)]
    pub candidate: ClipCandidate,
}

/// Analysis settings as echoed in reports, in the reports' camelCase keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    pub clip_duration: f64,
    pub overlap: f64,
    pub min_clip_length: f64,
    pub max_clips: usize,
    pub weights: ScoreWeights,
}

impl From<&AnalysisConfig> for ReportConfig {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            clip_duration: config.clip_duration,
            overlap: config.overlap,
            min_clip_length: config.min_clip_length,
            max_clips: config.max_clips,
            weights: config.weights,
        }
    }
}

/// Result of one `analyze` run, enriched for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub asset: String,
    pub asset_duration: f64,
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub config: ReportConfig,
    pub windows_analyzed: usize,
    pub total_clips: usize,
    pub degraded_metrics: usize,
    pub clips: Vec<RankedClip>,
}

impl AnalysisReport {
    pub fn new(asset: impl Into<String>, config: &AnalysisConfig, outcome: AnalysisOutcome) -> Self {
        Self::at(asset, config, outcome, Utc::now())
    }

    pub fn at(
        asset: impl Into<String>,
        config: &AnalysisConfig,
        outcome: AnalysisOutcome,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let clips: Vec<RankedClip> = outcome
            .candidates
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| RankedClip {
                rank: index + 1,
                candidate,
            })
            .collect();

        Self {
            asset: asset.into(),
            asset_duration: outcome.asset_duration,
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            config: ReportConfig::from(config),
            windows_analyzed: outcome.windows_analyzed,
            total_clips: clips.len(),
            degraded_metrics: outcome.degraded_metrics,
            clips,
        }
    }

    pub fn render(&self, format: OutputFormat) -> ClipScanResult<String> {
        match format {
            OutputFormat::Json => to_json(self),
            OutputFormat::Yaml => to_yaml(self),
            OutputFormat::Text => Ok(self.format_as_text()),
        }
    }

    fn format_as_text(&self) -> String {
        let mut output = String::new();

        output.push_str("Clip Candidates:\n");
        output.push_str(&format!("  Asset: {}\n", self.asset));
        output.push_str(&format!(
            "  Duration: {} ({:.2}s)\n",
            format_timestamp(self.asset_duration),
            self.asset_duration
        ));
        output.push_str(&format!(
            "  Windows: {} analyzed, {} degraded metrics\n",
            self.windows_analyzed, self.degraded_metrics
        ));
        output.push_str(&format!("  Generated: {}\n", self.generated_at));

        if self.clips.is_empty() {
            output.push_str("\nNo candidates found.\n");
            return output;
        }

        output.push_str(&format!("\nTop {} clips:\n", self.total_clips));
        for clip in &self.clips {
            let candidate = &clip.candidate;
            output.push_str(&format!(
                "  #{:<3} {} - {}  score {:.2} ({})  {}\n",
                clip.rank,
                format_timestamp(candidate.start),
                format_timestamp(candidate.end),
                candidate.score,
                candidate.score_label,
                candidate.id
            ));
            output.push_str(&format!(
                "        audio {:.2}  scenes {:.2}  motion {:.2}\n",
                candidate.metrics.audio_energy,
                candidate.metrics.scene_change_rate,
                candidate.metrics.motion_level
            ));
            output.push_str(&format!("        {}\n", candidate.reasons.join(", ")));
        }

        output
    }
}

/// One planned window in a `windows` listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedWindow {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

/// Planned windows of an asset, without metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowPlanReport {
    pub asset: String,
    pub asset_duration: f64,
    pub config: ReportConfig,
    pub windows: Vec<PlannedWindow>,
}

impl WindowPlanReport {
    pub fn new(
        asset: impl Into<String>,
        asset_duration: f64,
        config: &AnalysisConfig,
        windows: &[AnalysisWindow],
    ) -> Self {
        Self {
            asset: asset.into(),
            asset_duration,
            config: ReportConfig::from(config),
            windows: windows
                .iter()
                .enumerate()
                .map(|(index, window)| PlannedWindow {
                    index,
                    start: window.start,
                    end: window.end,
                    duration: window.duration(),
                })
                .collect(),
        }
    }

    pub fn render(&self, format: OutputFormat) -> ClipScanResult<String> {
        match format {
            OutputFormat::Json => to_json(self),
            OutputFormat::Yaml => to_yaml(self),
            OutputFormat::Text => Ok(self.format_as_text()),
        }
    }

    fn format_as_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} windows over {} ({:.2}s):\n",
            self.windows.len(),
            self.asset,
            self.asset_duration
        ));
        for window in &self.windows {
            output.push_str(&format!(
                "  {:>4}  {} - {}  ({:.2}s)\n",
                window.index,
                format_timestamp(window.start),
                format_timestamp(window.end),
                window.duration
            ));
        }
        output
    }
}

fn to_json<T: Serialize>(value: &T) -> ClipScanResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| ClipScanError::OutputError {
        message: format!("JSON serialization failed: {}", e),
    })
}

fn to_yaml<T: Serialize>(value: &T) -> ClipScanResult<String> {
    serde_yaml::to_string(value).map_err(|e| ClipScanError::OutputError {
        message: format!("YAML serialization failed: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::MetricSample;
    use crate::domain::rules::SegmentScorer;
    use chrono::TimeZone;

    fn outcome() -> AnalysisOutcome {
        let candidates = [(60.0, 0.9), (0.0, 0.5)]
            .iter()
            .map(|&(start, level)| {
                SegmentScorer::build_candidate(
                    &AnalysisWindow::new(start, start + 60.0),
                    &MetricSample::uniform(level),
                    120.0,
                    &Default::default(),
                )
            })
            .collect();
        AnalysisOutcome {
            asset_duration: 120.0,
            windows_analyzed: 4,
            degraded_metrics: 1,
            candidates,
        }
    }

    fn report() -> AnalysisReport {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        AnalysisReport::at("talk.mp4", &AnalysisConfig::default(), outcome(), at)
    }

    #[test]
    fn test_report_ranks_are_one_based() {
        let report = report();
        assert_eq!(report.total_clips, 2);
        let ranks: Vec<usize> = report.clips.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
        assert_eq!(report.generated_at, "2024-05-01T12:00:00Z");
    }

    #[test]
    fn test_json_flattens_candidates() {
        let json = report().render(OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totalClips"], 2);
        assert_eq!(value["clips"][0]["rank"], 1);
        assert_eq!(value["clips"][0]["id"], "clip_60_120");
        assert_eq!(value["clips"][0]["scoreLabel"], "Excellent");
        assert_eq!(value["config"]["clipDuration"], 60.0);
        assert_eq!(value["config"]["minClipLength"], 10.0);
        assert!(value["config"].get("clip_duration").is_none());
    }

    #[test]
    fn test_yaml_render() {
        let yaml = report().render(OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("asset: talk.mp4"));
        assert!(yaml.contains("degradedMetrics: 1"));
    }

    #[test]
    fn test_text_render() {
        let text = report().render(OutputFormat::Text).unwrap();
        assert!(text.contains("Top 2 clips:"));
        assert!(text.contains("01:00.000 - 02:00.000"));
        assert!(text.contains("(Excellent)"));
    }

    #[test]
    fn test_window_plan_text() {
        let windows = vec![AnalysisWindow::new(0.0, 60.0), AnalysisWindow::new(30.0, 90.0)];
        let plan = WindowPlanReport::new("talk.mp4", 90.0, &AnalysisConfig::default(), &windows);
        let text = plan.render(OutputFormat::Text).unwrap();
        assert!(text.starts_with("2 windows over talk.mp4"));
        assert!(text.contains("00:30.000 - 01:30.000"));
    }
}
