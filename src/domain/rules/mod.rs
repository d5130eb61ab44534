// Domain rules - Segment scoring and reason generation

use crate::domain::model::*;

/// Upper bound on reasons attached to one candidate
pub const MAX_REASONS: usize = 4;

/// Reason emitted when no other rule matches
pub const FALLBACK_REASON: &str = "Moderate activity";

/// Where a window sits inside the asset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPosition {
    pub start: f64,
    pub asset_duration: f64,
}

impl SegmentPosition {
    pub fn new(start: f64, asset_duration: f64) -> Self {
        Self {
            start,
            asset_duration,
        }
    }

    /// Relative position of the window start, in [0, 1)
    pub fn ratio(&self) -> f64 {
        if self.asset_duration > 0.0 {
            self.start / self.asset_duration
        } else {
            0.0
        }
    }
}

impl ScoreLabel {
    /// Bucket a clamped score; lower bounds are inclusive
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ScoreLabel::Excellent
        } else if score >= 0.6 {
            ScoreLabel::Good
        } else if score >= 0.4 {
            ScoreLabel::Fair
        } else {
            ScoreLabel::Poor
        }
    }
}

/// Business rules turning raw window metrics into an explained score
pub struct SegmentScorer;

impl SegmentScorer {
    /// Weighted linear combination, clamped into [0, 1]
    pub fn composite_score(sample: &MetricSample, weights: &ScoreWeights) -> f64 {
        let raw = sample.audio_energy * weights.audio
            + sample.scene_change_rate * weights.visual
            + sample.motion_level * weights.motion;
        if raw.is_nan() {
            return 0.0;
        }
        raw.clamp(0.0, 1.0)
    }

    /// Human-readable justification, evaluated in fixed rule order
    pub fn reasons(sample: &MetricSample, position: &SegmentPosition) -> Vec<String> {
        let mut reasons: Vec<&'static str> = Vec::new();

        let audio = sample.audio_energy;
        if audio > 0.7 {
            reasons.push("High audio energy");
        } else if audio > 0.5 {
            reasons.push("Good audio activity");
        } else if audio > 0.3 {
            reasons.push("Moderate audio");
        }

        let scene = sample.scene_change_rate;
        if scene > 0.6 {
            reasons.push("Dynamic scene changes");
        } else if scene > 0.4 {
            reasons.push("Visual variety");
        }

        let motion = sample.motion_level;
        if motion > 0.6 {
            reasons.push("High motion content");
        } else if motion > 0.4 {
            reasons.push("Active content");
        }

        let ratio = position.ratio();
        if ratio < 0.15 {
            reasons.push("Strong opening segment");
        } else if ratio > 0.8 {
            reasons.push("Compelling ending");
        } else if (0.4..=0.6).contains(&ratio) {
            reasons.push("Peak content area");
        }

        if audio > 0.6 && motion > 0.5 {
            reasons.push("Engaging audio-visual content");
        }

        if reasons.is_empty() {
            reasons.push(FALLBACK_REASON);
        }

        reasons
            .into_iter()
            .take(MAX_REASONS)
            .map(str::to_string)
            .collect()
    }

    /// Score and explain one window
    pub fn score(
        sample: &MetricSample,
        position: &SegmentPosition,
        weights: &ScoreWeights,
    ) -> (f64, Vec<String>) {
        (
            Self::composite_score(sample, weights),
            Self::reasons(sample, position),
        )
    }

    /// Build the immutable candidate for a window
    pub fn build_candidate(
        window: &AnalysisWindow,
        sample: &MetricSample,
        asset_duration: f64,
        weights: &ScoreWeights,
    ) -> ClipCandidate {
        let position = SegmentPosition::new(window.start, asset_duration);
        let (score, reasons) = Self::score(sample, &position, weights);

        ClipCandidate {
            id: ClipCandidate::id_for(window),
            start: window.start,
            end: window.end,
            duration: window.duration(),
            score,
            score_label: ScoreLabel::from_score(score),
            metrics: sample.rounded(),
            reasons,
        }
    }
}
