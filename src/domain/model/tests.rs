// Unit tests for domain models

use super::*;

fn config(clip_duration: f64, overlap: f64, min_clip_length: f64) -> AnalysisConfig {
    AnalysisConfig {
        clip_duration,
        overlap,
        min_clip_length,
        ..AnalysisConfig::default()
    }
}

#[test]
fn test_default_config_is_valid() {
    let config = AnalysisConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.step(), 30.0);
    assert_eq!(config.weights, ScoreWeights::new(0.4, 0.3, 0.3));
}

#[test]
fn test_overlap_equal_to_clip_duration_is_rejected() {
    let err = config(60.0, 60.0, 10.0).validate().unwrap_err();
    assert!(err.is_config_error());
    assert!(err.to_string().contains("greater than overlap"));
}

#[test]
fn test_overlap_greater_than_clip_duration_is_rejected() {
    assert!(config(30.0, 45.0, 10.0).validate().is_err());
}

#[test]
fn test_negative_overlap_is_rejected() {
    assert!(config(30.0, -1.0, 10.0).validate().is_err());
}

#[test]
fn test_non_positive_min_clip_length_is_rejected() {
    assert!(config(60.0, 30.0, 0.0).validate().is_err());
    assert!(config(60.0, 30.0, -5.0).validate().is_err());
}

#[test]
fn test_zero_max_clips_is_rejected() {
    let config = AnalysisConfig {
        max_clips: 0,
        ..AnalysisConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(AnalysisError::ConfigInvalid { .. })
    ));
}

#[test]
fn test_weights_must_be_non_negative_and_finite() {
    let mut config = AnalysisConfig::default();
    config.weights.visual = -0.1;
    assert!(config.validate().is_err());

    config.weights.visual = f64::NAN;
    assert!(config.validate().is_err());

    // Zero and oversized weights are allowed
    config.weights = ScoreWeights::new(0.0, 0.0, 0.0);
    assert!(config.validate().is_ok());
    config.weights = ScoreWeights::new(2.0, 1.0, 1.0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_infinite_clip_duration_is_rejected() {
    assert!(config(f64::INFINITY, 30.0, 10.0).validate().is_err());
}

#[test]
fn test_candidate_id_uses_rounded_bounds() {
    let window = AnalysisWindow::new(29.6, 90.4);
    assert_eq!(ClipCandidate::id_for(&window), "clip_30_90");
    assert_eq!(
        ClipCandidate::id_for(&AnalysisWindow::new(0.0, 60.0)),
        "clip_0_60"
    );
}

#[test]
fn test_sample_rounding_to_two_decimals() {
    let sample = MetricSample::new(0.756, 0.1234, 0.999);
    let rounded = sample.rounded();
    assert_eq!(rounded.audio_energy, 0.76);
    assert_eq!(rounded.scene_change_rate, 0.12);
    assert_eq!(rounded.motion_level, 1.0);
}

#[test]
fn test_reading_substitutes_fallback_for_failed_metric() {
    let window = AnalysisWindow::new(0.0, 60.0);
    let reading = MetricReading::assemble(
        "clip.mp4",
        &window,
        Ok(0.8),
        Err("no showinfo output".to_string()),
        Ok(0.5),
        DEFAULT_METRIC_FALLBACK,
    );

    assert_eq!(reading.sample, MetricSample::new(0.8, 0.3, 0.5));
    assert_eq!(reading.degraded, vec![MetricKind::SceneChangeRate]);
    assert!(reading.is_degraded());
}

#[test]
fn test_reading_clamps_and_rejects_non_finite_values() {
    let window = AnalysisWindow::new(0.0, 60.0);
    let reading = MetricReading::assemble(
        "clip.mp4",
        &window,
        Ok(1.7),
        Ok(-0.2),
        Ok(f64::NAN),
        0.25,
    );

    assert_eq!(reading.sample, MetricSample::new(1.0, 0.0, 0.25));
    assert_eq!(reading.degraded, vec![MetricKind::MotionLevel]);
}

#[test]
fn test_candidate_serializes_with_camel_case_fields() {
    let candidate = ClipCandidate {
        id: "clip_0_60".to_string(),
        start: 0.0,
        end: 60.0,
        duration: 60.0,
        score: 0.5,
        score_label: ScoreLabel::Fair,
        metrics: MetricSample::new(0.5, 0.5, 0.5),
        reasons: vec!["Moderate audio".to_string()],
    };

    let json = serde_json::to_value(&candidate).unwrap();
    assert_eq!(json["scoreLabel"], "Fair");
    assert_eq!(json["metrics"]["sceneChangeRate"], 0.5);
}
