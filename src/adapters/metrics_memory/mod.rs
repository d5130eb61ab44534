//! In-memory metrics adapter
//!
//! Deterministic stand-in for the ffmpeg adapter: scripted per-window
//! samples, scripted metric failures, scripted unreadable windows and
//! artificial per-window delays for exercising the worker pool.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::AnalysisError;
use crate::domain::model::{
    AnalysisWindow, MetricKind, MetricReading, MetricSample, DEFAULT_METRIC_FALLBACK,
};
use crate::ports::MetricsProvider;

/// Window starts are keyed in milliseconds
fn key(start: f64) -> u64 {
    (start * 1000.0).round() as u64
}

/// Scripted metrics provider
pub struct InMemoryMetricsProvider {
    duration: Option<f64>,
    default_sample: MetricSample,
    samples: HashMap<u64, MetricSample>,
    failed_metrics: HashMap<u64, Vec<MetricKind>>,
    delays: HashMap<u64, Duration>,
    unreadable_from: Option<f64>,
    fallback: f64,
    duration_calls: AtomicUsize,
    sample_calls: AtomicUsize,
    scratch_dirs: Mutex<Vec<std::path::PathBuf>>,
}

impl InMemoryMetricsProvider {
    /// Provider for an asset of the given duration
    pub fn new(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            default_sample: MetricSample::uniform(0.5),
            samples: HashMap::new(),
            failed_metrics: HashMap::new(),
            delays: HashMap::new(),
            unreadable_from: None,
            fallback: DEFAULT_METRIC_FALLBACK,
            duration_calls: AtomicUsize::new(0),
            sample_calls: AtomicUsize::new(0),
            scratch_dirs: Mutex::new(Vec::new()),
        }
    }

    /// Provider whose asset cannot be opened at all
    pub fn unreadable() -> Self {
        let mut provider = Self::new(0.0);
        provider.duration = None;
        provider
    }

    pub fn with_default_sample(mut self, sample: MetricSample) -> Self {
        self.default_sample = sample;
        self
    }

    /// Sample returned for the window starting at `start`
    pub fn with_sample(mut self, start: f64, sample: MetricSample) -> Self {
        self.samples.insert(key(start), sample);
        self
    }

    /// Make one metric of the window starting at `start` fail extraction
    pub fn with_failed_metric(mut self, start: f64, kind: MetricKind) -> Self {
        self.failed_metrics.entry(key(start)).or_default().push(kind);
        self
    }

    /// Delay the sample of the window starting at `start`
    pub fn with_delay(mut self, start: f64, delay: Duration) -> Self {
        self.delays.insert(key(start), delay);
        self
    }

    /// Every window starting at or after `start` is unreadable
    pub fn with_unreadable_from(mut self, start: f64) -> Self {
        self.unreadable_from = Some(start);
        self
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// Number of `duration` calls made so far
    pub fn duration_calls(&self) -> usize {
        self.duration_calls.load(Ordering::SeqCst)
    }

    /// Number of `sample` calls made so far
    pub fn sample_calls(&self) -> usize {
        self.sample_calls.load(Ordering::SeqCst)
    }

    /// Scratch directories handed to `sample`, deduplicated
    pub fn scratch_dirs(&self) -> Vec<std::path::PathBuf> {
        match self.scratch_dirs.lock() {
            Ok(dirs) => dirs.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record_scratch(&self, scratch: &Path) {
        let mut dirs = match self.scratch_dirs.lock() {
            Ok(dirs) => dirs,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !dirs.iter().any(|d| d == scratch) {
            dirs.push(scratch.to_path_buf());
        }
    }
}

#[async_trait]
impl MetricsProvider for InMemoryMetricsProvider {
    async fn duration(&self, asset: &Path) -> Result<f64, AnalysisError> {
        self.duration_calls.fetch_add(1, Ordering::SeqCst);
        self.duration.ok_or_else(|| {
            AnalysisError::unreadable(asset.display().to_string(), None, "unreadable test asset")
        })
    }

    async fn sample(
        &self,
        asset: &Path,
        window: &AnalysisWindow,
        scratch: &Path,
    ) -> Result<MetricReading, AnalysisError> {
        self.sample_calls.fetch_add(1, Ordering::SeqCst);
        self.record_scratch(scratch);

        let window_key = key(window.start);
        if let Some(delay) = self.delays.get(&window_key) {
            tokio::time::sleep(*delay).await;
        }

        if self.duration.is_none() || self.unreadable_from.is_some_and(|from| window.start >= from) {
            return Err(AnalysisError::unreadable(
                asset.display().to_string(),
                Some(*window),
                "unreadable test asset",
            ));
        }

        let sample = self
            .samples
            .get(&window_key)
            .copied()
            .unwrap_or(self.default_sample);
        let failed = self
            .failed_metrics
            .get(&window_key)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let outcome = |kind: MetricKind| {
            if failed.contains(&kind) {
                Err(format!("scripted {} failure", kind))
            } else {
                Ok(sample.get(kind))
            }
        };

        Ok(MetricReading::assemble(
            &asset.display().to_string(),
            window,
            outcome(MetricKind::AudioEnergy),
            outcome(MetricKind::SceneChangeRate),
            outcome(MetricKind::MotionLevel),
            self.fallback,
        ))
    }
}
