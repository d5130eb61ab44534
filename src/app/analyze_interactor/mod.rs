// Analyze interactor - Orchestrates the clip-candidate analysis use case

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{info, info_span, warn, Instrument};

use crate::domain::errors::{AnalysisError, AnalysisResult};
use crate::domain::model::{AnalysisConfig, AnalysisWindow, ClipCandidate};
use crate::engine::{CandidateRanker, ProgressTracker};
use crate::planner::{WindowPlanner, MAX_WINDOWS};
use crate::ports::{JobReporter, MetricsProvider};

/// Everything one analysis run produced
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub asset_duration: f64,
    pub windows_analyzed: usize,
    pub degraded_metrics: usize,
    pub candidates: Vec<ClipCandidate>,
}

/// Interactor for the analysis use case
///
/// Safe to share between concurrent runs: each run gets its own scratch
/// directory under `scratch_root`.
pub struct AnalyzeInteractor {
    provider: Arc<dyn MetricsProvider>,
    ranker: CandidateRanker,
    scratch_root: PathBuf,
}

impl AnalyzeInteractor {
    /// Create new analyze interactor with injected ports
    pub fn new(provider: Arc<dyn MetricsProvider>, workers: usize, scratch_root: PathBuf) -> Self {
        Self {
            ranker: CandidateRanker::new(Arc::clone(&provider), workers),
            provider,
            scratch_root,
        }
    }

    /// Ranked highlight candidates for an asset
    pub async fn analyze(
        &self,
        asset: &Path,
        config: &AnalysisConfig,
        reporter: Option<Arc<dyn JobReporter>>,
    ) -> AnalysisResult<Vec<ClipCandidate>> {
        Ok(self
            .analyze_detailed(asset, config, reporter)
            .await?
            .candidates)
    }

    /// Like `analyze`, also returning run statistics
    pub async fn analyze_detailed(
        &self,
        asset: &Path,
        config: &AnalysisConfig,
        reporter: Option<Arc<dyn JobReporter>>,
    ) -> AnalysisResult<AnalysisOutcome> {
        let span = info_span!("analyze", asset = %asset.display());
        async move {
            let mut progress = ProgressTracker::new(reporter);
            progress.start("Starting analysis");

            match self.run(asset, config, &mut progress).await {
                Ok(outcome) => {
                    info!(
                        duration = outcome.asset_duration,
                        windows = outcome.windows_analyzed,
                        degraded_metrics = outcome.degraded_metrics,
                        candidates = outcome.candidates.len(),
                        "Analysis complete"
                    );
                    progress.complete(&format!(
                        "Found {} clip candidates",
                        outcome.candidates.len()
                    ));
                    Ok(outcome)
                }
                Err(e) => {
                    warn!(error = %e, "Analysis failed");
                    progress.fail(&e.to_string());
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Probe the asset and plan its windows without extracting metrics
    pub async fn plan_windows(
        &self,
        asset: &Path,
        config: &AnalysisConfig,
    ) -> AnalysisResult<(f64, Vec<AnalysisWindow>)> {
        config.validate()?;
        let asset_duration = self.asset_duration(asset, config).await?;
        let windows = WindowPlanner::plan(asset_duration, config);
        Ok((asset_duration, windows))
    }

    async fn run(
        &self,
        asset: &Path,
        config: &AnalysisConfig,
        progress: &mut ProgressTracker,
    ) -> AnalysisResult<AnalysisOutcome> {
        config.validate()?;

        let asset_duration = self.asset_duration(asset, config).await?;
        let windows = WindowPlanner::plan(asset_duration, config);
        if windows.is_empty() {
            return Err(too_short(asset, asset_duration, config));
        }
        info!(
            duration = asset_duration,
            windows = windows.len(),
            workers = self.ranker.workers(),
            "Planned analysis windows"
        );
        progress.set_total(windows.len());

        // Removed on drop, so every early return below cleans up too
        let scratch = self.create_scratch()?;

        let ranked = self
            .ranker
            .rank(
                &windows,
                asset,
                asset_duration,
                config,
                scratch.path(),
                progress,
            )
            .await?;

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!(path = %scratch_path.display(), error = %e, "Failed to remove scratch directory");
        }

        Ok(AnalysisOutcome {
            asset_duration,
            windows_analyzed: ranked.windows_analyzed,
            degraded_metrics: ranked.degraded_metrics,
            candidates: ranked.candidates,
        })
    }

    async fn asset_duration(&self, asset: &Path, config: &AnalysisConfig) -> AnalysisResult<f64> {
        let duration = self.provider.duration(asset).await?;
        if !duration.is_finite() || duration < config.min_clip_length {
            return Err(too_short(asset, duration, config));
        }

        let starts = WindowPlanner::window_starts(duration, config);
        if starts > MAX_WINDOWS {
            return Err(AnalysisError::config(format!(
                "{} windows of {}s every {}s over {:.1}s exceeds the limit of {}",
                starts,
                config.clip_duration,
                config.step(),
                duration,
                MAX_WINDOWS
            )));
        }
        Ok(duration)
    }

    fn create_scratch(&self) -> AnalysisResult<TempDir> {
        tempfile::Builder::new()
            .prefix("clipscan-")
            .tempdir_in(&self.scratch_root)
            .map_err(|e| AnalysisError::Internal {
                reason: format!(
                    "Failed to create scratch directory in {}: {}",
                    self.scratch_root.display(),
                    e
                ),
            })
    }
}

fn too_short(asset: &Path, duration: f64, config: &AnalysisConfig) -> AnalysisError {
    AnalysisError::AssetTooShort {
        asset: asset.display().to_string(),
        duration,
        min_clip_length: config.min_clip_length,
    }
}
