//! Candidate ranking over a bounded worker pool

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::debug;

use crate::domain::errors::{AnalysisError, AnalysisResult};
use crate::domain::model::{AnalysisConfig, AnalysisWindow, ClipCandidate, ScoreWeights};
use crate::domain::rules::SegmentScorer;
use crate::engine::progress::ProgressTracker;
use crate::ports::MetricsProvider;

/// Outcome of one ranking pass
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidates {
    /// Best candidates, at most `max_clips`
    pub candidates: Vec<ClipCandidate>,
    pub windows_analyzed: usize,
    /// Metrics that fell back to the default across all windows
    pub degraded_metrics: usize,
}

type WindowOutcome = AnalysisResult<(ClipCandidate, usize)>;

/// Scores every window and keeps the best candidates
pub struct CandidateRanker {
    provider: Arc<dyn MetricsProvider>,
    workers: usize,
}

impl CandidateRanker {
    pub fn new(provider: Arc<dyn MetricsProvider>, workers: usize) -> Self {
        Self {
            provider,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Analyse all windows with at most `workers` in flight.
    ///
    /// The first fatal window error stops further launches and is returned;
    /// dropping the task set aborts whatever is still running. The result
    /// order depends only on score and start, never on completion order.
    pub async fn rank(
        &self,
        windows: &[AnalysisWindow],
        asset: &Path,
        asset_duration: f64,
        config: &AnalysisConfig,
        scratch: &Path,
        progress: &mut ProgressTracker,
    ) -> AnalysisResult<RankedCandidates> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let asset = Arc::new(asset.to_path_buf());
        let scratch = Arc::new(scratch.to_path_buf());
        let weights = config.weights;

        let mut tasks: JoinSet<WindowOutcome> = JoinSet::new();
        let mut candidates = Vec::with_capacity(windows.len());
        let mut degraded_metrics = 0;

        for window in windows.iter().copied() {
            // Wait for a free worker. Finished windows are drained first so a
            // failure is seen before anything else is launched.
            let permit = loop {
                tokio::select! {
                    biased;
                    Some(joined) = tasks.join_next() => {
                        let (candidate, degraded) = Self::absorb(joined)?;
                        degraded_metrics += degraded;
                        candidates.push(candidate);
                        progress.advance();
                    }
                    permit = Arc::clone(&semaphore).acquire_owned() => {
                        break permit.map_err(|_| AnalysisError::Internal {
                            reason: "worker pool closed".to_string(),
                        })?;
                    }
                }
            };

            let provider = Arc::clone(&self.provider);
            let asset = Arc::clone(&asset);
            let scratch = Arc::clone(&scratch);
            tasks.spawn(async move {
                let _permit = permit;
                analyze_window(provider, &asset, &scratch, window, asset_duration, weights).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (candidate, degraded) = Self::absorb(joined)?;
            degraded_metrics += degraded;
            candidates.push(candidate);
            progress.advance();
        }

        let windows_analyzed = candidates.len();
        sort_candidates(&mut candidates);
        candidates.truncate(config.max_clips);

        Ok(RankedCandidates {
            candidates,
            windows_analyzed,
            degraded_metrics,
        })
    }

    fn absorb(joined: Result<WindowOutcome, JoinError>) -> WindowOutcome {
        joined.map_err(|e| AnalysisError::Internal {
            reason: format!("window task failed: {}", e),
        })?
    }
}

async fn analyze_window(
    provider: Arc<dyn MetricsProvider>,
    asset: &Path,
    scratch: &Path,
    window: AnalysisWindow,
    asset_duration: f64,
    weights: ScoreWeights,
) -> WindowOutcome {
    let reading = provider.sample(asset, &window, scratch).await?;
    let candidate =
        SegmentScorer::build_candidate(&window, &reading.sample, asset_duration, &weights);
    debug!(
        id = %candidate.id,
        score = candidate.score,
        degraded = reading.degraded.len(),
        "Scored window"
    );
    Ok((candidate, reading.degraded.len()))
}

/// Score descending, then start ascending
pub fn sort_candidates(candidates: &mut [ClipCandidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.start.total_cmp(&b.start))
    });
}
