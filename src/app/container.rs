use std::sync::Arc;

use crate::adapters::{EngineSettings, FfmpegMetricsProvider};
use crate::app::analyze_interactor::AnalyzeInteractor;
use crate::domain::errors::AnalysisError;
use crate::ports::MetricsProvider;

pub trait AppContainer: Send + Sync {
    fn analyze_interactor(&self) -> Arc<AnalyzeInteractor>;
}

pub struct DefaultAppContainer {
    analyze_interactor: Arc<AnalyzeInteractor>,
}

impl DefaultAppContainer {
    /// Wire the ffmpeg-backed provider from engine settings
    pub fn from_settings(engine: &EngineSettings) -> Result<Self, AnalysisError> {
        engine.validate()?;

        let provider = FfmpegMetricsProvider::new()?
            .with_tools(&engine.ffmpeg_path, &engine.ffprobe_path)
            .with_fallback(engine.metric_fallback)
            .with_timeout(engine.extraction_timeout());

        Ok(Self::with_provider(Arc::new(provider), engine))
    }

    /// Wire an arbitrary provider, e.g. a scripted one in tests
    pub fn with_provider(provider: Arc<dyn MetricsProvider>, engine: &EngineSettings) -> Self {
        let analyze_interactor = Arc::new(AnalyzeInteractor::new(
            provider,
            engine.workers,
            engine.scratch_root(),
        ));

        Self { analyze_interactor }
    }
}

impl AppContainer for DefaultAppContainer {
    fn analyze_interactor(&self) -> Arc<AnalyzeInteractor> {
        Arc::clone(&self.analyze_interactor)
    }
}
