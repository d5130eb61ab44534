//! Command implementations

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::{Settings, TomlConfigAdapter, TracingJobReporter};
use crate::app::{AppContainer, DefaultAppContainer};
use crate::cli::args::{AnalyzeArgs, WindowsArgs};
use crate::output::{AnalysisReport, ReportWriter, WindowPlanReport};
use crate::ports::JobReporter;

/// Settings from file and environment, before CLI flags
pub fn load_settings(config: Option<&Path>) -> Result<Settings> {
    TomlConfigAdapter::load(config).context("Failed to load configuration")
}

/// Execute the analyze command
pub async fn analyze(args: AnalyzeArgs, mut settings: Settings) -> Result<()> {
    args.apply(&mut settings.analysis);
    if let Some(workers) = args.workers {
        settings.engine.workers = workers;
    }
    // Reject bad settings before the asset is probed
    settings.analysis.validate()?;

    let asset = args.asset.display().to_string();
    info!(
        asset = %asset,
        clip_duration = settings.analysis.clip_duration,
        overlap = settings.analysis.overlap,
        max_clips = settings.analysis.max_clips,
        workers = settings.engine.workers,
        "Starting analyze command"
    );

    let container = DefaultAppContainer::from_settings(&settings.engine)?;
    let reporter: Arc<dyn JobReporter> = Arc::new(
        TracingJobReporter::new(job_id(&args.asset)).with_quiet_progress(args.quiet_progress),
    );

    let outcome = container
        .analyze_interactor()
        .analyze_detailed(&args.asset, &settings.analysis, Some(reporter))
        .await
        .with_context(|| format!("Analysis of {} failed", asset))?;

    let report = AnalysisReport::new(asset, &settings.analysis, outcome);
    let rendered = report.render(args.format)?;
    ReportWriter::from_option(args.output)
        .write(&rendered)
        .context("Failed to write report")?;
    Ok(())
}

/// Execute the windows command
pub async fn windows(args: WindowsArgs, mut settings: Settings) -> Result<()> {
    args.window.apply(&mut settings.analysis);
    settings.analysis.validate()?;

    let container = DefaultAppContainer::from_settings(&settings.engine)?;
    let (asset_duration, windows) = container
        .analyze_interactor()
        .plan_windows(&args.asset, &settings.analysis)
        .await
        .with_context(|| format!("Planning windows for {} failed", args.asset.display()))?;

    let report = WindowPlanReport::new(
        args.asset.display().to_string(),
        asset_duration,
        &settings.analysis,
        &windows,
    );
    ReportWriter::stdout().write(&report.render(args.format)?)?;
    Ok(())
}

/// Execute the config command
pub fn show_config(settings: &Settings) -> Result<()> {
    let rendered = TomlConfigAdapter::render(settings)?;
    ReportWriter::stdout().write(&rendered)?;
    Ok(())
}

/// Job identifier for log correlation
fn job_id(asset: &Path) -> String {
    let stem = asset
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string());
    format!("{}-{}", stem, chrono::Utc::now().format("%Y%m%dT%H%M%S"))
}
