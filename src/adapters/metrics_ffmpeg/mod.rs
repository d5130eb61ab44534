//! FFmpeg metrics adapter
//!
//! Measures duration with ffprobe and the three window signals with ffmpeg
//! filter runs over the time-limited range:
//!
//! - audio energy: `astats` RMS level, mapped from [-60 dB, 0 dB] to [0, 1]
//! - scene change rate: frames passing `select=gt(scene,0.3)`, per minute, /10
//! - motion level: mean `lavfi.scene_score` above 0.1, doubled
//!
//! Every child process is spawned with `kill_on_drop`, so a timed-out or
//! aborted extraction never leaves an ffmpeg behind.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::domain::errors::AnalysisError;
use crate::domain::model::{AnalysisWindow, MetricReading, DEFAULT_METRIC_FALLBACK};
use crate::ports::MetricsProvider;

/// Scene score threshold counted as a cut
const SCENE_CUT_THRESHOLD: &str = "0.3";
/// Scene score threshold sampled for motion
const MOTION_THRESHOLD: &str = "0.1";
/// Cuts per minute that saturate the scene change rate
const SCENE_CUTS_PER_MINUTE_CEILING: f64 = 10.0;
/// Default per-extraction timeout
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(120);

/// ffmpeg stderr fragments meaning a named file could not be opened; they
/// only count on a line that names the input
const INPUT_FAILURE_MARKERS: &[&str] = &[
    "No such file or directory",
    "Invalid data found when processing input",
    "Permission denied",
];

/// Demuxer errors that always concern the input
const CONTAINER_FAILURE_MARKERS: &[&str] = &["moov atom not found"];

/// Parsers for ffmpeg diagnostic output
pub struct OutputParsers {
    rms_level: Regex,
    pts_time: Regex,
    scene_score: Regex,
}

impl OutputParsers {
    pub fn new() -> Result<Self, AnalysisError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| AnalysisError::Internal {
                reason: format!("Invalid output pattern {}: {}", pattern, e),
            })
        };

        Ok(Self {
            rms_level: compile(r"RMS level dB: (-?\d+(?:\.\d+)?)")?,
            pts_time: compile(r"pts_time:\d+(?:\.\d+)?")?,
            scene_score: compile(r"lavfi\.scene_score=(\d+(?:\.\d+)?)")?,
        })
    }

    /// Mean RMS level over every `astats` report, normalised to [0, 1]
    pub fn audio_energy(&self, stderr: &str) -> Result<f64, String> {
        let levels: Vec<f64> = self
            .rms_level
            .captures_iter(stderr)
            .filter_map(|caps| caps[1].parse::<f64>().ok())
            .map(|db| ((db + 60.0) / 60.0).clamp(0.0, 1.0))
            .collect();

        if levels.is_empty() {
            return Err("no RMS level in astats output".to_string());
        }
        let mean = levels.iter().sum::<f64>() / levels.len() as f64;
        Ok(mean.clamp(0.0, 1.0))
    }

    /// Scene cuts per minute, saturating at the ceiling
    pub fn scene_change_rate(&self, stderr: &str, window_seconds: f64) -> Result<f64, String> {
        if window_seconds <= 0.0 {
            return Err(format!("empty window ({}s)", window_seconds));
        }
        let cuts = self.pts_time.find_iter(stderr).count();
        let per_minute = cuts as f64 / window_seconds * 60.0;
        Ok((per_minute / SCENE_CUTS_PER_MINUTE_CEILING).min(1.0))
    }

    /// Mean scene score of sampled frames, doubled and capped at 1
    pub fn motion_level(&self, metadata_log: &str) -> Result<f64, String> {
        let scores: Vec<f64> = self
            .scene_score
            .captures_iter(metadata_log)
            .filter_map(|caps| caps[1].parse::<f64>().ok())
            .collect();

        if scores.is_empty() {
            return Err("no scene scores in metadata log".to_string());
        }
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        Ok((mean * 2.0).min(1.0))
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Outcome of one child process run that did not fail fatally
enum ToolRun {
    Finished(Output),
    TimedOut,
}

/// FFmpeg-based metrics provider
pub struct FfmpegMetricsProvider {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    fallback: f64,
    extraction_timeout: Duration,
    parsers: OutputParsers,
}

impl FfmpegMetricsProvider {
    /// Create a provider using `ffmpeg` and `ffprobe` from `PATH`
    pub fn new() -> Result<Self, AnalysisError> {
        Ok(Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            fallback: DEFAULT_METRIC_FALLBACK,
            extraction_timeout: DEFAULT_EXTRACTION_TIMEOUT,
            parsers: OutputParsers::new()?,
        })
    }

    pub fn with_tools(mut self, ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = ffmpeg.into();
        self.ffprobe_path = ffprobe.into();
        self
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    /// Run a tool to completion or until the extraction timeout elapses
    async fn run_tool(
        &self,
        tool: &Path,
        args: Vec<OsString>,
        working_dir: &Path,
    ) -> Result<ToolRun, AnalysisError> {
        trace!(tool = %tool.display(), ?args, "Spawning media tool");

        let child = Command::new(tool)
            .args(&args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| tool_unavailable(tool, &e))?;

        match tokio::time::timeout(self.extraction_timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ToolRun::Finished(output)),
            Ok(Err(e)) => Err(AnalysisError::Internal {
                reason: format!("Failed to collect {} output: {}", tool.display(), e),
            }),
            // Dropping the wait future drops the child, which kills it
            Err(_) => Ok(ToolRun::TimedOut),
        }
    }

    /// Arguments shared by every ffmpeg window extraction
    fn window_args(asset: &Path, window: &AnalysisWindow) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-nostats", "-nostdin", "-ss"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(format!("{:.3}", window.start).into());
        args.push("-t".into());
        args.push(format!("{:.3}", window.duration()).into());
        args.push("-i".into());
        args.push(asset.as_os_str().to_owned());
        args
    }

    /// Run one filter extraction, returning its stderr or a degradation reason
    async fn run_filter(
        &self,
        asset: &Path,
        window: &AnalysisWindow,
        filter_args: &[&str],
        scratch: &Path,
    ) -> Result<Result<String, String>, AnalysisError> {
        let mut args = Self::window_args(asset, window);
        args.extend(filter_args.iter().map(OsString::from));
        args.extend(["-f", "null", "-"].iter().map(OsString::from));

        let output = match self.run_tool(&self.ffmpeg_path, args, scratch).await? {
            ToolRun::Finished(output) => output,
            ToolRun::TimedOut => {
                return Ok(Err(format!(
                    "ffmpeg timed out after {}s",
                    self.extraction_timeout.as_secs()
                )))
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if output.status.success() {
            return Ok(Ok(stderr));
        }

        if let Some(marker) = input_failure(&stderr, asset) {
            return Err(AnalysisError::unreadable(
                asset.display().to_string(),
                Some(*window),
                format!("ffmpeg could not open input: {}", marker),
            ));
        }

        Ok(Err(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            last_line(&stderr)
        )))
    }

    async fn extract_audio_energy(
        &self,
        asset: &Path,
        window: &AnalysisWindow,
        scratch: &Path,
    ) -> Result<Result<f64, String>, AnalysisError> {
        let stderr = self
            .run_filter(asset, window, &["-vn", "-af", "astats=metadata=1:reset=1"], scratch)
            .await?;
        Ok(stderr.and_then(|s| self.parsers.audio_energy(&s)))
    }

    async fn extract_scene_change_rate(
        &self,
        asset: &Path,
        window: &AnalysisWindow,
        scratch: &Path,
    ) -> Result<Result<f64, String>, AnalysisError> {
        let filter = format!("select=gt(scene\\,{}),showinfo", SCENE_CUT_THRESHOLD);
        let stderr = self
            .run_filter(asset, window, &["-an", "-vf", filter.as_str()], scratch)
            .await?;
        Ok(stderr.and_then(|s| self.parsers.scene_change_rate(&s, window.duration())))
    }

    async fn extract_motion_level(
        &self,
        asset: &Path,
        window: &AnalysisWindow,
        scratch: &Path,
    ) -> Result<Result<f64, String>, AnalysisError> {
        // Relative to the child's working directory, which is the scratch
        // directory, so the filter argument needs no path escaping
        let log_name = format!(
            "motion_{}_{}.log",
            (window.start * 1000.0).round() as u64,
            (window.end * 1000.0).round() as u64
        );
        let filter = format!(
            "select=gt(scene\\,{}),metadata=print:key=lavfi.scene_score:file={}",
            MOTION_THRESHOLD, log_name
        );

        if let Err(reason) = self
            .run_filter(asset, window, &["-an", "-vf", filter.as_str()], scratch)
            .await?
        {
            return Ok(Err(reason));
        }

        let log_path = scratch.join(&log_name);
        let log = match tokio::fs::read_to_string(&log_path).await {
            Ok(log) => log,
            Err(e) => return Ok(Err(format!("motion log unavailable: {}", e))),
        };
        if let Err(e) = tokio::fs::remove_file(&log_path).await {
            debug!(path = %log_path.display(), error = %e, "Could not remove motion log");
        }

        Ok(self.parsers.motion_level(&log))
    }
}

#[async_trait]
impl MetricsProvider for FfmpegMetricsProvider {
    async fn duration(&self, asset: &Path) -> Result<f64, AnalysisError> {
        let asset_name = asset.display().to_string();
        let asset = readable_asset(asset, None).await?;
        let working_dir = asset
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);

        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-print_format".into(),
            "json".into(),
            "-show_format".into(),
            asset.as_os_str().to_owned(),
        ];

        let output = match self.run_tool(&self.ffprobe_path, args, &working_dir).await? {
            ToolRun::Finished(output) => output,
            ToolRun::TimedOut => {
                return Err(AnalysisError::unreadable(
                    asset_name,
                    None,
                    "ffprobe timed out",
                ))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnalysisError::unreadable(
                asset_name,
                None,
                format!("ffprobe exited with {}: {}", output.status, last_line(&stderr)),
            ));
        }

        let probe: ProbeOutput = serde_json::from_slice(&output.stdout).map_err(|e| {
            AnalysisError::unreadable(
                asset_name.clone(),
                None,
                format!("Failed to parse ffprobe output: {}", e),
            )
        })?;

        let duration = probe
            .format
            .duration
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| {
                AnalysisError::unreadable(asset_name.clone(), None, "container reports no duration")
            })?;

        debug!(asset = %asset_name, duration, "Probed asset duration");
        Ok(duration)
    }

    async fn sample(
        &self,
        asset: &Path,
        window: &AnalysisWindow,
        scratch: &Path,
    ) -> Result<MetricReading, AnalysisError> {
        let asset_name = asset.display().to_string();
        let asset = readable_asset(asset, Some(*window)).await?;

        let audio = self.extract_audio_energy(&asset, window, scratch).await?;
        let scene = self.extract_scene_change_rate(&asset, window, scratch).await?;
        let motion = self.extract_motion_level(&asset, window, scratch).await?;

        Ok(MetricReading::assemble(
            &asset_name,
            window,
            audio,
            scene,
            motion,
            self.fallback,
        ))
    }
}

/// Canonical path of a readable regular file, or `AssetUnreadable`
async fn readable_asset(
    asset: &Path,
    window: Option<AnalysisWindow>,
) -> Result<PathBuf, AnalysisError> {
    let unreadable =
        |reason: String| AnalysisError::unreadable(asset.display().to_string(), window, reason);

    let metadata = tokio::fs::metadata(asset)
        .await
        .map_err(|e| unreadable(e.to_string()))?;
    if !metadata.is_file() {
        return Err(unreadable("not a regular file".to_string()));
    }

    tokio::fs::canonicalize(asset)
        .await
        .map_err(|e| unreadable(e.to_string()))
}

/// Marker of an ffmpeg failure to open the input itself
///
/// Failures on other files, such as the motion log in scratch, are not
/// matched and stay degradable.
fn input_failure(stderr: &str, asset: &Path) -> Option<&'static str> {
    let input = asset.to_string_lossy();
    stderr.lines().find_map(|line| {
        INPUT_FAILURE_MARKERS
            .iter()
            .find(|marker| line.contains(*marker) && line.contains(input.as_ref()))
            .or_else(|| {
                CONTAINER_FAILURE_MARKERS
                    .iter()
                    .find(|marker| line.contains(*marker))
            })
            .copied()
    })
}

fn tool_unavailable(tool: &Path, error: &io::Error) -> AnalysisError {
    AnalysisError::ToolUnavailable {
        tool: tool.display().to_string(),
        reason: error.to_string(),
    }
}

fn last_line(text: &str) -> &str {
    text.lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{MetricKind, MetricSample};

    const ASTATS_STDERR: &str = "\
[Parsed_astats_0 @ 0x600000c80000] Channel: 1
[Parsed_astats_0 @ 0x600000c80000] DC offset: -0.000012
[Parsed_astats_0 @ 0x600000c80000] RMS level dB: -18.000000
[Parsed_astats_0 @ 0x600000c80000] RMS peak dB: -6.2
[Parsed_astats_0 @ 0x600000c80000] Channel: 2
[Parsed_astats_0 @ 0x600000c80000] RMS level dB: -30.000000
[Parsed_astats_0 @ 0x600000c80000] Overall
[Parsed_astats_0 @ 0x600000c80000] RMS level dB: -24.000000
";

    const SHOWINFO_STDERR: &str = "\
[Parsed_showinfo_1 @ 0x7f8] n:   0 pts:  12800 pts_time:1       duration:512 fmt:yuv420p
[Parsed_showinfo_1 @ 0x7f8] n:   1 pts: 192000 pts_time:15      duration:512 fmt:yuv420p
[Parsed_showinfo_1 @ 0x7f8] n:   2 pts: 396800 pts_time:31.0000 duration:512 fmt:yuv420p
";

    const METADATA_LOG: &str = "\
frame:0    pts:12800   pts_time:1
lavfi.scene_score=0.150000
frame:1    pts:25600   pts_time:2
lavfi.scene_score=0.250000
";

    fn parsers() -> OutputParsers {
        OutputParsers::new().unwrap()
    }

    #[test]
    fn test_audio_energy_averages_normalised_rms_levels() {
        // (-18 + 60) / 60 = 0.7, (-30 + 60) / 60 = 0.5, (-24 + 60) / 60 = 0.6
        let energy = parsers().audio_energy(ASTATS_STDERR).unwrap();
        assert!((energy - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_audio_energy_clamps_very_quiet_and_loud_levels() {
        let stderr = "RMS level dB: -90.0\nRMS level dB: 3.0\n";
        let energy = parsers().audio_energy(stderr).unwrap();
        assert!((energy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_audio_energy_without_levels_is_degraded() {
        assert!(parsers().audio_energy("RMS level dB: -inf\n").is_err());
        assert!(parsers().audio_energy("").is_err());
    }

    #[test]
    fn test_scene_change_rate_counts_cuts_per_minute() {
        // 3 cuts in 60s = 3/min -> 0.3
        let rate = parsers().scene_change_rate(SHOWINFO_STDERR, 60.0).unwrap();
        assert!((rate - 0.3).abs() < 1e-9);

        // 3 cuts in 10s = 18/min -> saturates
        assert_eq!(parsers().scene_change_rate(SHOWINFO_STDERR, 10.0).unwrap(), 1.0);
    }

    #[test]
    fn test_scene_change_rate_without_cuts_is_zero() {
        assert_eq!(parsers().scene_change_rate("", 30.0).unwrap(), 0.0);
    }

    #[test]
    fn test_motion_level_doubles_mean_scene_score() {
        let motion = parsers().motion_level(METADATA_LOG).unwrap();
        assert!((motion - 0.4).abs() < 1e-9);
        assert_eq!(
            parsers().motion_level("lavfi.scene_score=0.9\n").unwrap(),
            1.0
        );
    }

    #[test]
    fn test_motion_level_without_scores_is_degraded() {
        assert!(parsers().motion_level("frame:0 pts:0 pts_time:0\n").is_err());
    }

    #[test]
    fn test_window_args_seek_before_input() {
        let args = FfmpegMetricsProvider::window_args(
            Path::new("/media/talk.mp4"),
            &AnalysisWindow::new(30.0, 90.5),
        );
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-nostats",
                "-nostdin",
                "-ss",
                "30.000",
                "-t",
                "60.500",
                "-i",
                "/media/talk.mp4"
            ]
        );
    }

    #[test]
    fn test_input_failure_requires_the_input_path() {
        let asset = Path::new("/media/talk.mp4");
        assert_eq!(
            input_failure(
                "/media/talk.mp4: Invalid data found when processing input\n",
                asset
            ),
            Some("Invalid data found when processing input")
        );
        assert_eq!(
            input_failure("[mov,mp4 @ 0x1] moov atom not found\n", asset),
            Some("moov atom not found")
        );
        assert_eq!(
            input_failure("motion_0_10000.log: Permission denied\n", asset),
            None
        );
        assert_eq!(input_failure("Conversion failed!\n", asset), None);
    }

    #[test]
    fn test_last_line_skips_trailing_blank_lines() {
        assert_eq!(last_line("first\nConversion failed!\n\n"), "Conversion failed!");
        assert_eq!(last_line(""), "");
    }

    #[tokio::test]
    async fn test_missing_asset_is_unreadable() {
        let provider = FfmpegMetricsProvider::new().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let window = AnalysisWindow::new(0.0, 10.0);

        let err = provider
            .sample(Path::new("/definitely/not/here.mp4"), &window, scratch.path())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::AssetUnreadable { window: Some(_), .. }
        ));

        let err = provider
            .duration(Path::new("/definitely/not/here.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::AssetUnreadable { window: None, .. }));
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let scratch = tempfile::tempdir().unwrap();
        let asset = scratch.path().join("input.mp4");
        std::fs::write(&asset, b"not really a video").unwrap();

        let provider = FfmpegMetricsProvider::new()
            .unwrap()
            .with_tools("/nonexistent/ffmpeg", "/nonexistent/ffprobe");

        let err = provider.duration(&asset).await.unwrap_err();
        assert!(matches!(err, AnalysisError::ToolUnavailable { .. }));
    }

    /// Executable shell script standing in for ffmpeg
    #[cfg(unix)]
    fn stub_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    fn stub_fixture(body: &str) -> (tempfile::TempDir, PathBuf, FfmpegMetricsProvider) {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("input.mp4");
        std::fs::write(&asset, b"not really a video").unwrap();
        let ffmpeg = stub_tool(dir.path(), "ffmpeg", body);
        let provider = FfmpegMetricsProvider::new()
            .unwrap()
            .with_tools(ffmpeg, "/nonexistent/ffprobe");
        (dir, asset, provider)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unopenable_input_is_fatal_for_the_window() {
        let (dir, asset, provider) = stub_fixture(
            r#"while [ $# -gt 0 ]; do
  if [ "$1" = "-i" ]; then input="$2"; fi
  shift
done
echo "$input: Invalid data found when processing input" >&2
exit 1"#,
        );
        let scratch = tempfile::tempdir_in(dir.path()).unwrap();
        let window = AnalysisWindow::new(0.0, 10.0);

        let err = provider
            .sample(&asset, &window, scratch.path())
            .await
            .unwrap_err();

        match err {
            AnalysisError::AssetUnreadable { window: failed, reason, .. } => {
                assert_eq!(failed, Some(window));
                assert!(reason.contains("Invalid data found when processing input"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unwritable_motion_log_only_degrades() {
        let (dir, asset, provider) =
            stub_fixture("echo \"motion_0_10000.log: Permission denied\" >&2\nexit 1");
        let scratch = tempfile::tempdir_in(dir.path()).unwrap();

        let reading = provider
            .sample(&asset, &AnalysisWindow::new(0.0, 10.0), scratch.path())
            .await
            .unwrap();

        assert_eq!(reading.sample, MetricSample::uniform(DEFAULT_METRIC_FALLBACK));
        assert_eq!(reading.degraded.len(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timed_out_extractions_fall_back() {
        let (dir, asset, provider) = stub_fixture("exec sleep 30");
        let provider = provider.with_timeout(Duration::from_secs(1));
        let scratch = tempfile::tempdir_in(dir.path()).unwrap();
        let started = std::time::Instant::now();

        let reading = provider
            .sample(&asset, &AnalysisWindow::new(0.0, 10.0), scratch.path())
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(15));
        assert_eq!(
            reading.degraded,
            vec![
                MetricKind::AudioEnergy,
                MetricKind::SceneChangeRate,
                MetricKind::MotionLevel
            ]
        );
        assert_eq!(reading.sample, MetricSample::uniform(DEFAULT_METRIC_FALLBACK));
    }
}
