//! Window planning
//!
//! Partitions an asset into the ordered, possibly overlapping analysis windows
//! that the ranker scores one by one.

use tracing::debug;

use crate::domain::model::{AnalysisConfig, AnalysisWindow};

/// Most windows a single asset may be split into. A tiny step on a long
/// asset beyond this is treated as a configuration error.
pub const MAX_WINDOWS: u64 = 100_000;

/// Produces analysis windows for a given asset duration
pub struct WindowPlanner;

impl WindowPlanner {
    /// Number of window starts `plan` considers, computed without planning.
    ///
    /// Tail windows shorter than `min_clip_length` are counted, so this is an
    /// upper bound on `plan(..).len()`.
    pub fn window_starts(asset_duration: f64, config: &AnalysisConfig) -> u64 {
        let step = config.step();
        if !(asset_duration > 0.0) || !(step > 0.0) {
            return 0;
        }

        let stop_at = asset_duration - config.min_clip_length;
        // Saturates for absurd ratios
        (stop_at / step).ceil().max(1.0) as u64
    }

    /// Plan all windows for an asset of `asset_duration` seconds.
    ///
    /// Expects a validated config. The first window is always considered;
    /// planning stops once the next start reaches `asset_duration -
    /// min_clip_length`. Windows shorter than `min_clip_length` are dropped,
    /// so the result is empty only when the asset itself is too short.
    pub fn plan(asset_duration: f64, config: &AnalysisConfig) -> Vec<AnalysisWindow> {
        let step = config.step();
        let mut windows = Vec::new();

        if !(asset_duration > 0.0) || !(step > 0.0) {
            return windows;
        }

        let stop_at = asset_duration - config.min_clip_length;
        let mut index: u64 = 0;
        loop {
            // index * step rather than an accumulator keeps starts drift-free
            let start = index as f64 * step;
            let end = (start + config.clip_duration).min(asset_duration);

            if end - start >= config.min_clip_length {
                windows.push(AnalysisWindow::new(start, end));
            }

            index += 1;
            if index as f64 * step >= stop_at {
                break;
            }
        }

        debug!(
            asset_duration,
            step,
            windows = windows.len(),
            "Planned analysis windows"
        );
        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(clip_duration: f64, overlap: f64, min_clip_length: f64) -> AnalysisConfig {
        AnalysisConfig {
            clip_duration,
            overlap,
            min_clip_length,
            ..AnalysisConfig::default()
        }
    }

    fn bounds(windows: &[AnalysisWindow]) -> Vec<(f64, f64)> {
        windows.iter().map(|w| (w.start, w.end)).collect()
    }

    #[test]
    fn test_overlapping_windows_with_clamped_tail() {
        let windows = WindowPlanner::plan(120.0, &config(60.0, 30.0, 10.0));
        assert_eq!(
            bounds(&windows),
            vec![(0.0, 60.0), (30.0, 90.0), (60.0, 120.0), (90.0, 120.0)]
        );
    }

    #[test]
    fn test_short_asset_yields_single_clamped_window() {
        let windows = WindowPlanner::plan(45.0, &config(60.0, 30.0, 10.0));
        assert_eq!(bounds(&windows), vec![(0.0, 45.0)]);
    }

    #[test]
    fn test_asset_equal_to_min_clip_length_yields_one_window() {
        let windows = WindowPlanner::plan(10.0, &config(60.0, 30.0, 10.0));
        assert_eq!(bounds(&windows), vec![(0.0, 10.0)]);
    }

    #[test]
    fn test_asset_shorter_than_min_clip_length_yields_nothing() {
        assert!(WindowPlanner::plan(5.0, &config(60.0, 30.0, 10.0)).is_empty());
        assert!(WindowPlanner::plan(0.0, &config(60.0, 30.0, 10.0)).is_empty());
    }

    #[test]
    fn test_tail_shorter_than_min_clip_length_is_dropped() {
        // starts 0, 25, 50, 75; the 75s window is [75, 80] and too short
        let windows = WindowPlanner::plan(80.0, &config(30.0, 5.0, 8.0));
        assert_eq!(
            bounds(&windows),
            vec![(0.0, 30.0), (25.0, 55.0), (50.0, 80.0)]
        );
    }

    #[test]
    fn test_no_overlap_tiles_the_asset() {
        let windows = WindowPlanner::plan(90.0, &config(30.0, 0.0, 10.0));
        assert_eq!(
            bounds(&windows),
            vec![(0.0, 30.0), (30.0, 60.0), (60.0, 90.0)]
        );
    }

    #[test]
    fn test_fractional_step_has_no_drift() {
        let config = config(0.3, 0.2, 0.1);
        let windows = WindowPlanner::plan(3.0, &config);
        assert_eq!(windows.len(), 30);
        for (i, window) in windows.iter().enumerate() {
            assert_eq!(window.start, i as f64 * config.step());
        }
    }

    #[test]
    fn test_window_starts_counts_without_planning() {
        assert_eq!(WindowPlanner::window_starts(120.0, &config(60.0, 30.0, 10.0)), 4);
        assert_eq!(WindowPlanner::window_starts(10.0, &config(60.0, 30.0, 10.0)), 1);
        assert_eq!(WindowPlanner::window_starts(0.0, &config(60.0, 30.0, 10.0)), 0);
        // One-millisecond step over ten hours
        assert!(WindowPlanner::window_starts(36_000.0, &config(1.0, 0.999, 0.5)) > MAX_WINDOWS);
    }

    #[test]
    fn test_windows_respect_bounds_for_many_configs() {
        let durations = [10.0, 11.5, 59.9, 60.0, 61.0, 120.0, 333.3, 3600.0];
        let configs = [
            config(60.0, 30.0, 10.0),
            config(15.0, 0.0, 15.0),
            config(45.0, 44.0, 5.0),
            config(20.0, 7.5, 3.0),
            config(90.0, 10.0, 60.0),
        ];

        for duration in durations {
            for config in &configs {
                let windows = WindowPlanner::plan(duration, config);
                for window in &windows {
                    assert!(window.start >= 0.0);
                    assert!(window.start < window.end);
                    assert!(window.end <= duration);
                    assert!(window.duration() >= config.min_clip_length);
                }
                if duration >= config.min_clip_length {
                    assert!(!windows.is_empty(), "{} {:?}", duration, config);
                }
                assert!(windows.len() as u64 <= WindowPlanner::window_starts(duration, config));
                assert_eq!(windows, WindowPlanner::plan(duration, config));
            }
        }
    }
}
