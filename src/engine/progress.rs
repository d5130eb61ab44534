//! Progress tracking for analysis runs
//!
//! Translates completed windows into 0-100 percentages and forwards them to an
//! optional job reporter. Reporter failures are logged and swallowed.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::ports::{JobReporter, JobStatus, JobUpdate};

/// Per-run progress state
pub struct ProgressTracker {
    reporter: Option<Arc<dyn JobReporter>>,
    total: usize,
    completed: usize,
    last_percent: u8,
}

impl ProgressTracker {
    pub fn new(reporter: Option<Arc<dyn JobReporter>>) -> Self {
        Self {
            reporter,
            total: 0,
            completed: 0,
            last_percent: 0,
        }
    }

    /// Announce the start of a run
    pub fn start(&mut self, message: &str) {
        self.completed = 0;
        self.last_percent = 0;
        self.emit(
            JobStatus::Processing,
            JobUpdate::progress(0).with_message(message),
        );
    }

    /// Set the number of windows the run will analyse
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
    }

    /// Record one finished window
    pub fn advance(&mut self) {
        self.completed += 1;
        let percent = self.percent();
        self.last_percent = percent;
        debug!(
            completed = self.completed,
            total = self.total,
            percent,
            "Window analysis finished"
        );
        self.emit(
            JobStatus::Processing,
            JobUpdate::progress(percent).with_message(format!(
                "Analyzed {}/{} windows",
                self.completed, self.total
            )),
        );
    }

    pub fn complete(&mut self, message: &str) {
        self.last_percent = 100;
        self.emit(
            JobStatus::Completed,
            JobUpdate::progress(100).with_message(message),
        );
    }

    pub fn fail(&mut self, error: &str) {
        self.emit(
            JobStatus::Failed,
            JobUpdate::progress(self.last_percent).with_error(error),
        );
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Completed share of the run, rounded
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let ratio = self.completed.min(self.total) as f64 / self.total as f64;
        (ratio * 100.0).round() as u8
    }

    fn emit(&self, status: JobStatus, update: JobUpdate) {
        if let Some(reporter) = &self.reporter {
            if let Err(e) = reporter.report(status, update) {
                warn!(%status, error = %e, "Job reporter failed, continuing");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ReporterError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        updates: Mutex<Vec<(JobStatus, JobUpdate)>>,
    }

    impl JobReporter for RecordingReporter {
        fn report(&self, status: JobStatus, update: JobUpdate) -> Result<(), ReporterError> {
            self.updates.lock().unwrap().push((status, update));
            Ok(())
        }
    }

    struct BrokenReporter;

    impl JobReporter for BrokenReporter {
        fn report(&self, _status: JobStatus, _update: JobUpdate) -> Result<(), ReporterError> {
            Err(ReporterError::new("tracker offline"))
        }
    }

    #[test]
    fn test_progress_percentages() {
        let reporter = Arc::new(RecordingReporter::default());
        let mut tracker = ProgressTracker::new(Some(reporter.clone() as Arc<dyn JobReporter>));

        tracker.start("Starting analysis");
        tracker.set_total(3);
        tracker.advance();
        tracker.advance();
        tracker.advance();
        tracker.complete("done");

        let progress: Vec<(JobStatus, u8)> = reporter
            .updates
            .lock()
            .unwrap()
            .iter()
            .map(|(status, update)| (*status, update.progress))
            .collect();
        assert_eq!(
            progress,
            vec![
                (JobStatus::Processing, 0),
                (JobStatus::Processing, 33),
                (JobStatus::Processing, 67),
                (JobStatus::Processing, 100),
                (JobStatus::Completed, 100),
            ]
        );
    }

    #[test]
    fn test_failure_keeps_last_progress() {
        let reporter = Arc::new(RecordingReporter::default());
        let mut tracker = ProgressTracker::new(Some(reporter.clone() as Arc<dyn JobReporter>));
        tracker.set_total(4);
        tracker.advance();
        tracker.fail("asset unreadable");

        let updates = reporter.updates.lock().unwrap();
        let (status, update) = updates.last().unwrap();
        assert_eq!(*status, JobStatus::Failed);
        assert_eq!(update.progress, 25);
        assert_eq!(update.error.as_deref(), Some("asset unreadable"));
    }

    #[test]
    fn test_broken_reporter_is_swallowed() {
        let mut tracker = ProgressTracker::new(Some(Arc::new(BrokenReporter)));
        tracker.start("Starting analysis");
        tracker.set_total(1);
        tracker.advance();
        tracker.complete("done");
        assert_eq!(tracker.completed(), 1);
    }

    #[test]
    fn test_without_reporter() {
        let mut tracker = ProgressTracker::new(None);
        assert_eq!(tracker.percent(), 0);
        tracker.set_total(2);
        tracker.advance();
        assert_eq!(tracker.percent(), 50);
    }
}
