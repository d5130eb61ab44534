// Tracing job reporter - Progress updates as structured tracing events

use tracing::{debug, error, info};

use crate::ports::{JobReporter, JobStatus, JobUpdate, ReporterError};

/// Job reporter that logs every update
///
/// Stands in for an external job tracker when the engine runs from the CLI.
pub struct TracingJobReporter {
    job_id: String,
    quiet_progress: bool,
}

impl TracingJobReporter {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            quiet_progress: false,
        }
    }

    /// Demote per-window progress to debug level
    pub fn with_quiet_progress(mut self, quiet: bool) -> Self {
        self.quiet_progress = quiet;
        self
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

impl JobReporter for TracingJobReporter {
    fn report(&self, status: JobStatus, update: JobUpdate) -> Result<(), ReporterError> {
        let message = update.message.as_deref().unwrap_or("");
        match status {
            JobStatus::Processing if self.quiet_progress => {
                debug!(job = %self.job_id, %status, progress = update.progress, message);
            }
            JobStatus::Processing | JobStatus::Completed => {
                info!(job = %self.job_id, %status, progress = update.progress, message);
            }
            JobStatus::Failed => {
                let reason = update.error.as_deref().unwrap_or("unknown error");
                error!(job = %self.job_id, %status, progress = update.progress, error = reason);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporting_never_fails() {
        let reporter = TracingJobReporter::new("job-1").with_quiet_progress(true);
        assert_eq!(reporter.job_id(), "job-1");
        assert!(reporter
            .report(JobStatus::Processing, JobUpdate::progress(40))
            .is_ok());
        assert!(reporter
            .report(
                JobStatus::Failed,
                JobUpdate::progress(40).with_error("asset unreadable")
            )
            .is_ok());
    }
}
