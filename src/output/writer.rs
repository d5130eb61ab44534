//! Report writer: stdout or an atomically replaced file

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{ClipScanError, ClipScanResult};

/// Destination for rendered reports
pub struct ReportWriter {
    path: Option<PathBuf>,
}

impl ReportWriter {
    pub fn stdout() -> Self {
        Self { path: None }
    }

    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn from_option(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn write(&self, rendered: &str) -> ClipScanResult<()> {
        match &self.path {
            None => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                handle.write_all(rendered.as_bytes())?;
                if !rendered.ends_with('\n') {
                    handle.write_all(b"\n")?;
                }
                handle.flush()?;
                Ok(())
            }
            Some(path) => {
                Self::write_atomic(path, rendered)?;
                info!(path = %path.display(), bytes = rendered.len(), "Report written");
                Ok(())
            }
        }
    }

    /// Write through a sibling temp file so readers never see a partial report
    fn write_atomic(path: &Path, rendered: &str) -> ClipScanResult<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)?;
        temp.write_all(rendered.as_bytes())?;
        temp.flush()?;
        temp.persist(path).map_err(|e| ClipScanError::OutputError {
            message: format!("Failed to write {}: {}", path.display(), e.error),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_to_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("clips.json");

        ReportWriter::to_file(&path).write("{}").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clips.txt");
        std::fs::write(&path, "old report that is longer").unwrap();

        ReportWriter::to_file(&path).write("new").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
