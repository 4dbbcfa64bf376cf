//! Best-effort removal of a task's files

use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of reclaiming one task's disk resources
///
/// Never turned into an error: the janitor logs it and moves on.
#[must_use]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReclaimReport {
    /// The audio file was deleted
    pub removed_file: bool,
    /// The working directory was deleted
    pub removed_dir: bool,
    /// Failures other than "already gone"
    pub failures: Vec<String>,
}

impl ReclaimReport {
    /// Whether every removal succeeded or had nothing to do
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Delete `file_path` and then `temp_dir`
///
/// Missing paths count as success. Other errors are recorded in the report and logged
/// as warnings.
pub async fn reclaim(file_path: Option<&Path>, temp_dir: Option<&Path>) -> ReclaimReport {
    let mut report = ReclaimReport::default();

    if let Some(file) = file_path {
        match tokio::fs::remove_file(file).await {
            Ok(()) => {
                debug!(path = ?file, "removed audio file");
                report.removed_file = true;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = ?file, error = %e, "failed to remove audio file");
                report.failures.push(format!("{}: {e}", file.display()));
            }
        }
    }

    if let Some(dir) = temp_dir {
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => {
                debug!(path = ?dir, "removed task directory");
                report.removed_dir = true;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = ?dir, error = %e, "failed to remove task directory");
                report.failures.push(format!("{}: {e}", dir.display()));
            }
        }
    }

    report
}
