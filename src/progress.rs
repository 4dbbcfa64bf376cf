//! Progress reporting from extraction workers into task records
//!
//! Extractors only see the [`ProgressSink`] trait. The registry-backed implementation,
//! [`TaskProgressSink`], is bound to exactly one task id when it is constructed.

use crate::registry::TaskRegistry;
use crate::types::{TaskId, TaskStatus};
use std::sync::Arc;

/// Speed reported when the extractor gave none
pub(crate) const SPEED_UNKNOWN: &str = "unknown";

/// Speed shown once the download part of an extraction completed
pub(crate) const SPEED_DONE: &str = "done";

/// Normalized progress fields
///
/// `None` means "not reported in this update" and leaves the stored value alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressUpdate {
    /// Percentage, clamped to [0, 100] when applied
    pub progress: Option<f64>,
    /// Human-readable speed
    pub speed: Option<String>,
    /// Seconds remaining
    pub eta: Option<u64>,
    /// Bytes downloaded so far
    pub downloaded_bytes: Option<u64>,
    /// Total bytes, exact or estimated
    pub total_bytes: Option<u64>,
}

/// Event emitted by an extractor while it works
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    /// Bytes are flowing
    Downloading(ProgressUpdate),
    /// The download part finished; conversion may still be running
    Finished,
}

/// Write-only progress callback handed to extractors
pub trait ProgressSink: Send + Sync {
    /// Record one progress event
    fn report(&self, event: ProgressEvent);
}

/// Sink that writes progress into one task record of a [`TaskRegistry`]
///
/// Updates for a task that no longer exists, or that already left the active states,
/// are dropped without error.
#[derive(Clone, Debug)]
pub struct TaskProgressSink {
    id: TaskId,
    registry: Arc<TaskRegistry>,
}

impl TaskProgressSink {
    /// Bind a sink to `id`
    pub fn new(id: TaskId, registry: Arc<TaskRegistry>) -> Self {
        Self { id, registry }
    }

    /// Task this sink writes to
    pub fn task_id(&self) -> TaskId {
        self.id
    }
}

impl ProgressSink for TaskProgressSink {
    fn report(&self, event: ProgressEvent) {
        let applied = self.registry.mutate(self.id, |task| {
            if !task.status.is_active() {
                return;
            }

            match event {
                ProgressEvent::Downloading(update) => {
                    task.status = TaskStatus::Downloading;

                    if let Some(progress) = update.progress.filter(|p| p.is_finite()) {
                        task.progress = task.progress.max(progress.clamp(0.0, 100.0));
                    }
                    if let Some(speed) = update.speed {
                        task.speed = Some(speed);
                    }
                    if update.eta.is_some() {
                        task.eta = update.eta;
                    }
                    if update.downloaded_bytes.is_some() {
                        task.downloaded_bytes = update.downloaded_bytes;
                    }
                    if update.total_bytes.is_some() {
                        task.total_bytes = update.total_bytes;
                    }
                }
                ProgressEvent::Finished => {
                    task.status = TaskStatus::Downloading;
                    task.progress = 100.0;
                    task.speed = Some(SPEED_DONE.to_string());
                    task.eta = Some(0);
                }
            }
        });

        if applied.is_err() {
            tracing::trace!(task_id = %self.id, "dropping progress for evicted task");
        }
    }
}
