//! Periodic reclamation of expired tasks
//!
//! The janitor works from a registry snapshot and re-checks every decision inside
//! [`TaskRegistry::mutate`] before acting, so a task that changed between the snapshot
//! and the sweep is left alone. File removal happens outside the registry lock.
//!
//! Rules, applied once per sweep:
//! - `finished` / `error` past `expires_at`: marked `expired`, files removed, record evicted
//! - `deleted` past `expires_at + grace_period`: files removed, record evicted
//! - `expired` still present: files removed, record evicted
//! - `queued` / `downloading`: never touched

mod cleanup;

pub use cleanup::{ReclaimReport, reclaim};

use crate::clock::{Clock, add_duration};
use crate::registry::{Task, TaskRegistry};
use crate::types::{TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Counts from one sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Tasks in the snapshot
    pub scanned: usize,
    /// Finished or failed tasks that passed their expiry
    pub expired: usize,
    /// Consumed tasks that passed their grace window
    pub consumed: usize,
    /// Records removed from the registry
    pub evicted: usize,
    /// Tasks whose files could not be fully removed
    pub reclaim_failures: usize,
}

/// Background sweeper for the task registry
#[derive(Clone)]
pub struct Janitor {
    registry: Arc<TaskRegistry>,
    clock: Arc<dyn Clock>,
    sweep_interval: Duration,
    grace_period: Duration,
}

impl Janitor {
    /// Create a janitor over `registry`
    pub fn new(
        registry: Arc<TaskRegistry>,
        clock: Arc<dyn Clock>,
        sweep_interval: Duration,
        grace_period: Duration,
    ) -> Self {
        Self {
            registry,
            clock,
            sweep_interval,
            grace_period,
        }
    }

    /// Sweep every `sweep_interval` until `cancel` fires
    ///
    /// The first sweep runs one interval after start.
    pub async fn run(self, cancel: CancellationToken) {
        info!(interval = ?self.sweep_interval, grace = ?self.grace_period, "janitor started");

        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.sweep_interval, self.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.sweep().await;
                    if report.evicted > 0 || report.reclaim_failures > 0 {
                        info!(
                            scanned = report.scanned,
                            expired = report.expired,
                            consumed = report.consumed,
                            evicted = report.evicted,
                            reclaim_failures = report.reclaim_failures,
                            "janitor sweep reclaimed tasks"
                        );
                    } else {
                        debug!(scanned = report.scanned, "janitor sweep found nothing to reclaim");
                    }
                }
            }
        }

        info!("janitor stopped");
    }

    /// Run one sweep over a snapshot of the registry
    pub async fn sweep(&self) -> SweepReport {
        let now = self.clock.now();
        let snapshot = self.registry.snapshot();
        let mut report = SweepReport {
            scanned: snapshot.len(),
            ..SweepReport::default()
        };

        for task in snapshot {
            let Some(kind) = self.classify(&task, now) else {
                continue;
            };

            // Re-check under the lock; the snapshot may be stale.
            let claimed = self
                .registry
                .mutate(task.id, |current| {
                    if self.classify(current, now) != Some(kind) {
                        return None;
                    }
                    current.status = TaskStatus::Expired;
                    Some((current.file_path.clone(), current.temp_dir.clone()))
                })
                .ok()
                .flatten();

            let Some((file_path, temp_dir)) = claimed else {
                continue;
            };

            match kind {
                Reclaim::Expired => report.expired += 1,
                Reclaim::Consumed => report.consumed += 1,
                Reclaim::Leftover => {}
            }

            if !self.reclaim_and_evict(task.id, file_path, temp_dir).await {
                report.reclaim_failures += 1;
            }
            report.evicted += 1;
        }

        report
    }

    fn classify(&self, task: &Task, now: DateTime<Utc>) -> Option<Reclaim> {
        match task.status {
            TaskStatus::Finished | TaskStatus::Error if now > task.expires_at => {
                Some(Reclaim::Expired)
            }
            TaskStatus::Deleted if now > add_duration(task.expires_at, self.grace_period) => {
                Some(Reclaim::Consumed)
            }
            TaskStatus::Expired => Some(Reclaim::Leftover),
            _ => None,
        }
    }

    async fn reclaim_and_evict(
        &self,
        id: TaskId,
        file_path: Option<PathBuf>,
        temp_dir: Option<PathBuf>,
    ) -> bool {
        let report = reclaim(file_path.as_deref(), temp_dir.as_deref()).await;
        if !report.is_clean() {
            debug!(task_id = %id, failures = ?report.failures, "task files only partly reclaimed");
        }
        self.registry.remove(id);
        debug!(task_id = %id, "evicted task");
        report.is_clean()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reclaim {
    Expired,
    Consumed,
    Leftover,
}
