//! Background extraction and terminal-state handling.

use crate::clock::add_duration;
use crate::error::{Error, Result};
use crate::extractor::{ExtractRequest, Extracted};
use crate::janitor::reclaim;
use crate::progress::TaskProgressSink;
use crate::types::{TaskId, TaskStatus};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use super::TaskManager;

impl TaskManager {
    /// Run the extraction for `id` on its own tokio task
    ///
    /// Nothing escapes the spawned task: failures and panics both end the task in
    /// `error`. The handle yields the extraction result; dropping it does not stop
    /// the worker.
    pub(crate) fn spawn_worker(&self, id: TaskId) -> tokio::task::JoinHandle<Result<()>> {
        let manager = self.clone();
        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(manager.run_extraction(id))
                .catch_unwind()
                .await;

            outcome.unwrap_or_else(|_| {
                tracing::error!(task_id = %id, "extraction worker panicked");
                manager.fail_if_active(id, "extraction worker panicked");
                Err(Error::Extraction("extraction worker panicked".to_string()))
            })
        })
    }

    /// Extract the task's URL and record the terminal state
    ///
    /// Returns the extraction error after it has been recorded on the task, so the
    /// synchronous endpoint can report it too.
    pub(crate) async fn run_extraction(&self, id: TaskId) -> Result<()> {
        let task = self.registry.get(id)?;
        let work_dir = self
            .config
            .tasks
            .work_dir
            .join(format!("task_{}", id.0.simple()));

        let result = match tokio::fs::create_dir_all(&work_dir).await {
            Ok(()) => {
                let request = ExtractRequest {
                    url: task.url.clone(),
                    format: task.format,
                    work_dir: work_dir.clone(),
                    base_name: id.0.simple().to_string(),
                };
                self.extract_with_limits(id, &request).await
            }
            Err(e) => Err(Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create task directory '{}': {}", work_dir.display(), e),
            ))),
        };

        match result {
            Ok(extracted) => {
                self.finish(id, extracted, work_dir).await;
                Ok(())
            }
            Err(e) => {
                self.fail(id, &e, work_dir).await;
                Err(e)
            }
        }
    }

    /// Run the extractor, converting panics and the optional timeout into errors
    async fn extract_with_limits(&self, id: TaskId, request: &ExtractRequest) -> Result<Extracted> {
        let sink = TaskProgressSink::new(id, self.registry.clone());
        let extraction = AssertUnwindSafe(self.extractor.extract(request, &sink)).catch_unwind();

        let outcome = match self.config.tasks.extraction_timeout {
            Some(limit) => match tokio::time::timeout(limit, extraction).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Err(Error::Extraction(format!(
                        "extraction timed out after {}s",
                        limit.as_secs()
                    )));
                }
            },
            None => extraction.await,
        };

        outcome.unwrap_or_else(|_| Err(Error::Extraction("extractor panicked".to_string())))
    }

    async fn finish(&self, id: TaskId, extracted: Extracted, work_dir: PathBuf) {
        let now = self.clock.now();
        let expires_at = add_duration(now, self.config.tasks.ttl);
        let file_path = extracted.file_path.clone();

        let recorded = self
            .registry
            .mutate(id, |task| {
                if !task.status.is_active() {
                    return false;
                }
                task.status = TaskStatus::Finished;
                task.progress = 100.0;
                task.title = Some(extracted.title);
                task.file_path = Some(extracted.file_path);
                task.temp_dir = Some(work_dir.clone());
                task.expires_at = expires_at;
                true
            })
            .unwrap_or(false);

        if recorded {
            tracing::info!(task_id = %id, path = ?file_path, "task finished");
        } else {
            tracing::debug!(task_id = %id, "task vanished before finishing, discarding output");
            let _ = reclaim(Some(&file_path), Some(&work_dir)).await;
        }
    }

    async fn fail(&self, id: TaskId, error: &Error, work_dir: PathBuf) {
        tracing::warn!(task_id = %id, error = %error, "task failed");

        let report = reclaim(None, Some(&work_dir)).await;
        let leftover = (!report.is_clean()).then_some(work_dir);

        let now = self.clock.now();
        let expires_at = add_duration(now, self.config.tasks.ttl);
        let message = error.to_string();

        let _ = self.registry.mutate(id, |task| {
            if !task.status.is_active() {
                return;
            }
            task.status = TaskStatus::Error;
            task.error = Some(message);
            task.temp_dir = leftover;
            task.expires_at = expires_at;
        });
    }

    fn fail_if_active(&self, id: TaskId, message: &str) {
        let expires_at = add_duration(self.clock.now(), self.config.tasks.ttl);
        let _ = self.registry.mutate(id, |task| {
            if task.status.is_active() {
                task.status = TaskStatus::Error;
                task.error = Some(message.to_string());
                task.expires_at = expires_at;
            }
        });
    }
}
