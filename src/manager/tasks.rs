//! Task creation and status lookup.

use crate::error::{Error, Result};
use crate::registry::Task;
use crate::types::{AudioFormat, TaskId, TaskView};

use super::TaskManager;

impl TaskManager {
    /// Register a new task and start extracting it in the background
    ///
    /// Returns as soon as the `queued` record exists; the worker runs on its own task.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when `url` is empty or only whitespace.
    pub fn create_task(&self, url: &str, format: AudioFormat) -> Result<TaskId> {
        let id = self.register(url, format)?;
        self.spawn_worker(id);
        tracing::info!(task_id = %id, url, %format, "task created");
        Ok(id)
    }

    /// Sanitized view of a task
    pub fn task_status(&self, id: TaskId) -> Result<TaskView> {
        self.registry.view(id)
    }

    /// Insert a queued record without dispatching a worker
    pub(crate) fn register(&self, url: &str, format: AudioFormat) -> Result<TaskId> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::Validation("missing 'url'".to_string()));
        }

        let task = Task::new(url, format, self.clock.now(), self.config.tasks.ttl);
        Ok(self.registry.create(task))
    }
}
