//! Handing finished audio files to clients.

use crate::error::{Result, TaskError};
use crate::extractor::DEFAULT_TITLE;
use crate::registry::Task;
use crate::types::{AudioFormat, TaskId, TaskStatus};
use std::path::PathBuf;

use super::TaskManager;

/// A file ready to be streamed to a client
#[derive(Debug, Clone, PartialEq)]
pub struct ServedFile {
    /// Task the file belongs to
    pub task_id: TaskId,
    /// Location on disk
    pub path: PathBuf,
    /// Audio format of the file
    pub format: AudioFormat,
    /// Suggested download name, `<title>.<ext>`
    pub file_name: String,
}

impl ServedFile {
    /// MIME type to send with the file
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

impl TaskManager {
    /// File of a finished (or consumed) task, without changing its state
    ///
    /// # Errors
    ///
    /// - [`TaskError::NotFound`] for unknown ids
    /// - [`TaskError::NotReady`] unless the task is `finished` or `deleted`
    /// - [`TaskError::FileMissing`] when the file is gone from disk
    pub async fn serve_playable(&self, id: TaskId) -> Result<ServedFile> {
        let task = self.registry.get(id)?;
        Self::servable_file(&task).await
    }

    /// File of a finished task, marking the task consumed
    ///
    /// The first call on a `finished` task moves it to `deleted`; later calls serve the
    /// same file until the janitor reclaims it after the grace window. The expiry time
    /// is left as it was. A task whose file is missing is not consumed.
    pub async fn serve_and_consume(&self, id: TaskId) -> Result<ServedFile> {
        let task = self.registry.get(id)?;
        let file = Self::servable_file(&task).await?;

        let status = self.registry.mutate(id, |task| {
            if task.status == TaskStatus::Finished {
                task.status = TaskStatus::Deleted;
                tracing::debug!(task_id = %task.id, "task consumed");
            }
            task.status
        })?;

        // The janitor may have claimed the task while the file was checked
        if !status.is_servable() {
            return Err(TaskError::NotReady {
                id: id.to_string(),
                status,
            }
            .into());
        }
        Ok(file)
    }

    /// Extract `url` and return the consumed result
    ///
    /// The extraction runs on a worker task, so it still reaches `finished` or `error`
    /// when the caller is dropped mid-way. The job is tracked in the registry and its
    /// directory is removed by the janitor like any other task.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`](crate::Error::Validation) for an empty url, or the
    /// extraction error.
    pub async fn download_now(&self, url: &str, format: AudioFormat) -> Result<ServedFile> {
        let id = self.register(url, format)?;
        tracing::info!(task_id = %id, url = url.trim(), %format, "synchronous download started");

        match self.spawn_worker(id).await {
            Ok(outcome) => outcome?,
            Err(e) => {
                return Err(crate::Error::Extraction(format!(
                    "extraction worker did not complete: {e}"
                )));
            }
        }
        self.serve_and_consume(id).await
    }

    async fn servable_file(task: &Task) -> Result<ServedFile> {
        if !task.status.is_servable() {
            return Err(TaskError::NotReady {
                id: task.id.to_string(),
                status: task.status,
            }
            .into());
        }

        let file_missing = || TaskError::FileMissing {
            id: task.id.to_string(),
        };
        let path = task.file_path.clone().ok_or_else(file_missing)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(file_missing().into());
        }

        let title = task.title.as_deref().unwrap_or(DEFAULT_TITLE);
        Ok(ServedFile {
            task_id: task.id,
            file_name: format!("{title}.{}", task.format.extension()),
            path,
            format: task.format,
        })
    }
}
