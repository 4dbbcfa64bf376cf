//! In-memory task registry
//!
//! The registry is the single owner of every [`Task`] record. Everything else (the
//! controller, workers through their progress sink, the janitor) reads and writes tasks
//! through the synchronized accessors here, each of which holds the lock for exactly one
//! lookup or closure call. No accessor performs I/O while holding the lock.

use crate::clock::add_duration;
use crate::error::{Result, TaskError};
use crate::types::{AudioFormat, TaskId, TaskStatus, TaskView};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Speed placeholder shown before the worker reports anything
pub(crate) const SPEED_WAITING: &str = "waiting";

/// One tracked extraction job
///
/// `file_path` and `temp_dir` never leave the process: the only serializable form of a
/// task is [`TaskView`].
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    /// Task identifier
    pub id: TaskId,
    /// Current lifecycle status
    pub status: TaskStatus,
    /// Progress percentage in [0, 100]
    pub progress: f64,
    /// Human-readable download speed
    pub speed: Option<String>,
    /// Estimated seconds remaining
    pub eta: Option<u64>,
    /// Bytes downloaded so far
    pub downloaded_bytes: Option<u64>,
    /// Total bytes, if known
    pub total_bytes: Option<u64>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Expiry time, recomputed at each terminal transition
    pub expires_at: DateTime<Utc>,
    /// Source media URL
    pub url: String,
    /// Target audio format
    pub format: AudioFormat,
    /// Media title
    pub title: Option<String>,
    /// Failure message (status `error` only)
    pub error: Option<String>,
    /// Finished audio file
    pub file_path: Option<PathBuf>,
    /// Working directory holding the audio file
    pub temp_dir: Option<PathBuf>,
}

impl Task {
    /// New queued task created at `now`, expiring `ttl` later unless a terminal
    /// transition pushes the expiry out
    pub fn new(url: impl Into<String>, format: AudioFormat, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: TaskId::new(),
            status: TaskStatus::Queued,
            progress: 0.0,
            speed: Some(SPEED_WAITING.to_string()),
            eta: None,
            downloaded_bytes: None,
            total_bytes: None,
            created_at: now,
            expires_at: add_duration(now, ttl),
            url: url.into(),
            format,
            title: None,
            error: None,
            file_path: None,
            temp_dir: None,
        }
    }

    /// Sanitized projection for API clients
    pub fn to_view(&self) -> TaskView {
        TaskView {
            id: self.id,
            status: self.status,
            progress: self.progress,
            speed: self.speed.clone(),
            eta: self.eta,
            downloaded_bytes: self.downloaded_bytes,
            total_bytes: self.total_bytes,
            created_at: self.created_at,
            expires_at: self.expires_at,
            url: self.url.clone(),
            format: self.format,
            title: self.title.clone(),
            error: self.error.clone(),
        }
    }
}

/// Concurrency-safe map from task id to task record
///
/// A single mutex guards the whole map. Task counts are small and every critical
/// section is a map lookup plus a field update, so one lock keeps the ordering story
/// simple: once [`mutate`](Self::mutate) returns, every later [`get`](Self::get) on the
/// same id observes the change.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, Task>> {
        // A panic while holding the lock cannot leave a record half-written in a way
        // that matters more than losing the whole service, so keep going.
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a task and return its id
    pub fn create(&self, task: Task) -> TaskId {
        let id = task.id;
        self.lock().insert(id, task);
        id
    }

    /// Copy of a task record
    pub fn get(&self, id: TaskId) -> Result<Task> {
        self.lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Sanitized view of a task record
    pub fn view(&self, id: TaskId) -> Result<TaskView> {
        self.lock()
            .get(&id)
            .map(Task::to_view)
            .ok_or_else(|| not_found(id))
    }

    /// Apply `update` to the task atomically and return its result
    pub fn mutate<R>(&self, id: TaskId, update: impl FnOnce(&mut Task) -> R) -> Result<R> {
        let mut tasks = self.lock();
        let task = tasks.get_mut(&id).ok_or_else(|| not_found(id))?;
        Ok(update(task))
    }

    /// Remove a task, returning the record if it existed
    pub fn remove(&self, id: TaskId) -> Option<Task> {
        self.lock().remove(&id)
    }

    /// Point-in-time copy of every record
    pub fn snapshot(&self) -> Vec<Task> {
        self.lock().values().cloned().collect()
    }

    /// Number of tracked tasks
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no tasks are tracked
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn not_found(id: TaskId) -> crate::Error {
    TaskError::NotFound { id: id.to_string() }.into()
}
