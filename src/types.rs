//! Core types for listentube

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Unique identifier for a task
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Generate a fresh random TaskId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Task status
///
/// Exactly one status holds at any time. `finished` and `error` are terminal for the
/// worker; `deleted` and `expired` are driven by clients and the janitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created, worker not started reporting yet
    Queued,
    /// Worker is reporting progress
    Downloading,
    /// Audio file is ready
    Finished,
    /// Extraction failed
    Error,
    /// Reclaimed by the janitor
    Expired,
    /// Consumed by a download, kept for the grace window
    Deleted,
}

impl TaskStatus {
    /// Lowercase name as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Downloading => "downloading",
            TaskStatus::Finished => "finished",
            TaskStatus::Error => "error",
            TaskStatus::Expired => "expired",
            TaskStatus::Deleted => "deleted",
        }
    }

    /// Whether the worker may still write to a task in this status
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Queued | TaskStatus::Downloading)
    }

    /// Whether the task's file may be handed to clients
    pub fn is_servable(&self) -> bool {
        matches!(self, TaskStatus::Finished | TaskStatus::Deleted)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target audio format
///
/// Serialized as the file extension (`mp3`, `m4a`, `opus`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MPEG layer 3 (`audio/mpeg`)
    #[default]
    Mp3,
    /// AAC in an MP4 container (`audio/mp4`)
    M4a,
    /// Opus in an Ogg container (`audio/ogg`)
    Opus,
}

impl AudioFormat {
    /// Map a user-supplied format name or MIME type to a format
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace. Anything
    /// unrecognized falls back to mp3.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "mp3" | "audio/mpeg" => AudioFormat::Mp3,
            "m4a" | "aac" | "audio/mp4" => AudioFormat::M4a,
            "opus" | "ogg" | "audio/ogg" => AudioFormat::Opus,
            _ => AudioFormat::Mp3,
        }
    }

    /// MIME type sent with the audio file
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Opus => "audio/ogg",
        }
    }

    /// File extension, also the codec name handed to the extractor
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Opus => "opus",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Public projection of a task, safe to hand to API clients
///
/// Filesystem paths are deliberately absent from this type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskView {
    /// Task identifier
    #[schema(value_type = String)]
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
    /// Creation time (unix seconds)
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schema(value_type = i64)]
    pub created_at: DateTime<Utc>,
    /// Expiry time (unix seconds)
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schema(value_type = i64)]
    pub expires_at: DateTime<Utc>,
    /// Source media URL
    pub url: String,
    /// Target audio format
    pub format: AudioFormat,
    /// Media title, known once extraction finished
    pub title: Option<String>,
    /// Failure message, only set when status is `error`
    pub error: Option<String>,
}

/// Response body for task creation
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskCreated {
    /// Identifier of the new task
    #[schema(value_type = String)]
    pub id: TaskId,
}
