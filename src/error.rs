//! Error types for listentube
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (task lookups, extraction, configuration)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use crate::types::TaskStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for listentube operations
pub type Result<T> = std::result::Result<T, Error>;

/// Hint attached to extraction failures, most of which come from a missing ffmpeg
pub(crate) const EXTRACTION_HINT: &str =
    "make sure yt-dlp and ffmpeg are installed, e.g. `brew install yt-dlp ffmpeg`";

/// Main error type for listentube
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed client input
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "tasks.ttl")
        key: Option<String>,
    },

    /// Task-related error
    #[error("task error: {0}")]
    Task(#[from] TaskError),

    /// The external extractor failed (network, geo-block, unsupported URL, missing ffmpeg)
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// External tool could not be executed at all
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Errors raised by task lookups and state checks
#[derive(Debug, Error)]
pub enum TaskError {
    /// Task id was never created or has already been evicted
    #[error("task {id} not found")]
    NotFound {
        /// The task ID that was not found
        id: String,
    },

    /// Task record exists but its audio file is gone
    #[error("file for task {id} not found")]
    FileMissing {
        /// The task ID whose file was not found
        id: String,
    },

    /// Task is not in a servable state yet
    #[error("task not ready, status={status}")]
    NotReady {
        /// The task ID that is not ready
        id: String,
        /// Current status of the task
        status: TaskStatus,
    },
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_not_ready",
///     "message": "task error: task not ready, status=downloading",
///     "details": {
///       "task_id": "0f8fad5b-d9cb-469f-a165-70867728950e",
///       "status": "downloading"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "task_not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Validation(_) => 400,
            Error::Config { .. } => 400,
            Error::ConfigFile(_) => 400,

            // 404 Not Found
            Error::Task(TaskError::NotFound { .. }) => 404,
            Error::Task(TaskError::FileMissing { .. }) => 404,

            // 409 Conflict - task exists but cannot be served yet
            Error::Task(TaskError::NotReady { .. }) => 409,

            // 500 Internal Server Error
            Error::Extraction(_) => 500,
            Error::ExternalTool(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::Config { .. } => "config_error",
            Error::ConfigFile(_) => "config_error",
            Error::Task(e) => match e {
                TaskError::NotFound { .. } => "task_not_found",
                TaskError::FileMissing { .. } => "file_not_found",
                TaskError::NotReady { .. } => "task_not_ready",
            },
            Error::Extraction(_) => "extraction_failed",
            Error::ExternalTool(_) => "external_tool_error",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Task(TaskError::NotFound { id }) | Error::Task(TaskError::FileMissing { id }) => {
                Some(serde_json::json!({
                    "task_id": id,
                }))
            }
            Error::Task(TaskError::NotReady { id, status }) => Some(serde_json::json!({
                "task_id": id,
                "status": status,
            })),
            Error::Extraction(reason) => Some(serde_json::json!({
                "details": reason,
                "hint": EXTRACTION_HINT,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
