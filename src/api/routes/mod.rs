//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Asynchronous task creation, status, play and download
//! - [`download`] - Synchronous one-shot download
//! - [`system`] - Health and OpenAPI

use crate::error::{Error, Result, TaskError};
use crate::manager::ServedFile;
use crate::types::{AudioFormat, TaskId};
use crate::utils::{Disposition, content_disposition};
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode, header};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;

mod download;
mod system;
mod tasks;

// Re-export all handlers so `routes::function_name` continues to work
pub use download::*;
pub use system::*;
pub use tasks::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Source URL and target format, accepted as query parameters or a JSON body
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskQuery {
    /// Media page URL
    pub url: Option<String>,
    /// Target format: mp3 (default), m4a or opus
    pub format: Option<String>,
}

impl TaskQuery {
    /// Non-blank url, if any
    fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    /// Non-blank format, if any
    fn format(&self) -> Option<&str> {
        self.format.as_deref().map(str::trim).filter(|f| !f.is_empty())
    }

    /// Merge a JSON body over query parameters, body fields first
    fn merged(body: &TaskQuery, query: &TaskQuery) -> Result<(String, AudioFormat)> {
        let url = body
            .url()
            .or_else(|| query.url())
            .ok_or_else(|| Error::Validation("missing 'url'".to_string()))?;
        let format = body
            .format()
            .or_else(|| query.format())
            .map(AudioFormat::parse)
            .unwrap_or_default();
        Ok((url.to_string(), format))
    }
}

/// Parse a task id from a path segment
///
/// Anything that is not a UUID cannot name a task, so it is reported as not found.
fn parse_task_id(raw: &str) -> Result<TaskId> {
    raw.parse().map_err(|_| {
        Error::Task(TaskError::NotFound {
            id: raw.to_string(),
        })
    })
}

/// Stream `file` with range and conditional request support
///
/// The request headers are forwarded so `Range` and `If-*` headers are honoured.
async fn file_response(
    file: ServedFile,
    disposition: Disposition,
    headers: &HeaderMap,
) -> Result<Response> {
    let mut request = Request::new(Body::empty());
    *request.headers_mut() = headers.clone();

    let response = match ServeFile::new(&file.path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(infallible) => match infallible {},
    };

    if response.status() == StatusCode::NOT_FOUND {
        return Err(TaskError::FileMissing {
            id: file.task_id.to_string(),
        }
        .into());
    }

    let (mut parts, body) = response.into_parts();
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(file.mime_type()),
    );
    parts
        .headers
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    let disposition_value = content_disposition(disposition, &file.file_name);
    match HeaderValue::from_str(&disposition_value) {
        Ok(value) => {
            parts.headers.insert(header::CONTENT_DISPOSITION, value);
        }
        Err(e) => {
            tracing::warn!(task_id = %file.task_id, error = %e, "invalid content-disposition, omitting");
        }
    }

    Ok(Response::from_parts(parts, body))
}
