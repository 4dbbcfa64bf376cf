//! Task handlers: create, status, play, consuming download.

use super::{TaskQuery, file_response, parse_task_id};
use crate::api::AppState;
use crate::error::Result;
use crate::types::{TaskCreated, TaskView};
use crate::utils::Disposition;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

/// POST /tasks - Start an asynchronous extraction
///
/// Reads `url` and `format` from a JSON body, falling back to query parameters.
/// A body that is not valid JSON is treated as absent.
#[utoipa::path(
    post,
    path = "/tasks",
    tag = "tasks",
    params(TaskQuery),
    request_body(content = TaskQuery, description = "Source URL and target format", content_type = "application/json"),
    responses(
        (status = 201, description = "Task created", body = TaskCreated),
        (status = 400, description = "Missing url", body = crate::error::ApiError)
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
    body: Bytes,
) -> Result<Response> {
    let body: TaskQuery = serde_json::from_slice(&body).unwrap_or_default();
    let (url, format) = TaskQuery::merged(&body, &query)?;

    let id = state.manager.create_task(&url, format)?;

    Ok((StatusCode::CREATED, Json(TaskCreated { id })).into_response())
}

/// GET /tasks/:id - Task status
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task status", body = TaskView),
        (status = 404, description = "Unknown task", body = crate::error::ApiError)
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskView>> {
    let id = parse_task_id(&id)?;
    Ok(Json(state.manager.task_status(id)?))
}

/// GET /tasks/:id/play - Stream the audio inline
///
/// Does not change the task's status.
#[utoipa::path(
    get,
    path = "/tasks/{id}/play",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Audio bytes, inline", content_type = "audio/mpeg"),
        (status = 206, description = "Partial audio bytes for a range request"),
        (status = 404, description = "Unknown task or file reclaimed", body = crate::error::ApiError),
        (status = 409, description = "Task not finished", body = crate::error::ApiError)
    )
)]
pub async fn play_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let id = parse_task_id(&id)?;
    let file = state.manager.serve_playable(id).await?;
    file_response(file, Disposition::Inline, &headers).await
}

/// GET /tasks/:id/download - Download the audio as an attachment
///
/// The first download moves a finished task to `deleted`; the file stays available
/// for the grace window.
#[utoipa::path(
    get,
    path = "/tasks/{id}/download",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Audio bytes, attachment", content_type = "audio/mpeg"),
        (status = 404, description = "Unknown task or file reclaimed", body = crate::error::ApiError),
        (status = 409, description = "Task not finished", body = crate::error::ApiError)
    )
)]
pub async fn download_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let id = parse_task_id(&id)?;
    let file = state.manager.serve_and_consume(id).await?;
    file_response(file, Disposition::Attachment, &headers).await
}
