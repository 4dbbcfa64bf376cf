//! Synchronous one-shot download.

use super::{TaskQuery, file_response};
use crate::api::AppState;
use crate::error::Result;
use crate::utils::Disposition;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
};

/// GET /download - Extract a URL and return the audio in the same response
///
/// Blocks for the whole extraction. The job is recorded as a task and consumed
/// immediately, so its directory is reclaimed by the janitor.
#[utoipa::path(
    get,
    path = "/download",
    tag = "download",
    params(TaskQuery),
    responses(
        (status = 200, description = "Audio bytes, attachment", content_type = "audio/mpeg"),
        (status = 400, description = "Missing url", body = crate::error::ApiError),
        (status = 500, description = "Extraction failed", body = crate::error::ApiError)
    )
)]
pub async fn download_now(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let (url, format) = TaskQuery::merged(&TaskQuery::default(), &query)?;
    let file = state.manager.download_now(&url, format).await?;
    file_response(file, Disposition::Attachment, &headers).await
}
