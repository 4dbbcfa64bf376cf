//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the listentube REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the listentube REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "listentube REST API",
        description = "Turn media URLs into downloadable audio files. Create a task, poll its progress, then play or download the result.",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:9000", description = "Local development server")
    ),
    paths(
        // Asynchronous tasks
        crate::api::routes::create_task,
        crate::api::routes::get_task,
        crate::api::routes::play_task,
        crate::api::routes::download_task,

        // Synchronous download
        crate::api::routes::download_now,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskStatus,
        crate::types::AudioFormat,
        crate::types::TaskView,
        crate::types::TaskCreated,

        // API request types from routes
        crate::api::routes::TaskQuery,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Asynchronous tasks - Create, poll, play and download"),
        (name = "download", description = "Synchronous download - Extract and return the audio in one request"),
        (name = "system", description = "System endpoints - Health check and OpenAPI spec"),
    )
)]
pub struct ApiDoc;
