//! REST API server module
//!
//! Exposes task creation, progress polling and audio delivery over HTTP, plus the
//! browser frontend from the configured static directory.

use crate::{Config, Result, TaskManager};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tasks
/// - `POST /tasks` - Start an asynchronous extraction
/// - `GET /tasks/:id` - Task status and progress
/// - `GET /tasks/:id/play` - Stream the audio inline
/// - `GET /tasks/:id/download` - Download the audio, consuming the task
///
/// ## Synchronous
/// - `GET /download` - Extract and return the audio in one request
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
///
/// Anything else is served from `server.static_dir` when that directory exists.
pub fn create_router(manager: Arc<TaskManager>, config: Arc<Config>) -> Router {
    let state = AppState::new(manager, config.clone());

    let router = Router::new()
        // Tasks
        .route("/tasks", post(routes::create_task))
        .route("/tasks/:id", get(routes::get_task))
        .route("/tasks/:id/play", get(routes::play_task))
        .route("/tasks/:id/download", get(routes::download_task))
        // Synchronous download
        .route("/download", get(routes::download_now))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // Swagger UI gets its own copy of the document so it does not shadow /openapi.json
    let router = if config.server.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = match config.server.static_dir.as_deref() {
        Some(dir) if dir.is_dir() => {
            tracing::debug!(static_dir = ?dir, "serving static frontend");
            router.fallback_service(ServeDir::new(dir))
        }
        Some(dir) => {
            tracing::debug!(static_dir = ?dir, "static directory not found, frontend disabled");
            router
        }
        None => router,
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config (outermost layer)
    if config.server.cors_enabled {
        let cors = build_cors_layer(&config.server.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin. All methods and headers are allowed.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until [`TaskManager::shutdown`] is called, then stops accepting connections
/// and lets in-flight requests finish.
///
/// # Example
///
/// ```no_run
/// use listentube::{Config, TaskManager};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let manager = Arc::new(TaskManager::new((*config).clone()).await?);
///
/// // Start API server (blocks until shutdown)
/// listentube::api::start_api_server(manager, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(manager: Arc<TaskManager>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.server.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(manager.clone(), config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { manager.shutdown_requested().await })
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
