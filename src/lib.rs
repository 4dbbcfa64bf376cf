//! # listentube
//!
//! HTTP service that turns a media page URL into a downloadable audio file.
//!
//! ## Overview
//!
//! - **Asynchronous tasks** - `POST /tasks` returns an id at once; an extraction worker
//!   runs `yt-dlp` in the background and reports progress into the task registry
//! - **Polling** - `GET /tasks/:id` returns a sanitized view with progress, speed and ETA
//! - **Delivery** - finished audio is played inline or downloaded as an attachment;
//!   a download consumes the task, which stays servable for a grace window
//! - **Janitor** - a background sweep reclaims expired files and evicts their records
//!
//! ## Quick Start
//!
//! ```no_run
//! use listentube::{Config, TaskManager, run_with_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TaskManager::new(Config::default()).await?;
//!     manager.start_janitor();
//!     let server = manager.spawn_api_server();
//!
//!     // Stops the server and the janitor on SIGINT/SIGTERM
//!     run_with_shutdown(&manager).await;
//!     server.await??;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Time source abstraction
pub mod clock;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Audio extraction backends
pub mod extractor;
/// Expiry sweeps and file reclamation
pub mod janitor;
/// Task lifecycle controller (decomposed into focused submodules)
pub mod manager;
/// Progress reporting from workers into the registry
pub mod progress;
/// In-memory task registry
pub mod registry;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ExtractorConfig, ServerConfig, TaskConfig};
pub use error::{ApiError, Error, ErrorDetail, Result, TaskError, ToHttpStatus};
pub use extractor::{ExtractRequest, Extracted, Extractor, UnavailableExtractor, YtDlpExtractor};
pub use janitor::{Janitor, SweepReport};
pub use manager::{ServedFile, TaskManager};
pub use progress::{ProgressEvent, ProgressSink, ProgressUpdate};
pub use registry::{Task, TaskRegistry};
pub use types::{AudioFormat, TaskCreated, TaskId, TaskStatus, TaskView};

/// Wait for a termination signal, then shut the manager down.
///
/// Shutdown stops the janitor and lets a server started with
/// [`start_api_server`](api::start_api_server) finish gracefully.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(manager: &TaskManager) {
    wait_for_signal().await;
    manager.shutdown();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
