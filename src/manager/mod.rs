//! Task lifecycle controller split into focused submodules.
//!
//! The [`TaskManager`] struct and its methods are organized by domain:
//! - [`tasks`] - Task creation and status lookup
//! - [`worker`] - Background extraction and terminal-state handling
//! - [`serve`] - Handing finished files to clients (play, consuming download, sync download)
//! - [`lifecycle`] - Janitor startup and shutdown coordination

mod lifecycle;
mod serve;
mod tasks;
mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use serve::ServedFile;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor::{Extractor, select_extractor};
use crate::registry::TaskRegistry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Task lifecycle controller (cloneable - all fields are Arc-wrapped)
///
/// Owns the shared [`TaskRegistry`] and dispatches one extraction worker per task.
#[derive(Clone)]
pub struct TaskManager {
    /// Task records, shared with workers and the janitor
    pub(crate) registry: Arc<TaskRegistry>,
    /// Extraction backend
    pub(crate) extractor: Arc<dyn Extractor>,
    /// Time source for timestamps and expiry
    pub(crate) clock: Arc<dyn Clock>,
    /// Configuration
    pub(crate) config: Arc<Config>,
    /// Cancelled on shutdown; stops the janitor
    pub(crate) shutdown_token: CancellationToken,
}

impl TaskManager {
    /// Create a new TaskManager
    ///
    /// Validates the configuration, creates the work directory and picks the
    /// extractor (see [`select_extractor`]).
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.tasks.work_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create work directory '{}': {}",
                        config.tasks.work_dir.display(),
                        e
                    ),
                ))
            })?;

        let extractor = select_extractor(&config.extractor);
        tracing::info!(
            extractor = extractor.name(),
            work_dir = ?config.tasks.work_dir,
            ttl = ?config.tasks.ttl,
            "task manager initialized"
        );

        Ok(Self::from_parts(config, extractor, Arc::new(SystemClock)))
    }

    /// Assemble a manager from explicit collaborators
    ///
    /// Does no I/O and no validation; the work directory must already exist.
    pub fn from_parts(config: Config, extractor: Arc<dyn Extractor>, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: Arc::new(TaskRegistry::new()),
            extractor,
            clock,
            config: Arc::new(config),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Shared task registry
    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Name of the active extractor
    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }
}
