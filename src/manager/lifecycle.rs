//! Janitor startup and shutdown coordination.

use crate::janitor::Janitor;
use std::sync::Arc;

use super::TaskManager;

impl TaskManager {
    /// Janitor over this manager's registry, using the configured cadence
    pub fn janitor(&self) -> Janitor {
        Janitor::new(
            self.registry.clone(),
            self.clock.clone(),
            self.config.tasks.sweep_interval,
            self.config.tasks.grace_period,
        )
    }

    /// Start the janitor background task
    ///
    /// The loop runs until [`shutdown`](Self::shutdown) is called.
    pub fn start_janitor(&self) -> tokio::task::JoinHandle<()> {
        let janitor = self.janitor();
        let token = self.shutdown_token.child_token();
        let handle = tokio::spawn(janitor.run(token));
        tracing::info!("Janitor background task started");
        handle
    }

    /// Spawn the API server as a background task
    ///
    /// The server stops gracefully once [`shutdown`](Self::shutdown) is called.
    pub fn spawn_api_server(&self) -> tokio::task::JoinHandle<crate::Result<()>> {
        let manager = Arc::new(self.clone());
        let config = self.get_config();
        tokio::spawn(async move { crate::api::start_api_server(manager, config).await })
    }

    /// Stop background services
    ///
    /// In-flight extractions are not interrupted; their results stay in memory until
    /// the process exits.
    pub fn shutdown(&self) {
        tracing::info!(
            tracked_tasks = self.registry.len(),
            "Initiating graceful shutdown"
        );
        self.shutdown_token.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Resolves once [`shutdown`](Self::shutdown) has been called
    pub async fn shutdown_requested(&self) {
        self.shutdown_token.cancelled().await
    }
}
