//! Test fixtures: a scripted extractor and an app wired to a manual clock

use async_trait::async_trait;
use axum::Router;
use listentube::api::create_router;
use listentube::{
    Config, ExtractRequest, Extracted, Extractor, ManualClock, ProgressEvent, ProgressSink,
    ProgressUpdate, TaskManager,
};
use std::sync::Arc;
use tempfile::TempDir;

/// Bytes every scripted extraction writes
pub const FAKE_AUDIO: &[u8] = b"OggS fake opus payload";

/// Extractor that reports a few progress lines and writes [`FAKE_AUDIO`]
pub struct ScriptedExtractor {
    /// Title reported on success
    pub title: &'static str,
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(
        &self,
        request: &ExtractRequest,
        sink: &dyn ProgressSink,
    ) -> listentube::Result<Extracted> {
        for (percent, downloaded) in [(10.0, 100), (55.5, 555), (99.9, 999)] {
            sink.report(ProgressEvent::Downloading(ProgressUpdate {
                progress: Some(percent),
                speed: Some("1.00MiB/s".to_string()),
                eta: Some(1),
                downloaded_bytes: Some(downloaded),
                total_bytes: Some(1000),
            }));
        }
        sink.report(ProgressEvent::Finished);

        let file_path = request.expected_path();
        tokio::fs::write(&file_path, FAKE_AUDIO).await?;
        Ok(Extracted {
            file_path,
            title: self.title.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// A router, its manager and the clock driving expiry
pub struct TestApp {
    pub router: Router,
    pub manager: Arc<TaskManager>,
    pub clock: Arc<ManualClock>,
    pub config: Arc<Config>,
    _temp_dir: TempDir,
}

impl TestApp {
    /// App backed by [`ScriptedExtractor`] with the given title
    pub fn new(title: &'static str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config::default();
        config.tasks.work_dir = temp_dir.path().join("work");
        config.server.static_dir = None;
        std::fs::create_dir_all(&config.tasks.work_dir).expect("Failed to create work dir");

        let clock = Arc::new(ManualClock::default());
        let manager = Arc::new(TaskManager::from_parts(
            config,
            Arc::new(ScriptedExtractor { title }),
            clock.clone(),
        ));
        let config = manager.get_config();
        let router = create_router(manager.clone(), config.clone());

        Self {
            router,
            manager,
            clock,
            config,
            _temp_dir: temp_dir,
        }
    }
}
