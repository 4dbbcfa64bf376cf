//! Shared test helpers for creating TaskManager instances in tests.

use crate::clock::ManualClock;
use crate::config::Config;
use crate::extractor::{ExtractRequest, Extracted, Extractor};
use crate::manager::TaskManager;
use crate::progress::{ProgressEvent, ProgressSink, ProgressUpdate};
use crate::types::{TaskId, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

/// How the fake extractor behaves
pub(crate) enum FakeBehavior {
    /// Report progress, write `<base>.<ext>`, succeed with this title
    Succeed(&'static str),
    /// Fail with this message
    Fail(&'static str),
    /// Write the file with a different extension than requested
    WrongExtension(&'static str),
    /// Panic mid-extraction
    Panic,
    /// Report one progress event, then wait for `release` before succeeding
    Gated(Arc<Notify>),
    /// Never finish
    Hang,
}

/// Extractor that never leaves the process
pub(crate) struct FakeExtractor {
    behavior: FakeBehavior,
}

impl FakeExtractor {
    pub(crate) fn new(behavior: FakeBehavior) -> Self {
        Self { behavior }
    }
}

fn halfway() -> ProgressEvent {
    ProgressEvent::Downloading(ProgressUpdate {
        progress: Some(50.0),
        speed: Some("2.00MiB/s".into()),
        eta: Some(3),
        downloaded_bytes: Some(512),
        total_bytes: Some(1024),
    })
}

async fn write_output(request: &ExtractRequest, ext: &str) -> Extracted {
    let path = request
        .work_dir
        .join(format!("{}.{ext}", request.base_name));
    tokio::fs::write(&path, b"fake audio bytes").await.unwrap();
    Extracted {
        file_path: path,
        title: String::new(),
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn extract(
        &self,
        request: &ExtractRequest,
        sink: &dyn ProgressSink,
    ) -> crate::Result<Extracted> {
        match &self.behavior {
            FakeBehavior::Succeed(title) => {
                sink.report(halfway());
                sink.report(ProgressEvent::Finished);
                let mut out = write_output(request, request.format.extension()).await;
                out.title = title.to_string();
                Ok(out)
            }
            FakeBehavior::Fail(message) => {
                sink.report(halfway());
                Err(crate::Error::Extraction(message.to_string()))
            }
            FakeBehavior::WrongExtension(ext) => {
                let mut out = write_output(request, ext).await;
                out.title = "odd".into();
                Ok(out)
            }
            FakeBehavior::Panic => {
                sink.report(halfway());
                panic!("fake extractor exploded");
            }
            FakeBehavior::Gated(release) => {
                sink.report(halfway());
                release.notified().await;
                let mut out = write_output(request, request.format.extension()).await;
                out.title = "gated".into();
                Ok(out)
            }
            FakeBehavior::Hang => {
                sink.report(halfway());
                std::future::pending().await
            }
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Test manager with a manual clock and a work directory inside a tempdir.
/// Returns the tempdir too, which must be kept alive.
pub(crate) fn create_test_manager(
    behavior: FakeBehavior,
) -> (TaskManager, Arc<ManualClock>, TempDir) {
    create_test_manager_with(behavior, |_| {})
}

/// Like [`create_test_manager`], with a chance to adjust the config first
pub(crate) fn create_test_manager_with(
    behavior: FakeBehavior,
    adjust: impl FnOnce(&mut Config),
) -> (TaskManager, Arc<ManualClock>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.tasks.work_dir = temp_dir.path().join("work");
    config.server.static_dir = None;
    adjust(&mut config);
    std::fs::create_dir_all(&config.tasks.work_dir).unwrap();

    let clock = Arc::new(ManualClock::default());
    let manager = TaskManager::from_parts(
        config,
        Arc::new(FakeExtractor::new(behavior)),
        clock.clone(),
    );
    (manager, clock, temp_dir)
}

/// Poll until the task leaves the active states, panicking after five seconds
pub(crate) async fn wait_for_terminal(manager: &TaskManager, id: TaskId) -> TaskStatus {
    for _ in 0..500 {
        let status = manager.task_status(id).unwrap().status;
        if !status.is_active() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {id} did not reach a terminal state");
}

/// Poll until the task reports `downloading`
pub(crate) async fn wait_for_downloading(manager: &TaskManager, id: TaskId) {
    for _ in 0..500 {
        if manager.task_status(id).unwrap().status == TaskStatus::Downloading {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {id} never started downloading");
}
