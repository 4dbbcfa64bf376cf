use super::*;

#[tokio::test]
async fn create_task_returns_queued_task_immediately() {
    let release = Arc::new(tokio::sync::Notify::new());
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Gated(release.clone()));

    let id = manager
        .create_task("https://example.com/watch?v=1", AudioFormat::Opus)
        .unwrap();

    let view = manager.task_status(id).unwrap();
    assert!(view.status.is_active());
    assert_eq!(view.format, AudioFormat::Opus);
    assert_eq!(view.url, "https://example.com/watch?v=1");
    assert!(view.progress <= 50.0);

    release.notify_one();
    assert_eq!(wait_for_terminal(&manager, id).await, TaskStatus::Finished);
}

#[tokio::test]
async fn fresh_task_is_queued_with_zero_progress() {
    let (manager, clock, _tmp) = create_test_manager(FakeBehavior::Succeed("x"));

    // Register without a worker so nothing races the assertions.
    let id = manager.register("https://example.com/v", AudioFormat::Mp3).unwrap();

    let view = manager.task_status(id).unwrap();
    assert_eq!(view.status, TaskStatus::Queued);
    assert_eq!(view.progress, 0.0);
    assert_eq!(view.speed.as_deref(), Some("waiting"));
    assert_eq!(view.created_at, clock.now());
    assert_eq!(
        view.expires_at,
        clock.now() + chrono::Duration::seconds(1800)
    );
}

#[tokio::test]
async fn empty_url_is_rejected() {
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Succeed("x"));

    for url in ["", "   ", "\n"] {
        assert!(matches!(
            manager.create_task(url, AudioFormat::Mp3),
            Err(Error::Validation(_))
        ));
    }
    assert!(manager.registry().is_empty());
}

#[tokio::test]
async fn url_is_trimmed() {
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Succeed("x"));

    let id = manager
        .register("  https://example.com/v  ", AudioFormat::Mp3)
        .unwrap();

    assert_eq!(manager.task_status(id).unwrap().url, "https://example.com/v");
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Succeed("x"));

    assert!(matches!(
        manager.task_status(TaskId::new()),
        Err(Error::Task(TaskError::NotFound { .. }))
    ));
}
