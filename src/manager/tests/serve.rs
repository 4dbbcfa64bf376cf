use super::*;
use std::sync::Arc;
use tokio::sync::Notify;

async fn finished_task(manager: &TaskManager, format: AudioFormat) -> TaskId {
    let id = manager.create_task("https://example.com/v", format).unwrap();
    assert_eq!(wait_for_terminal(manager, id).await, TaskStatus::Finished);
    id
}

#[tokio::test]
async fn play_serves_without_state_change() {
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Succeed("Song"));
    let id = finished_task(&manager, AudioFormat::Opus).await;

    let first = manager.serve_playable(id).await.unwrap();
    let second = manager.serve_playable(id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.file_name, "Song.opus");
    assert_eq!(first.mime_type(), "audio/ogg");
    assert_eq!(
        manager.task_status(id).unwrap().status,
        TaskStatus::Finished
    );
}

#[tokio::test]
async fn consume_twice_returns_same_file() {
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Succeed("Song"));
    let id = finished_task(&manager, AudioFormat::Mp3).await;
    let expires_before = manager.task_status(id).unwrap().expires_at;

    let first = manager.serve_and_consume(id).await.unwrap();
    assert_eq!(manager.task_status(id).unwrap().status, TaskStatus::Deleted);

    let second = manager.serve_and_consume(id).await.unwrap();
    let view = manager.task_status(id).unwrap();

    assert_eq!(first.path, second.path);
    assert_eq!(view.status, TaskStatus::Deleted);
    assert_eq!(view.expires_at, expires_before);
    assert!(first.path.exists());
}

#[tokio::test]
async fn consumed_task_is_still_playable() {
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Succeed("Song"));
    let id = finished_task(&manager, AudioFormat::M4a).await;

    manager.serve_and_consume(id).await.unwrap();
    let played = manager.serve_playable(id).await.unwrap();

    assert_eq!(played.mime_type(), "audio/mp4");
    assert_eq!(manager.task_status(id).unwrap().status, TaskStatus::Deleted);
}

#[tokio::test]
async fn unready_tasks_are_rejected() {
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Succeed("x"));

    for status in [
        TaskStatus::Queued,
        TaskStatus::Downloading,
        TaskStatus::Error,
        TaskStatus::Expired,
    ] {
        let id = manager.register("https://example.com/v", AudioFormat::Mp3).unwrap();
        manager.registry().mutate(id, |t| t.status = status).unwrap();

        for result in [
            manager.serve_playable(id).await,
            manager.serve_and_consume(id).await,
        ] {
            match result {
                Err(Error::Task(TaskError::NotReady { status: got, .. })) => {
                    assert_eq!(got, status)
                }
                other => panic!("expected NotReady for {status}, got {other:?}"),
            }
        }
        assert_eq!(manager.task_status(id).unwrap().status, status);
    }
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Succeed("x"));

    assert!(matches!(
        manager.serve_playable(TaskId::new()).await,
        Err(Error::Task(TaskError::NotFound { .. }))
    ));
    assert!(matches!(
        manager.serve_and_consume(TaskId::new()).await,
        Err(Error::Task(TaskError::NotFound { .. }))
    ));
}

#[tokio::test]
async fn missing_file_is_reported() {
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Succeed("x"));
    let id = finished_task(&manager, AudioFormat::Mp3).await;

    let path = manager.registry().get(id).unwrap().file_path.unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(
        manager.serve_playable(id).await,
        Err(Error::Task(TaskError::FileMissing { .. }))
    ));
    assert!(matches!(
        manager.serve_and_consume(id).await,
        Err(Error::Task(TaskError::FileMissing { .. }))
    ));
    // Nothing was handed out, so the task is not consumed
    assert_eq!(
        manager.task_status(id).unwrap().status,
        TaskStatus::Finished
    );
}

#[tokio::test]
async fn untitled_output_falls_back_to_audio() {
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Succeed("x"));
    let id = manager.register("https://example.com/v", AudioFormat::Mp3).unwrap();
    let path = manager.get_config().tasks.work_dir.join("bare.mp3");
    std::fs::write(&path, b"x").unwrap();
    manager
        .registry()
        .mutate(id, |t| {
            t.status = TaskStatus::Finished;
            t.file_path = Some(path.clone());
        })
        .unwrap();

    assert_eq!(
        manager.serve_playable(id).await.unwrap().file_name,
        "audio.mp3"
    );
}

#[tokio::test]
async fn download_now_returns_consumed_file() {
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Succeed("Inline"));

    let served = manager
        .download_now("https://example.com/v", AudioFormat::Opus)
        .await
        .unwrap();

    assert_eq!(served.file_name, "Inline.opus");
    assert!(served.path.exists());
    assert_eq!(
        manager.task_status(served.task_id).unwrap().status,
        TaskStatus::Deleted
    );
}

#[tokio::test]
async fn download_now_propagates_extraction_error() {
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Fail("geo blocked"));

    match manager
        .download_now("https://example.com/v", AudioFormat::Mp3)
        .await
    {
        Err(Error::Extraction(message)) => assert_eq!(message, "geo blocked"),
        other => panic!("expected extraction error, got {other:?}"),
    }
}

#[tokio::test]
async fn download_now_rejects_empty_url() {
    let (manager, _clock, _tmp) = create_test_manager(FakeBehavior::Succeed("x"));

    assert!(matches!(
        manager.download_now(" ", AudioFormat::Mp3).await,
        Err(Error::Validation(_))
    ));
}

#[tokio::test]
async fn dropped_download_now_still_finishes_and_is_swept() {
    let release = Arc::new(Notify::new());
    let (manager, clock, _tmp) = create_test_manager(FakeBehavior::Gated(release.clone()));

    let abandoned = tokio::time::timeout(
        Duration::from_millis(200),
        manager.download_now("https://example.com/v", AudioFormat::Mp3),
    )
    .await;
    assert!(abandoned.is_err(), "gated extraction should not complete");

    let id = manager.registry().snapshot()[0].id;
    wait_for_downloading(&manager, id).await;
    release.notify_one();
    assert_eq!(wait_for_terminal(&manager, id).await, TaskStatus::Finished);
    let task_dir = manager.registry().get(id).unwrap().temp_dir.unwrap();

    clock.advance(manager.get_config().tasks.ttl + Duration::from_secs(1));
    let report = manager.janitor().sweep().await;

    assert_eq!(report.evicted, 1);
    assert!(manager.registry().is_empty());
    assert!(!task_dir.exists());
}

#[tokio::test]
async fn dropped_download_now_times_out_and_is_swept() {
    let (manager, clock, _tmp) = create_test_manager_with(FakeBehavior::Hang, |c| {
        c.tasks.extraction_timeout = Some(Duration::from_secs(1));
    });

    let abandoned = tokio::time::timeout(
        Duration::from_millis(200),
        manager.download_now("https://example.com/v", AudioFormat::Mp3),
    )
    .await;
    assert!(abandoned.is_err());

    let id = manager.registry().snapshot()[0].id;
    assert_eq!(wait_for_terminal(&manager, id).await, TaskStatus::Error);
    let work_dir = manager.get_config().tasks.work_dir.clone();
    assert_eq!(std::fs::read_dir(&work_dir).unwrap().count(), 0);

    clock.advance(manager.get_config().tasks.ttl + Duration::from_secs(1));
    manager.janitor().sweep().await;

    assert!(manager.registry().is_empty());
}
