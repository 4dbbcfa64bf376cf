use super::*;
use crate::clock::ManualClock;
use crate::error::ApiError;
use crate::manager::test_helpers::{
    FakeBehavior, create_test_manager, create_test_manager_with, wait_for_terminal,
};
use crate::types::{TaskId, TaskStatus, TaskView};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;


/// Router over a test manager, plus the manager itself for direct inspection
struct TestApp {
    router: Router,
    manager: Arc<TaskManager>,
    _clock: Arc<ManualClock>,
    _temp_dir: TempDir,
}

impl TestApp {
    fn new(behavior: FakeBehavior) -> Self {
        let (manager, clock, temp_dir) = create_test_manager(behavior);
        Self::wrap(manager, clock, temp_dir)
    }

    fn with_config(behavior: FakeBehavior, adjust: impl FnOnce(&mut Config)) -> Self {
        let (manager, clock, temp_dir) = create_test_manager_with(behavior, adjust);
        Self::wrap(manager, clock, temp_dir)
    }

    fn wrap(manager: TaskManager, clock: Arc<ManualClock>, temp_dir: TempDir) -> Self {
        let manager = Arc::new(manager);
        let router = create_router(manager.clone(), manager.get_config());
        Self {
            router,
            manager,
            _clock: clock,
            _temp_dir: temp_dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Create a task over HTTP and wait for the worker to finish
    async fn finished_task(&self, format: &str) -> TaskId {
        let response = self
            .send(
                Request::post("/tasks")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(format!(
                        r#"{{"url":"https://example.com/watch?v=1","format":"{format}"}}"#
                    )))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let created: serde_json::Value = json_body(response).await;
        let id: TaskId = created["id"].as_str().unwrap().parse().unwrap();
        assert_eq!(
            wait_for_terminal(&self.manager, id).await,
            TaskStatus::Finished
        );
        id
    }
}

async fn body_bytes(response: Response) -> axum::body::Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
    response
        .headers()
        .get(name)
        .unwrap()
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_api_server_spawns_and_stops_on_shutdown() {
    let (manager, _clock, _temp_dir) = create_test_manager_with(FakeBehavior::Succeed("x"), |c| {
        c.server.bind_address = "127.0.0.1:0".parse().unwrap();
    });

    let handle = manager.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;
    manager.shutdown();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let app = TestApp::new(FakeBehavior::Succeed("x"));

    let response = app
        .send(
            Request::get("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let app = TestApp::with_config(FakeBehavior::Succeed("x"), |c| {
        c.server.cors_enabled = false;
    });

    let response = app
        .send(
            Request::get("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let app = TestApp::with_config(FakeBehavior::Succeed("x"), |c| {
        c.server.cors_origins = vec!["http://allowed.example".to_string()];
    });

    let response = app
        .send(
            Request::get("/health")
                .header("Origin", "http://allowed.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(
        header_str(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN),
        "http://allowed.example"
    );
}
