//! Custom test assertions for integration tests

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use listentube::{TaskId, TaskStatus, TaskView};
use std::time::Duration;
use tower::ServiceExt;

/// Send a request through the router
pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

/// GET `uri`
pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    send(
        router,
        Request::get(uri)
            .body(Body::empty())
            .expect("valid request"),
    )
    .await
}

/// Collect a response body
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
}

/// Poll `GET /tasks/:id` until the status leaves queued/downloading
///
/// Panics when `timeout` elapses first.
pub async fn wait_for_terminal(router: &Router, id: TaskId, timeout: Duration) -> TaskView {
    let polled = tokio::time::timeout(timeout, async {
        loop {
            let response = get(router, &format!("/tasks/{id}")).await;
            let view: TaskView =
                serde_json::from_slice(&body_bytes(response).await).expect("task view JSON");
            if !matches!(view.status, TaskStatus::Queued | TaskStatus::Downloading) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    polled.unwrap_or_else(|_| panic!("task {id} did not finish within {timeout:?}"))
}
