//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::path::Path;

use axum::body::Body;
use axum::http::{HeaderValue, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use taskrelay_api::config::ServerConfig;
use taskrelay_api::router::build_app_router;
use taskrelay_api::state::AppState;
use taskrelay_pipeline::{Pipeline, TaskReceiver};

const BOUNDARY: &str = "taskrelay-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin and a small upload limit.
pub fn test_config(upload_dir: &Path, queue_capacity: usize) -> ServerConfig {
    ServerConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        cors_origins: vec![HeaderValue::from_static("http://localhost:5173")],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        processing_url: "http://127.0.0.1:9/process".to_string(),
        processing_timeout_secs: 1,
        queue_capacity,
        max_attempts: 3,
        retry_backoff_ms: 10,
        retry_client_errors: true,
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes: 64 * 1024,
    }
}

/// A router plus the pieces tests poke at directly.
///
/// No dispatcher runs unless a test spawns one with `receiver`, so
/// accepted tasks stay `queued`.
pub struct TestApp {
    pub app: Router,
    pub pipeline: Pipeline,
    pub receiver: Option<TaskReceiver>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn new(queue_capacity: usize) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let config = test_config(upload_dir.path(), queue_capacity);
        let (pipeline, receiver) = Pipeline::new(queue_capacity);
        let app = build_app_router(AppState::new(pipeline.clone(), config));

        Self {
            app,
            pipeline,
            receiver: Some(receiver),
            upload_dir,
        }
    }

    pub async fn get(&self, uri: &str) -> Response {
        get(self.app.clone(), uri).await
    }

    /// POST /tasks with a single file field.
    pub async fn submit(&self, filename: &str, data: &[u8]) -> Response {
        let request = multipart_request("/tasks", "file", filename, data);
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Number of files currently in the upload directory.
    pub fn stored_uploads(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count()
    }
}

/// Send a GET request through the router.
pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Build a `multipart/form-data` POST with one file field.
pub fn multipart_request(uri: &str, field: &str, filename: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
