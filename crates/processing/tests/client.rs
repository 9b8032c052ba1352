//! Integration tests for `ProcessingClient` against a local axum server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use taskrelay_core::task::Task;
use taskrelay_processing::{Classification, Outcome, ProcessingClient, ProcessingError, Processor};

/// Requests seen by the fake service, plus the status it should answer with.
#[derive(Clone)]
struct FakeService {
    received: Arc<Mutex<Vec<serde_json::Value>>>,
    reply: StatusCode,
}

async fn process(
    State(service): State<FakeService>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, &'static str) {
    service.received.lock().unwrap().push(body);
    (service.reply, "fake reply")
}

/// Serve the fake on an ephemeral port and return its `/process` URL.
async fn spawn_service(reply: StatusCode) -> (String, FakeService) {
    let service = FakeService {
        received: Arc::new(Mutex::new(Vec::new())),
        reply,
    };
    let app = Router::new()
        .route("/process", post(process))
        .with_state(service.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/process"), service)
}

fn client(url: &str, classification: Classification) -> ProcessingClient {
    ProcessingClient::new(url, Duration::from_secs(5), classification).unwrap()
}

// ---------------------------------------------------------------------------
// Test: 200 is success and the body carries id + file
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ok_response_is_success_and_sends_task_json() {
    let (url, service) = spawn_service(StatusCode::OK).await;
    let task = Task::new("/tmp/upload-42.jpg");

    let outcome = client(&url, Classification::Uniform).process(&task).await;
    assert_matches!(outcome, Outcome::Success);

    let received = service.received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["id"], task.id.as_str());
    assert_eq!(received[0]["file"], "/tmp/upload-42.jpg");
}

// ---------------------------------------------------------------------------
// Test: 500 is retryable and keeps the response body
// ---------------------------------------------------------------------------

#[tokio::test]
async fn server_error_is_retryable() {
    let (url, _service) = spawn_service(StatusCode::INTERNAL_SERVER_ERROR).await;

    let outcome = client(&url, Classification::Uniform)
        .process(&Task::new("/tmp/a"))
        .await;

    assert_matches!(
        outcome,
        Outcome::RetryableFailure(ProcessingError::HttpStatus { status: 500, ref body })
            if body == "fake reply"
    );
}

// ---------------------------------------------------------------------------
// Test: 4xx depends on the classification policy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn client_error_classification_follows_policy() {
    let (url, _service) = spawn_service(StatusCode::UNPROCESSABLE_ENTITY).await;
    let task = Task::new("/tmp/missing");

    assert_matches!(
        client(&url, Classification::Uniform).process(&task).await,
        Outcome::RetryableFailure(_)
    );
    assert_matches!(
        client(&url, Classification::ByStatusCode).process(&task).await,
        Outcome::TerminalFailure(_)
    );
}

// ---------------------------------------------------------------------------
// Test: connection refused is a retryable transport error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connection_refused_is_retryable() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let outcome = client(&format!("http://{addr}/process"), Classification::ByStatusCode)
        .process(&Task::new("/tmp/a"))
        .await;

    assert_matches!(outcome, Outcome::RetryableFailure(ProcessingError::Request(_)));
}
