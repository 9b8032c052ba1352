//! Sample processing service.
//!
//! Receives `{"id", "file"}` deliveries from the dispatcher, checks that the
//! file exists, simulates work for a configured delay and reports how many
//! bytes it read.

pub mod config;
pub mod error;

use std::time::Duration;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::WorkerError;

#[derive(Debug, Clone)]
pub struct WorkerState {
    pub process_delay: Duration,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub id: String,
    pub file: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub id: String,
    pub file: String,
    pub bytes: u64,
}

/// Build the worker router: `POST /process` and `GET /health`.
pub fn build_router(state: WorkerState) -> Router {
    Router::new()
        .route("/process", post(process))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST /process
async fn process(
    State(state): State<WorkerState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>, WorkerError> {
    if request.id.is_empty() || request.file.is_empty() {
        return Err(WorkerError::BadRequest("'id' and 'file' are required".into()));
    }

    let metadata = match tokio::fs::metadata(&request.file).await {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => {
            tracing::warn!(task_id = %request.id, file = %request.file, "File not found");
            return Err(WorkerError::FileNotFound(request.file));
        }
    };

    tracing::info!(task_id = %request.id, file = %request.file, "Processing task");
    tokio::time::sleep(state.process_delay).await;
    tracing::info!(task_id = %request.id, bytes = metadata.len(), "Task processed");

    Ok(Json(ProcessResponse {
        id: request.id,
        file: request.file,
        bytes: metadata.len(),
    }))
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
