use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors returned by the processing endpoint.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The referenced file does not exist or cannot be read.
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            WorkerError::FileNotFound(_) => (StatusCode::UNPROCESSABLE_ENTITY, "FILE_NOT_FOUND"),
            WorkerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        };

        let body = json!({
            "error": self.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
