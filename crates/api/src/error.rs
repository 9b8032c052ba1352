use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use taskrelay_core::error::CoreError;
use taskrelay_pipeline::QueueError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `taskrelay_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The task queue refused the submission.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The multipart body could not be read.
    #[error("Unable to parse form: {0}")]
    Multipart(#[from] MultipartError),

    /// The request is not `multipart/form-data`.
    #[error("Invalid form: {0}")]
    MultipartRejection(#[from] MultipartRejection),

    /// The query string could not be deserialized.
    #[error("Invalid query: {0}")]
    QueryRejection(#[from] QueryRejection),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Queue rejections ---
            AppError::Queue(QueueError::Full { .. }) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "QUEUE_FULL",
                "Task queue is full, try again later".to_string(),
            ),
            AppError::Queue(QueueError::Closed) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SHUTTING_DOWN",
                "Server is shutting down and not accepting tasks".to_string(),
            ),

            // --- HTTP-specific errors ---
            AppError::Multipart(err) => {
                let status = err.status();
                let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "PAYLOAD_TOO_LARGE"
                } else {
                    "BAD_REQUEST"
                };
                (status, code, format!("Unable to parse form: {}", err.body_text()))
            }
            AppError::MultipartRejection(rejection) => {
                (rejection.status(), "BAD_REQUEST", rejection.body_text())
            }
            AppError::QueryRejection(rejection) => {
                (rejection.status(), "BAD_REQUEST", rejection.body_text())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
