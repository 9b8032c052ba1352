use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at the root:
///
/// ```text
/// POST /tasks          submit a file for processing
/// GET  /status?id=     task status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(tasks::create))
        .route("/status", get(tasks::status))
}
