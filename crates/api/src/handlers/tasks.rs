//! Task intake and status lookup.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use taskrelay_core::error::CoreError;
use taskrelay_core::status::TaskStatus;
use taskrelay_core::task::{Task, TaskId};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Body of a `202 Accepted` response.
#[derive(Debug, Serialize)]
pub struct TaskAccepted {
    pub id: TaskId,
    pub file: String,
}

impl From<&Task> for TaskAccepted {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            file: task.file.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: TaskStatus,
}

/// POST /tasks
///
/// Accepts a multipart form with a `file` field, stores the file and
/// queues a task that references it. Returns 202 with `{"id", "file"}`.
/// A full or closed queue is reported as 503 and the stored file is
/// removed again.
pub async fn create(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<TaskAccepted>)> {
    let mut multipart = multipart?;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let data = field.bytes().await?;
            upload = Some((filename, data));
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    let id = TaskId::generate();
    let path = state
        .uploads
        .save(&id, &filename, &data)
        .await
        .map_err(|e| AppError::InternalError(format!("Unable to save file: {e}")))?;

    let task = Task::with_id(id, path.to_string_lossy());
    let accepted = TaskAccepted::from(&task);

    if let Err(e) = state.pipeline.submit(task).await {
        state.uploads.remove(&path).await;
        return Err(e.into());
    }

    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// GET /status?id=<id>
///
/// Returns the task's current status, 404 for unknown ids.
pub async fn status(
    State(state): State<AppState>,
    params: Result<Query<StatusParams>, QueryRejection>,
) -> AppResult<Json<StatusResponse>> {
    let Query(params) = params?;
    let id = params
        .id
        .filter(|id| !id.is_empty())
        .map(TaskId::from)
        .ok_or_else(|| AppError::BadRequest("Missing required 'id' query parameter".into()))?;

    let status = state
        .pipeline
        .status(&id)
        .await
        .ok_or_else(|| CoreError::NotFound {
            entity: "Task",
            id: id.to_string(),
        })?;

    Ok(Json(StatusResponse { status }))
}
