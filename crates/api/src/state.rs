use std::sync::Arc;

use taskrelay_pipeline::Pipeline;

use crate::config::ServerConfig;
use crate::uploads::UploadStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Producer side of the task pipeline (queue + status table).
    pub pipeline: Pipeline,
    /// Where uploaded payloads are written.
    pub uploads: Arc<UploadStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, config: ServerConfig) -> Self {
        Self {
            pipeline,
            uploads: Arc::new(UploadStore::new(config.upload_dir.clone())),
            config: Arc::new(config),
        }
    }
}
