//! Storage for uploaded task payloads.
//!
//! Each upload is written once as `upload-<task id>.<ext>` under a single
//! directory; the processing service reads it by path.

use std::path::{Path, PathBuf};

use taskrelay_core::task::TaskId;

/// Extension used when the client's file name has none we accept.
const FALLBACK_EXTENSION: &str = "bin";

/// Longest extension kept from the client's file name.
const MAX_EXTENSION_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `data` for task `id`, keeping the extension of `original_name`.
    pub async fn save(
        &self,
        id: &TaskId,
        original_name: &str,
        data: &[u8],
    ) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self
            .dir
            .join(format!("upload-{id}.{}", sanitized_extension(original_name)));
        tokio::fs::write(&path, data).await?;

        tracing::debug!(task_id = %id, path = %path.display(), bytes = data.len(), "Upload stored");
        Ok(path)
    }

    /// Delete a stored upload. Failures are logged, not returned.
    pub async fn remove(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove upload");
        }
    }
}

/// Lowercased extension of `name` if it is short and alphanumeric.
fn sanitized_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
