//! Concurrent task id -> status table.
//!
//! Thread-safe via an interior `RwLock`; designed to be wrapped in `Arc`
//! and shared between intake handlers (initial `queued` write) and the
//! dispatcher (every later write). Entries are never expired.

use std::collections::HashMap;

use taskrelay_core::status::TaskStatus;
use taskrelay_core::task::TaskId;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct StatusStore {
    statuses: RwLock<HashMap<TaskId, TaskStatus>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the status of `id` (last write wins).
    ///
    /// A transition that moves backwards is still applied but logged, since
    /// only the dispatcher writes after intake and it only moves forward.
    pub async fn set_status(&self, id: &TaskId, status: TaskStatus) {
        let previous = self.statuses.write().await.insert(id.clone(), status);

        match previous {
            Some(prev) if !prev.can_transition_to(status) => {
                tracing::warn!(task_id = %id, from = %prev, to = %status, "Unexpected status transition");
            }
            _ => {
                tracing::debug!(task_id = %id, status = %status, "Task status updated");
            }
        }
    }

    /// Current status, or `None` if the id was never accepted.
    pub async fn get_status(&self, id: &TaskId) -> Option<TaskStatus> {
        self.statuses.read().await.get(id).copied()
    }

    /// Number of tracked tasks.
    pub async fn len(&self) -> usize {
        self.statuses.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.statuses.read().await.is_empty()
    }

    /// Record a task as `queued` in one map operation.
    pub(crate) async fn insert_queued(&self, id: &TaskId) {
        self.statuses
            .write()
            .await
            .insert(id.clone(), TaskStatus::Queued);
    }

    /// Remove the entry for a task whose enqueue was rejected.
    pub(crate) async fn discard(&self, id: &TaskId) {
        self.statuses.write().await.remove(id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
