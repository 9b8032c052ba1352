//! The unit of work accepted at intake and delivered by the dispatcher.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Unique task identifier.
///
/// Generated from a UUIDv7, so ids are time-ordered and collision
/// resistant without any coordination. Uniqueness is assumed from the
/// generator and not checked anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A queued unit of work: an identifier plus a reference to the payload
/// the processing service should read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    /// Path of the stored payload.
    pub file: String,
    /// When the task was created at intake.
    pub created_at: Timestamp,
}

impl Task {
    /// Create a task for `file` with a newly generated id.
    pub fn new(file: impl Into<String>) -> Self {
        Self::with_id(TaskId::generate(), file)
    }

    /// Create a task with a caller-chosen id. Intake uses this when the id
    /// must be known before the payload is stored.
    pub fn with_id(id: TaskId, file: impl Into<String>) -> Self {
        Self {
            id,
            file: file.into(),
            created_at: chrono::Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
