//! Scripted processor shared by the pipeline integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use taskrelay_core::status::TaskStatus;
use taskrelay_core::task::{Task, TaskId};
use taskrelay_pipeline::StatusStore;
use taskrelay_processing::{Outcome, ProcessingError, Processor};

/// What the fake service does on one attempt.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Ok,
    /// Respond with this retryable HTTP status.
    Retry(u16),
    /// Respond with this non-retryable HTTP status.
    Reject(u16),
    /// Never respond.
    Hang,
}

/// One recorded call: which task, and the status the store held at the time.
#[derive(Debug, Clone)]
pub struct Call {
    pub task_id: TaskId,
    pub status_seen: Option<TaskStatus>,
}

/// Plays back `script` one step per call, then answers `fallback` forever.
#[derive(Clone)]
pub struct ScriptedProcessor {
    script: Arc<Mutex<VecDeque<Step>>>,
    fallback: Step,
    calls: Arc<Mutex<Vec<Call>>>,
    store: Option<Arc<StatusStore>>,
}

impl ScriptedProcessor {
    pub fn new(script: impl IntoIterator<Item = Step>, fallback: Step) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            fallback,
            calls: Arc::new(Mutex::new(Vec::new())),
            store: None,
        }
    }

    pub fn always(step: Step) -> Self {
        Self::new([], step)
    }

    /// Record the status the store holds for each task when it is attempted.
    pub fn observing(mut self, store: Arc<StatusStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn attempts_for(&self, id: &TaskId) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| &c.task_id == id)
            .count()
    }
}

#[async_trait]
impl Processor for ScriptedProcessor {
    async fn process(&self, task: &Task) -> Outcome {
        let status_seen = match &self.store {
            Some(store) => store.get_status(&task.id).await,
            None => None,
        };
        self.calls.lock().unwrap().push(Call {
            task_id: task.id.clone(),
            status_seen,
        });

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        match step {
            Step::Ok => Outcome::Success,
            Step::Retry(status) => Outcome::RetryableFailure(ProcessingError::HttpStatus {
                status,
                body: String::new(),
            }),
            Step::Reject(status) => Outcome::TerminalFailure(ProcessingError::HttpStatus {
                status,
                body: String::new(),
            }),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Outcome::Success
            }
        }
    }
}

/// Poll until `id` reaches a terminal status or `timeout` elapses.
pub async fn wait_for_terminal(
    store: &StatusStore,
    id: &TaskId,
    timeout: Duration,
) -> Option<TaskStatus> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let status = store.get_status(id).await;
        if status.is_some_and(TaskStatus::is_terminal) {
            return status;
        }
        if tokio::time::Instant::now() >= deadline {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
