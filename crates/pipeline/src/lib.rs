//! Task dispatch pipeline: bounded queue, status table, serial dispatcher
//! with retries, and the shutdown coordinator that supervises it.
//!
//! [`Pipeline`] is the producer-side context handed to intake handlers. The
//! matching [`queue::TaskReceiver`] goes to the [`dispatcher::Dispatcher`].

pub mod dispatcher;
pub mod queue;
pub mod retry;
pub mod shutdown;
pub mod store;

use std::sync::Arc;

use taskrelay_core::status::TaskStatus;
use taskrelay_core::task::{Task, TaskId};

pub use dispatcher::{DispatchReport, Dispatcher};
pub use queue::{QueueError, TaskQueue, TaskReceiver};
pub use retry::RetryPolicy;
pub use shutdown::{ShutdownCoordinator, ShutdownError, ShutdownTrigger};
pub use store::StatusStore;

/// Producer-side handle: queue plus status table.
///
/// This is cheaply cloneable (the queue sender and the store are shared).
#[derive(Debug, Clone)]
pub struct Pipeline {
    queue: TaskQueue,
    store: Arc<StatusStore>,
}

impl Pipeline {
    /// Create a pipeline with a queue of `capacity` and an empty store.
    pub fn new(capacity: usize) -> (Pipeline, TaskReceiver) {
        let (queue, receiver) = TaskQueue::bounded(capacity);
        let pipeline = Pipeline {
            queue,
            store: Arc::new(StatusStore::new()),
        };
        (pipeline, receiver)
    }

    /// Accept a task for dispatch.
    ///
    /// `queued` is recorded before the task becomes visible to the
    /// dispatcher, so it can never overwrite a later `processing`. A
    /// rejected task has its entry removed and leaves no trace in the store.
    pub async fn submit(&self, task: Task) -> Result<(), QueueError> {
        let id = task.id.clone();
        self.store.insert_queued(&id).await;

        if let Err(e) = self.queue.enqueue(task) {
            self.store.discard(&id).await;
            tracing::warn!(task_id = %id, error = %e, "Task rejected at intake");
            return Err(e);
        }

        tracing::info!(task_id = %id, queue_len = self.queue.len(), "Task queued");
        Ok(())
    }

    /// Current status of a task, `None` if unknown.
    pub async fn status(&self, id: &TaskId) -> Option<TaskStatus> {
        self.store.get_status(id).await
    }

    /// Reject every later [`submit`](Self::submit).
    pub fn close_intake(&self) {
        if !self.queue.is_closed() {
            tracing::info!("Closing task intake");
        }
        self.queue.close();
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Shared status table, for wiring into the dispatcher.
    pub fn store(&self) -> Arc<StatusStore> {
        Arc::clone(&self.store)
    }
}
