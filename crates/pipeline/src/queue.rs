//! Bounded FIFO between intake and the dispatcher.
//!
//! Producers never wait: a full queue rejects the task with
//! [`QueueError::Full`] so the caller can report it. The single consumer
//! waits in [`TaskReceiver::dequeue`] until a task arrives or the
//! cancellation token fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use taskrelay_core::task::Task;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Default queue capacity.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The queue is at capacity.
    #[error("Task queue is full (capacity {capacity})")]
    Full { capacity: usize },

    /// Intake has been closed for shutdown, or the dispatcher is gone.
    #[error("Task queue is closed")]
    Closed,
}

/// Producer half. Cheap to clone; one per request handler.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    sender: mpsc::Sender<Task>,
    closed: Arc<AtomicBool>,
    capacity: usize,
}

/// Consumer half, owned by the dispatcher.
#[derive(Debug)]
pub struct TaskReceiver {
    receiver: mpsc::Receiver<Task>,
}

impl TaskQueue {
    /// Create a queue holding at most `capacity` tasks.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn bounded(capacity: usize) -> (TaskQueue, TaskReceiver) {
        let (sender, receiver) = mpsc::channel(capacity);
        let queue = TaskQueue {
            sender,
            closed: Arc::new(AtomicBool::new(false)),
            capacity,
        };
        (queue, TaskReceiver { receiver })
    }

    /// Append a task without waiting.
    ///
    /// On rejection the task is dropped; the caller still holds everything
    /// it needs to report the failure.
    pub fn enqueue(&self, task: Task) -> Result<(), QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }

        self.sender.try_send(task).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full {
                capacity: self.capacity,
            },
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    /// Stop accepting tasks. Already queued tasks stay in the buffer.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tasks currently waiting.
    pub fn len(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TaskReceiver {
    /// Wait for the next task in FIFO order.
    ///
    /// Returns `None` once `cancel` fires or every producer has been
    /// dropped. Cancellation wins over a task that is already available.
    pub async fn dequeue(&mut self, cancel: &CancellationToken) -> Option<Task> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            task = self.receiver.recv() => task,
        }
    }

    /// Close the channel and discard whatever is still buffered.
    ///
    /// Returns the number of discarded tasks.
    pub fn drain(&mut self) -> usize {
        self.receiver.close();
        let mut count = 0;
        while self.receiver.try_recv().is_ok() {
            count += 1;
        }
        count
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn dequeues_in_fifo_order() {
        let (queue, mut receiver) = TaskQueue::bounded(8);
        let cancel = CancellationToken::new();

        let tasks: Vec<Task> = (0..5).map(|i| Task::new(format!("/tmp/{i}"))).collect();
        for task in &tasks {
            queue.enqueue(task.clone()).unwrap();
        }

        for expected in &tasks {
            let got = receiver.dequeue(&cancel).await.unwrap();
            assert_eq!(got.id, expected.id);
        }
    }

    #[tokio::test]
    async fn rejects_when_full() {
        let (queue, _receiver) = TaskQueue::bounded(2);

        queue.enqueue(Task::new("a")).unwrap();
        queue.enqueue(Task::new("b")).unwrap();
        assert_eq!(queue.len(), 2);

        assert_matches!(
            queue.enqueue(Task::new("c")),
            Err(QueueError::Full { capacity: 2 })
        );
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn rejects_after_close() {
        let (queue, _receiver) = TaskQueue::bounded(2);
        queue.close();

        assert!(queue.is_closed());
        assert_matches!(queue.enqueue(Task::new("a")), Err(QueueError::Closed));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn rejects_when_receiver_dropped() {
        let (queue, receiver) = TaskQueue::bounded(2);
        drop(receiver);

        assert_matches!(queue.enqueue(Task::new("a")), Err(QueueError::Closed));
    }

    #[tokio::test]
    async fn dequeue_returns_none_on_cancel() {
        let (_queue, mut receiver) = TaskQueue::bounded(2);
        let cancel = CancellationToken::new();

        let waiter = {
            let cancel = cancel.clone();
            tokio::spawn(async move { receiver.dequeue(&cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let got = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("dequeue did not observe cancellation")
            .unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn cancellation_wins_over_ready_task() {
        let (queue, mut receiver) = TaskQueue::bounded(2);
        let cancel = CancellationToken::new();

        queue.enqueue(Task::new("a")).unwrap();
        cancel.cancel();

        assert!(receiver.dequeue(&cancel).await.is_none());
    }

    #[tokio::test]
    async fn drain_counts_leftovers() {
        let (queue, mut receiver) = TaskQueue::bounded(4);
        queue.enqueue(Task::new("a")).unwrap();
        queue.enqueue(Task::new("b")).unwrap();

        assert_eq!(receiver.drain(), 2);
        assert_matches!(queue.enqueue(Task::new("c")), Err(QueueError::Closed));
    }
}
