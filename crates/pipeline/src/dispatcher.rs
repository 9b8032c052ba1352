//! Background task dispatcher.
//!
//! A single long-lived Tokio task that drains the [`TaskReceiver`] one task
//! at a time and delivers each to the [`Processor`], retrying transient
//! failures on a fixed backoff. Every wait (dequeue, outbound request,
//! backoff) selects on the cancellation token, so shutdown never has to
//! wait out a full backoff interval.

use std::sync::Arc;

use taskrelay_core::status::TaskStatus;
use taskrelay_core::task::Task;
use taskrelay_processing::{Outcome, Processor};
use tokio_util::sync::CancellationToken;

use crate::queue::TaskReceiver;
use crate::retry::RetryPolicy;
use crate::store::StatusStore;

/// Counters returned when the dispatcher loop exits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Tasks that reached `completed`.
    pub completed: usize,
    /// Tasks that reached `failed`.
    pub failed: usize,
    /// Tasks abandoned mid-delivery by cancellation; they keep their last
    /// status (`processing`).
    pub interrupted: usize,
    /// Tasks still queued at shutdown; they keep `queued`.
    pub abandoned: usize,
}

/// How delivery of a single task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Completed { attempts: u32 },
    Failed { attempts: u32 },
    Interrupted { attempts: u32 },
}

/// Serial worker between the queue and the processing service.
pub struct Dispatcher<P> {
    receiver: TaskReceiver,
    courier: Courier<P>,
}

/// Delivery half of the dispatcher: everything except the queue.
struct Courier<P> {
    store: Arc<StatusStore>,
    processor: P,
    policy: RetryPolicy,
}

impl<P: Processor> Dispatcher<P> {
    pub fn new(
        receiver: TaskReceiver,
        store: Arc<StatusStore>,
        processor: P,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            receiver,
            courier: Courier {
                store,
                processor,
                policy,
            },
        }
    }

    /// Run the dispatcher loop until the cancellation token is triggered or
    /// every producer handle has been dropped.
    pub async fn run(mut self, cancel: CancellationToken) -> DispatchReport {
        let courier = &self.courier;
        tracing::info!(
            max_attempts = courier.policy.max_attempts,
            backoff_ms = courier.policy.backoff.as_millis() as u64,
            "Task dispatcher started",
        );

        let mut report = DispatchReport::default();

        while let Some(task) = self.receiver.dequeue(&cancel).await {
            let queued_ms = (chrono::Utc::now() - task.created_at).num_milliseconds();
            tracing::info!(task_id = %task.id, file = %task.file, queued_ms, "Task dequeued");

            match courier.deliver(&task, &cancel).await {
                Delivery::Completed { attempts } => {
                    courier.store.set_status(&task.id, TaskStatus::Completed).await;
                    report.completed += 1;
                    tracing::info!(task_id = %task.id, attempts, "Task completed");
                }
                Delivery::Failed { attempts } => {
                    courier.store.set_status(&task.id, TaskStatus::Failed).await;
                    report.failed += 1;
                    tracing::error!(task_id = %task.id, attempts, "Task failed");
                }
                Delivery::Interrupted { attempts } => {
                    report.interrupted += 1;
                    tracing::warn!(
                        task_id = %task.id,
                        attempts,
                        "Shutdown interrupted delivery; task keeps its last status",
                    );
                    break;
                }
            }
        }

        report.abandoned = self.receiver.drain();
        if report.abandoned > 0 {
            tracing::warn!(abandoned = report.abandoned, "Tasks left queued at shutdown");
        }

        tracing::info!(
            completed = report.completed,
            failed = report.failed,
            interrupted = report.interrupted,
            abandoned = report.abandoned,
            "Task dispatcher stopped",
        );
        report
    }
}

impl<P: Processor> Courier<P> {
    /// Attempt delivery up to `max_attempts` times.
    async fn deliver(&self, task: &Task, cancel: &CancellationToken) -> Delivery {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            self.store.set_status(&task.id, TaskStatus::Processing).await;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Delivery::Interrupted { attempts: attempt },
                outcome = self.processor.process(task) => outcome,
            };

            match outcome {
                Outcome::Success => return Delivery::Completed { attempts: attempt },
                Outcome::TerminalFailure(e) => {
                    tracing::warn!(task_id = %task.id, attempt, error = %e, "Non-retryable failure");
                    return Delivery::Failed { attempts: attempt };
                }
                Outcome::RetryableFailure(e) => {
                    if !self.policy.should_retry(attempt) {
                        tracing::warn!(
                            task_id = %task.id,
                            attempt,
                            error = %e,
                            "Delivery attempts exhausted",
                        );
                        return Delivery::Failed { attempts: attempt };
                    }

                    tracing::info!(
                        task_id = %task.id,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Retrying task ({attempt}/{max_attempts})",
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Delivery::Interrupted { attempts: attempt },
                        _ = tokio::time::sleep(self.policy.backoff) => {}
                    }
                }
            }
        }

        Delivery::Failed {
            attempts: max_attempts,
        }
    }
}
