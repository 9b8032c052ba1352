//! Supervised dispatcher lifecycle.
//!
//! [`ShutdownCoordinator::start`] spawns the dispatcher as a tracked Tokio
//! task. A [`ShutdownTrigger`] closes intake and cancels the token;
//! [`ShutdownCoordinator::wait`] then joins the task so the process only
//! exits after the dispatcher has returned.

use std::time::Duration;

use taskrelay_processing::Processor;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::Pipeline;

#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    /// The dispatcher did not return within the allotted time.
    #[error("Dispatcher did not stop within {0:?}")]
    TimedOut(Duration),

    /// The dispatcher task panicked.
    #[error("Dispatcher task panicked: {0}")]
    Panicked(#[from] tokio::task::JoinError),
}

/// Cloneable handle that starts shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    cancel: CancellationToken,
    pipeline: Pipeline,
}

impl ShutdownTrigger {
    /// Close intake, then signal cancellation to the dispatcher.
    /// Calling it more than once is harmless.
    pub fn fire(&self) {
        self.pipeline.close_intake();
        self.cancel.cancel();
    }

    pub fn is_fired(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Owns the running dispatcher task.
pub struct ShutdownCoordinator {
    trigger: ShutdownTrigger,
    handle: JoinHandle<DispatchReport>,
}

impl ShutdownCoordinator {
    /// Spawn `dispatcher` on the current runtime.
    pub fn start<P>(pipeline: Pipeline, dispatcher: Dispatcher<P>) -> Self
    where
        P: Processor + 'static,
    {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(dispatcher.run(cancel.clone()));

        Self {
            trigger: ShutdownTrigger { cancel, pipeline },
            handle,
        }
    }

    pub fn trigger(&self) -> ShutdownTrigger {
        self.trigger.clone()
    }

    /// Fire the trigger (if nobody has yet) and wait for the dispatcher to
    /// return.
    ///
    /// On timeout the dispatcher task is aborted.
    pub async fn wait(self, timeout: Duration) -> Result<DispatchReport, ShutdownError> {
        self.trigger.fire();

        let mut handle = self.handle;
        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(joined) => Ok(joined?),
            Err(_) => {
                handle.abort();
                Err(ShutdownError::TimedOut(timeout))
            }
        }
    }
}
