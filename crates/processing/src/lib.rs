//! Client side of the remote processing service.
//!
//! The dispatcher only sees the [`Processor`] trait: one call per delivery
//! attempt, answered with an [`Outcome`]. [`client::ProcessingClient`] is
//! the HTTP implementation used in production.

pub mod client;
pub mod outcome;

use async_trait::async_trait;
use taskrelay_core::task::Task;

pub use client::ProcessingClient;
pub use outcome::{Classification, Outcome, ProcessingError};

/// Sends one task to the processing service and classifies the result.
///
/// Implementations must be stateless between calls: the dispatcher calls
/// `process` once per attempt and owns all retry decisions.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, task: &Task) -> Outcome;
}
