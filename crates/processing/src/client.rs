//! HTTP client for the processing service.
//!
//! Each attempt is a single `POST <url>` with a JSON body of
//! `{"id": ..., "file": ...}`. The client keeps no per-task state.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use taskrelay_core::task::Task;

use crate::outcome::{Classification, Outcome, ProcessingError};
use crate::Processor;

/// Default HTTP timeout for a single delivery attempt.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound request body.
#[derive(Debug, Serialize)]
pub struct ProcessRequest<'a> {
    pub id: &'a str,
    pub file: &'a str,
}

impl<'a> From<&'a Task> for ProcessRequest<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: task.id.as_str(),
            file: &task.file,
        }
    }
}

/// Delivers tasks to a processing service endpoint.
#[derive(Debug, Clone)]
pub struct ProcessingClient {
    client: reqwest::Client,
    url: String,
    classification: Classification,
}

impl ProcessingClient {
    /// Create a client for `url` with a per-request `timeout`.
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        classification: Classification,
    ) -> Result<Self, ProcessingError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url, classification))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        url: impl Into<String>,
        classification: Classification,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            classification,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Execute one POST and classify the result.
    async fn send(&self, task: &Task) -> Outcome {
        let response = match self
            .client
            .post(&self.url)
            .json(&ProcessRequest::from(task))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return self.classification.classify_transport(e),
        };

        let status = response.status();
        if status.is_success() {
            return Outcome::Success;
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        self.classification.classify_status(status, body)
    }
}

#[async_trait]
impl Processor for ProcessingClient {
    async fn process(&self, task: &Task) -> Outcome {
        let outcome = self.send(task).await;
        match &outcome {
            Outcome::Success => {
                tracing::debug!(task_id = %task.id, url = %self.url, "Processing service accepted task");
            }
            Outcome::RetryableFailure(e) => {
                tracing::warn!(task_id = %task.id, url = %self.url, error = %e, "Retryable delivery failure");
            }
            Outcome::TerminalFailure(e) => {
                tracing::warn!(task_id = %task.id, url = %self.url, error = %e, "Terminal delivery failure");
            }
        }
        outcome
    }
}
