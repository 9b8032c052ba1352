//! Delivery outcomes and how failures are classified.

use reqwest::StatusCode;

/// Errors from a single delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    /// The HTTP request itself failed (connection refused, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The processing service returned a non-2xx status code.
    #[error("Processing service returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Result of one delivery attempt.
#[derive(Debug)]
pub enum Outcome {
    Success,
    /// Transient failure; the dispatcher may try again.
    RetryableFailure(ProcessingError),
    /// The task can never succeed; stop immediately.
    TerminalFailure(ProcessingError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// How non-success responses map onto [`Outcome`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Classification {
    /// Every non-2xx status and every transport error is retryable.
    #[default]
    Uniform,
    /// Client errors (4xx) are terminal, except 408 and 429. Server errors
    /// and transport errors stay retryable.
    ByStatusCode,
}

impl Classification {
    /// Classify a completed HTTP exchange.
    pub fn classify_status(self, status: StatusCode, body: String) -> Outcome {
        if status.is_success() {
            return Outcome::Success;
        }

        let err = ProcessingError::HttpStatus {
            status: status.as_u16(),
            body,
        };

        match self {
            Classification::Uniform => Outcome::RetryableFailure(err),
            Classification::ByStatusCode => {
                let retryable = status.is_server_error()
                    || status == StatusCode::REQUEST_TIMEOUT
                    || status == StatusCode::TOO_MANY_REQUESTS;
                if retryable {
                    Outcome::RetryableFailure(err)
                } else {
                    Outcome::TerminalFailure(err)
                }
            }
        }
    }

    /// Transport errors are retryable under every classification.
    pub fn classify_transport(self, err: reqwest::Error) -> Outcome {
        Outcome::RetryableFailure(ProcessingError::Request(err))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
