use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use taskrelay_pipeline::queue::DEFAULT_CAPACITY;
use taskrelay_pipeline::retry::{DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS};
use taskrelay_pipeline::RetryPolicy;
use taskrelay_processing::Classification;

/// Default multipart upload limit: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 << 20;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("Invalid CORS origin '{0}'")]
    CorsOrigin(String),
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: IpAddr,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<HeaderValue>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for the dispatcher after shutdown starts (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Processing service endpoint.
    pub processing_url: String,
    /// Per-attempt HTTP timeout for the processing service, in seconds.
    pub processing_timeout_secs: u64,
    /// Task queue capacity (default: `100`).
    pub queue_capacity: usize,
    /// Delivery attempts per task, first one included (default: `3`).
    pub max_attempts: u32,
    /// Wait between delivery attempts in milliseconds (default: `2000`).
    pub retry_backoff_ms: u64,
    /// Retry 4xx responses like any other failure (default: `true`).
    pub retry_client_errors: bool,
    /// Where uploaded payloads are stored (default: system temp dir).
    pub upload_dir: PathBuf,
    /// Maximum multipart request body size in bytes.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                         |
    /// |---------------------------|---------------------------------|
    /// | `HOST`                    | `0.0.0.0`                       |
    /// | `PORT`                    | `8080`                          |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`         |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                            |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`                            |
    /// | `PROCESSING_URL`          | `http://localhost:8081/process` |
    /// | `PROCESSING_TIMEOUT_SECS` | `30`                            |
    /// | `QUEUE_CAPACITY`          | `100`                           |
    /// | `MAX_ATTEMPTS`            | `3`                             |
    /// | `RETRY_BACKOFF_MS`        | `2000`                          |
    /// | `RETRY_CLIENT_ERRORS`     | `true`                          |
    /// | `UPLOAD_DIR`              | system temp dir                 |
    /// | `MAX_UPLOAD_BYTES`        | `10485760`                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source(lookup);

        let cors_origins = source
            .string("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .map_err(|_| ConfigError::CorsOrigin(origin.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let queue_capacity: usize = source.parse("QUEUE_CAPACITY", DEFAULT_CAPACITY)?;
        if queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "QUEUE_CAPACITY",
                value: "0".into(),
            });
        }

        Ok(Self {
            host: source.parse("HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: source.parse("PORT", 8080)?,
            cors_origins,
            request_timeout_secs: source.parse("REQUEST_TIMEOUT_SECS", 30)?,
            shutdown_timeout_secs: source.parse("SHUTDOWN_TIMEOUT_SECS", 30)?,
            processing_url: source.string("PROCESSING_URL", "http://localhost:8081/process"),
            processing_timeout_secs: source.parse("PROCESSING_TIMEOUT_SECS", 30)?,
            queue_capacity,
            max_attempts: source.parse("MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            retry_backoff_ms: source
                .parse("RETRY_BACKOFF_MS", DEFAULT_BACKOFF.as_millis() as u64)?,
            retry_client_errors: source.parse("RETRY_CLIENT_ERRORS", true)?,
            upload_dir: source
                .get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            max_upload_bytes: source.parse("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.retry_backoff_ms),
        )
    }

    pub fn classification(&self) -> Classification {
        if self.retry_client_errors {
            Classification::Uniform
        } else {
            Classification::ByStatusCode
        }
    }

    pub fn processing_timeout(&self) -> Duration {
        Duration::from_secs(self.processing_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Typed access to a key lookup.
struct Source<F>(F);

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
