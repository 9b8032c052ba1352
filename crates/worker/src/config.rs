use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// Errors raised while reading worker configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Bind address (default: `127.0.0.1`).
    pub host: IpAddr,
    /// Bind port (default: `8081`).
    pub port: u16,
    /// Simulated processing time per request, in milliseconds (default: `2000`).
    pub process_delay_ms: u64,
}

impl WorkerConfig {
    /// Load configuration from `WORKER_HOST`, `WORKER_PORT` and
    /// `PROCESS_DELAY_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: parse(&lookup, "WORKER_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse(&lookup, "WORKER_PORT", 8081)?,
            process_delay_ms: parse(&lookup, "PROCESS_DELAY_MS", 2000)?,
        })
    }

    pub fn process_delay(&self) -> Duration {
        Duration::from_millis(self.process_delay_ms)
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
