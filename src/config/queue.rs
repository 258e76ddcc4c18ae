//! Queue and worker-set configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`QueueConfig::size_limit`].
pub const ENV_SIZE_LIMIT: &str = "KEYED_QUEUE_SIZE_LIMIT";
/// Environment variable overriding [`QueueConfig::worker_count`].
pub const ENV_WORKERS: &str = "KEYED_QUEUE_WORKERS";
/// Environment variable overriding [`QueueConfig::shutdown_timeout_secs`].
pub const ENV_SHUTDOWN_TIMEOUT_SECS: &str = "KEYED_QUEUE_SHUTDOWN_TIMEOUT_SECS";

const DEFAULT_SIZE_LIMIT: usize = 1024;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum pending (not yet started) units before `put` blocks.
    pub size_limit: usize,
    /// Number of worker loops draining the queue.
    pub worker_count: usize,
    /// How long shutdown waits for worker loops to exit, in seconds.
    pub shutdown_timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            size_limit: DEFAULT_SIZE_LIMIT,
            worker_count: num_cpus::get(),
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

impl QueueConfig {
    /// Start from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pending-unit capacity.
    #[must_use]
    pub const fn with_size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Set the number of worker loops.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the shutdown timeout in seconds.
    #[must_use]
    pub const fn with_shutdown_timeout_secs(mut self, secs: u64) -> Self {
        self.shutdown_timeout_secs = secs;
        self
    }

    /// Shutdown timeout as a `Duration`.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.size_limit == 0 {
            return Err("size_limit must be greater than 0".into());
        }
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.shutdown_timeout_secs == 0 {
            return Err("shutdown_timeout_secs must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the environment (and a `.env` file, if any).
    ///
    /// Unset variables keep their default values.
    ///
    /// # Errors
    ///
    /// Returns a description of an unparsable variable or a validation failure.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns a description of an unparsable variable or a validation failure.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(value) = parse_var(&lookup, ENV_SIZE_LIMIT)? {
            cfg.size_limit = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_WORKERS)? {
            cfg.worker_count = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_SHUTDOWN_TIMEOUT_SECS)? {
            cfg.shutdown_timeout_secs = value;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| format!("{name}={raw:?} is invalid: {e}"))
        })
        .transpose()
}
