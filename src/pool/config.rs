//! Worker pool configuration

use crate::core::{Result, ThreadError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`WorkerPool`](super::WorkerPool)
///
/// Loadable from any serde format; `poll_interval` is written as
/// `poll_interval_ms`. Missing fields take their defaults.
///
/// ```rust
/// use rust_bounded_queue::pool::WorkerPoolConfig;
///
/// let config: WorkerPoolConfig =
///     serde_json::from_str(r#"{"worker_count": 2, "poll_interval_ms": 20}"#).unwrap();
/// assert_eq!(config.worker_count, 2);
/// assert_eq!(config.thread_name_prefix, "worker");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of worker threads. Must be at least 1.
    pub worker_count: usize,
    /// Thread name prefix; workers are named `<prefix>-<id>`
    pub thread_name_prefix: String,
    /// How long an idle worker waits on the task queue before it re-checks
    /// the stop flag.
    ///
    /// Shorter intervals make workers notice the stop flag sooner at the
    /// cost of more wakeups while idle.
    #[serde(rename = "poll_interval_ms", with = "duration_millis")]
    pub poll_interval: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            thread_name_prefix: "worker".to_string(),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl WorkerPoolConfig {
    /// Create a configuration with `worker_count` workers
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Default::default()
        }
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the worker poll interval. Must be non-zero; checked by
    /// [`validate`](Self::validate).
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(ThreadError::invalid_config(
                "worker_count",
                "Worker count must be at least 1",
            ));
        }

        if self.thread_name_prefix.is_empty() {
            return Err(ThreadError::invalid_config(
                "thread_name_prefix",
                "Thread name prefix cannot be empty",
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(ThreadError::invalid_config(
                "poll_interval",
                "Poll interval must be non-zero",
            ));
        }

        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
