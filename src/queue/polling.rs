//! Bounded queue that waits by polling with exponential backoff.
//!
//! This is the strategy to fall back on where condition variables are not
//! available. Blocked callers never sleep on the lock: they drop it, back off,
//! and try again. Waiting costs latency (up to the maximum sleep) and some CPU
//! during the spin phase, which is why [`BoundedQueue`](super::BoundedQueue)
//! is preferred everywhere else.

use super::ring::RingBuffer;
use super::{BlockingQueue, QueueError, QueueResult};
use crate::core::{Result, ThreadError};
use crossbeam_utils::Backoff;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

/// Backoff settings for [`PollingQueue`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// First sleep once spinning and yielding are exhausted.
    #[serde(with = "duration_micros")]
    pub initial_sleep: Duration,
    /// Upper bound on any single sleep.
    #[serde(with = "duration_micros")]
    pub max_sleep: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_sleep: Duration::from_micros(50),
            max_sleep: Duration::from_millis(10),
        }
    }
}

impl PollingConfig {
    /// Set the first sleep duration
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_initial_sleep(mut self, sleep: Duration) -> Self {
        self.initial_sleep = sleep;
        self
    }

    /// Set the sleep cap
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_sleep(mut self, sleep: Duration) -> Self {
        self.max_sleep = sleep;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.initial_sleep.is_zero() {
            return Err(ThreadError::invalid_config(
                "initial_sleep",
                "Initial sleep must be non-zero",
            ));
        }
        if self.max_sleep < self.initial_sleep {
            return Err(ThreadError::invalid_config(
                "max_sleep",
                "Maximum sleep must not be shorter than the initial sleep",
            ));
        }
        Ok(())
    }
}

mod duration_micros {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_micros() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_micros)
    }
}

/// One waiter's retry schedule: spin, then yield, then sleep with doubling,
/// jittered delays capped at `max_sleep`.
struct Retry<'a> {
    config: &'a PollingConfig,
    backoff: Backoff,
    sleep: Duration,
}

impl<'a> Retry<'a> {
    fn new(config: &'a PollingConfig) -> Self {
        Self {
            config,
            backoff: Backoff::new(),
            sleep: config.initial_sleep,
        }
    }

    fn wait(&mut self) {
        if !self.backoff.is_completed() {
            self.backoff.snooze();
            return;
        }
        // Up to 25% jitter so waiters that gave up together do not retry in
        // lockstep.
        let micros = self.sleep.as_micros() as u64;
        let jitter = fastrand::u64(0..=micros / 4);
        thread::sleep(Duration::from_micros(micros + jitter).min(self.config.max_sleep));
        self.sleep = (self.sleep * 2).min(self.config.max_sleep);
    }
}

/// A fixed-capacity FIFO queue whose blocking calls poll with backoff.
///
/// Same contract as [`BoundedQueue`](super::BoundedQueue): FIFO, never drops
/// or duplicates, status queries taken under the lock.
///
/// # Example
///
/// ```rust
/// use rust_bounded_queue::queue::{BlockingQueue, PollingConfig, PollingQueue};
///
/// let queue = PollingQueue::with_config(2, PollingConfig::default()).unwrap();
/// queue.put('x');
/// assert_eq!(queue.take(), 'x');
/// assert_eq!(queue.strategy(), "polling");
/// ```
pub struct PollingQueue<T> {
    ring: Mutex<RingBuffer<T>>,
    config: PollingConfig,
}

impl<T> PollingQueue<T> {
    /// Creates an empty queue with default backoff settings.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidCapacity`] if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(capacity, PollingConfig::default())
    }

    /// Creates an empty queue with explicit backoff settings.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidCapacity`] if `capacity` is 0, or
    /// [`ThreadError::InvalidConfig`] if `config` does not validate.
    pub fn with_config(capacity: usize, config: PollingConfig) -> Result<Self> {
        if capacity == 0 {
            return Err(ThreadError::invalid_capacity(capacity));
        }
        config.validate()?;
        Ok(Self {
            ring: Mutex::new(RingBuffer::new(capacity)),
            config,
        })
    }

    /// Backoff settings in use
    pub fn config(&self) -> &PollingConfig {
        &self.config
    }
}

impl<T: Send> BlockingQueue<T> for PollingQueue<T> {
    fn put(&self, item: T) {
        let mut retry = Retry::new(&self.config);
        let mut item = item;
        loop {
            match self.ring.lock().push(item) {
                Ok(()) => return,
                Err(rejected) => item = rejected,
            }
            retry.wait();
        }
    }

    fn take(&self) -> T {
        let mut retry = Retry::new(&self.config);
        loop {
            if let Some(item) = self.ring.lock().pop() {
                return item;
            }
            retry.wait();
        }
    }

    fn try_put(&self, item: T) -> QueueResult<T> {
        self.ring.lock().push(item).map_err(QueueError::Full)
    }

    fn try_take(&self) -> Option<T> {
        self.ring.lock().pop()
    }

    fn len(&self) -> usize {
        self.ring.lock().len()
    }

    fn capacity(&self) -> usize {
        self.ring.lock().capacity()
    }

    fn is_full(&self) -> bool {
        self.ring.lock().is_full()
    }

    fn is_empty(&self) -> bool {
        self.ring.lock().is_empty()
    }

    fn strategy(&self) -> &'static str {
        "polling"
    }
}

impl<T> std::fmt::Debug for PollingQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ring = self.ring.lock();
        f.debug_struct("PollingQueue")
            .field("capacity", &ring.capacity())
            .field("len", &ring.len())
            .field("config", &self.config)
            .finish()
    }
}
