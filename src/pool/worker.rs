//! Worker thread implementation

use crate::core::{BoxedJob, Result, ThreadError};
use crate::queue::UnboundedQueue;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::{span, Level};

/// FIFO queue the pool's workers consume
pub(crate) type TaskQueue = UnboundedQueue<BoxedJob>;

thread_local! {
    static CURRENT_WORKER: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Id of the worker running on the calling thread, if any
pub(crate) fn current_worker_id() -> Option<usize> {
    CURRENT_WORKER.with(Cell::get)
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Tasks that returned `Ok`
    pub jobs_processed: AtomicU64,
    /// Tasks that returned an error
    pub jobs_failed: AtomicU64,
    /// Tasks that panicked
    pub jobs_panicked: AtomicU64,
    /// Total time spent running tasks (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment jobs processed counter
    pub fn increment_processed(&self) {
        self.jobs_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs failed counter
    pub fn increment_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs panicked counter
    pub fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Add processing time
    pub fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total jobs processed successfully
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get total jobs failed
    pub fn get_jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Tasks that finished in any way: succeeded, failed or panicked
    pub fn get_jobs_completed(&self) -> u64 {
        self.get_jobs_processed() + self.get_jobs_failed() + self.get_jobs_panicked()
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            jobs_processed: self.get_jobs_processed(),
            jobs_failed: self.get_jobs_failed(),
            jobs_panicked: self.get_jobs_panicked(),
            total_processing_time_us: self.total_processing_time_us.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`WorkerStats`], for reporting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatsSnapshot {
    /// Tasks that returned `Ok`
    pub jobs_processed: u64,
    /// Tasks that returned an error
    pub jobs_failed: u64,
    /// Tasks that panicked
    pub jobs_panicked: u64,
    /// Total time spent running tasks (microseconds)
    pub total_processing_time_us: u64,
}

/// A worker thread that runs tasks from the pool's queue
#[derive(Debug)]
pub struct Worker {
    id: usize,
    thread: thread::JoinHandle<()>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a worker named `<prefix>-<id>`
    ///
    /// # Shutdown Behavior
    ///
    /// The worker exits once `stop` is set, or once the queue is closed and
    /// empty. A task it has already dequeued always runs to completion first.
    pub(crate) fn spawn(
        id: usize,
        prefix: &str,
        queue: Arc<TaskQueue>,
        stop: Arc<AtomicBool>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let stats_clone = Arc::clone(&stats);

        let thread = thread::Builder::new()
            .name(format!("{}-{}", prefix, id))
            .spawn(move || {
                Self::run(id, queue, stop, stats_clone, poll_interval);
            })
            .map_err(|e| ThreadError::spawn_with_source(id, "could not spawn worker thread", e))?;

        Ok(Self { id, thread, stats })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Join the worker thread. Blocks until the stop flag is set or the
    /// queue is closed and drained.
    pub fn join(self) -> Result<()> {
        self.thread
            .join()
            .map_err(|panic| ThreadError::join(self.id, panic_message(panic.as_ref())))
    }

    fn run(
        id: usize,
        queue: Arc<TaskQueue>,
        stop: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
        poll_interval: Duration,
    ) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        CURRENT_WORKER.with(|current| current.set(Some(id)));
        log::debug!("worker {} started", id);

        while !stop.load(Ordering::Acquire) {
            match queue.pop_timeout(poll_interval) {
                Some(mut job) => Self::execute_job(id, &mut job, &stats),
                None if queue.is_drained() => break,
                None => continue,
            }
        }

        log::debug!(
            "worker {} stopped after {} tasks ({} failed, {} panicked)",
            id,
            stats.get_jobs_completed(),
            stats.get_jobs_failed(),
            stats.get_jobs_panicked()
        );
    }

    /// Execute a single job with panic protection
    fn execute_job(id: usize, job: &mut BoxedJob, stats: &WorkerStats) {
        #[cfg(feature = "tracing")]
        let job_span = span!(Level::DEBUG, "job_execution", job = job.name());
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();

        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| job.execute()));
        let elapsed = start.elapsed();

        match outcome {
            Ok(Ok(())) => {
                stats.increment_processed();
            }
            Ok(Err(e)) => {
                log::warn!("worker {}: task {} failed: {}", id, job.name(), e);
                stats.increment_failed();
            }
            Err(panic) => {
                log::error!(
                    "worker {}: task {} panicked: {}",
                    id,
                    job.name(),
                    panic_message(panic.as_ref())
                );
                stats.increment_panicked();
            }
        }

        stats.add_processing_time(elapsed.as_micros() as u64);
    }
}
