//! Worker pool implementation

use crate::core::{
    BoxedJob, CancellationReason, CancellationToken, ClosureJob, Job, Result, ThreadError,
};
use crate::pool::config::WorkerPoolConfig;
use crate::pool::result::{JobResult, ResultJob};
use crate::pool::worker::{TaskQueue, Worker, WorkerStats, WorkerStatsSnapshot};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Lifecycle of a [`WorkerPool`]
///
/// `Running → Draining → Stopped`, each transition taken exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolState {
    /// Accepting and running tasks
    Running,
    /// Shutdown in progress: nothing is admitted, queued tasks still run
    Draining,
    /// Queue drained and every worker joined
    Stopped,
}

impl std::fmt::Display for PoolState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolState::Running => write!(f, "running"),
            PoolState::Draining => write!(f, "draining"),
            PoolState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Snapshot of a pool's counters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Pool name (thread name prefix)
    pub name: String,
    /// Lifecycle state when the snapshot was taken
    pub state: PoolState,
    /// Workers the pool was built with
    pub worker_count: usize,
    /// Tasks admitted so far
    pub submitted: u64,
    /// Tasks waiting in the queue
    pub pending: usize,
    /// Tasks that finished in any way
    pub completed: u64,
    /// Tasks that returned an error
    pub failed: u64,
    /// Tasks that panicked
    pub panicked: u64,
    /// Per-worker counters, indexed by worker id
    pub workers: Vec<WorkerStatsSnapshot>,
}

impl PoolStats {
    /// Render the snapshot as a JSON object, for logs and diagnostics
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ThreadError::other(format!("failed to serialize pool stats: {}", e)))
    }
}

/// A fixed set of worker threads consuming a FIFO task queue
///
/// Workers start when the pool is constructed. Tasks are admitted only while
/// the pool is [`Running`](PoolState::Running); [`shutdown`](Self::shutdown)
/// stops admission, waits for every queued task to run, and joins the
/// workers. Dropping a pool that was not shut down performs the shutdown.
///
/// # Shutdown Mechanism
///
/// The `Running → Draining` transition closes the task queue while the state
/// lock is held. Admission is decided under the queue's own lock, so a
/// submission either lands before the close (and is drained) or is rejected.
/// Once the queue is empty the pool raises the workers' stop flag; idle
/// workers are already awake because closing broadcasts to them.
///
/// # Example
///
/// ```rust
/// use rust_bounded_queue::pool::WorkerPool;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let pool = WorkerPool::new(2).unwrap();
/// let counter = Arc::new(AtomicUsize::new(0));
/// for _ in 0..10 {
///     let counter = Arc::clone(&counter);
///     pool.execute(move || {
///         counter.fetch_add(1, Ordering::Relaxed);
///         Ok(())
///     });
/// }
/// pool.shutdown().unwrap();
/// assert_eq!(counter.load(Ordering::Relaxed), 10);
/// assert!(!pool.execute(|| Ok(())));
/// ```
pub struct WorkerPool {
    config: WorkerPoolConfig,
    queue: Arc<TaskQueue>,
    stop: Arc<AtomicBool>,
    state: Mutex<PoolState>,
    state_changed: Condvar,
    workers: Mutex<Vec<Worker>>,
    stats: Vec<Arc<WorkerStats>>,
    submitted: AtomicU64,
    shutdown_token: CancellationToken,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("pending", &self.pending_count())
            .field("submitted", &self.total_submitted())
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool with `worker_count` workers and default settings
    ///
    /// # Errors
    ///
    /// [`ThreadError::InvalidConfig`] if `worker_count` is 0,
    /// [`ThreadError::SpawnError`] if a worker thread cannot be started.
    pub fn new(worker_count: usize) -> Result<Self> {
        Self::with_config(WorkerPoolConfig::new(worker_count))
    }

    /// Create a pool from a configuration
    ///
    /// If spawning any worker fails, the workers already started are stopped
    /// and joined before the error is returned.
    pub fn with_config(config: WorkerPoolConfig) -> Result<Self> {
        config.validate()?;

        let queue = Arc::new(TaskQueue::new());
        let stop = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(config.worker_count);
        for id in 0..config.worker_count {
            match Worker::spawn(
                id,
                &config.thread_name_prefix,
                Arc::clone(&queue),
                Arc::clone(&stop),
                config.poll_interval,
            ) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    log::error!(
                        "worker pool '{}': {}; stopping {} started workers",
                        config.thread_name_prefix,
                        e,
                        workers.len()
                    );
                    stop.store(true, Ordering::Release);
                    queue.close();
                    for worker in workers {
                        if let Err(join_error) = worker.join() {
                            log::error!("{}", join_error);
                        }
                    }
                    return Err(e);
                }
            }
        }

        let stats = workers.iter().map(Worker::stats).collect();
        log::debug!(
            "worker pool '{}' started with {} workers",
            config.thread_name_prefix,
            config.worker_count
        );

        Ok(Self {
            config,
            queue,
            stop,
            state: Mutex::new(PoolState::Running),
            state_changed: Condvar::new(),
            workers: Mutex::new(workers),
            stats,
            submitted: AtomicU64::new(0),
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Submit a job. Returns `false`, dropping the job, unless the pool is
    /// running.
    pub fn submit<J: Job + 'static>(&self, job: J) -> bool {
        self.enqueue(Box::new(job)).is_ok()
    }

    /// Submit a closure as a job. Same admission rule as [`submit`](Self::submit).
    pub fn execute<F>(&self, f: F) -> bool
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit(ClosureJob::new(f))
    }

    /// Submit a job, reporting why it was rejected
    ///
    /// # Errors
    ///
    /// [`ThreadError::ShuttingDown`] while draining,
    /// [`ThreadError::NotRunning`] once stopped.
    pub fn try_submit<J: Job + 'static>(&self, job: J) -> Result<()> {
        self.enqueue(Box::new(job))
    }

    /// Submit every job in `jobs`, or none of them.
    ///
    /// Admission is decided once for the whole batch, which is appended in
    /// order under a single queue lock.
    pub fn submit_all<I>(&self, jobs: I) -> bool
    where
        I: IntoIterator<Item = BoxedJob>,
    {
        let jobs: Vec<BoxedJob> = jobs.into_iter().collect();
        let count = jobs.len() as u64;
        match self.queue.push_all(jobs) {
            Ok(()) => {
                self.submitted.fetch_add(count, Ordering::Relaxed);
                true
            }
            Err(_) => false,
        }
    }

    /// Submit a closure whose outcome is delivered through a [`JobResult`].
    ///
    /// Returns `None` unless the pool is running.
    pub fn submit_with_result<F, T>(&self, f: F) -> Option<JobResult<T>>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (job, result) = ResultJob::new(f);
        self.enqueue(Box::new(job)).ok().map(|()| result)
    }

    fn enqueue(&self, job: BoxedJob) -> Result<()> {
        match self.queue.push(job) {
            Ok(()) => {
                self.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(_) => Err(self.rejection()),
        }
    }

    fn rejection(&self) -> ThreadError {
        match self.state() {
            PoolState::Draining => ThreadError::shutting_down(self.pending_count()),
            PoolState::Running | PoolState::Stopped => {
                ThreadError::not_running(&self.config.thread_name_prefix)
            }
        }
    }

    /// Stop admitting tasks, run every queued task, and join the workers.
    ///
    /// Returns once the pool is [`Stopped`](PoolState::Stopped). Calling it
    /// again afterwards is a no-op; a caller that arrives while another
    /// shutdown is in progress waits for that one to finish.
    ///
    /// Must not be called from one of this pool's own tasks: the calling
    /// worker would wait for itself.
    ///
    /// # Errors
    ///
    /// [`ThreadError::JoinError`] if a worker thread could not be joined. The
    /// pool is still stopped.
    pub fn shutdown(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            loop {
                match *state {
                    PoolState::Stopped => return Ok(()),
                    PoolState::Draining => self.state_changed.wait(&mut state),
                    PoolState::Running => break,
                }
            }
            *state = PoolState::Draining;
            self.queue.close();
        }

        log::debug!(
            "worker pool '{}' draining {} pending tasks",
            self.config.thread_name_prefix,
            self.pending_count()
        );
        self.shutdown_token
            .cancel_with_reason(CancellationReason::Shutdown);

        self.queue.wait_until_empty();
        self.stop.store(true, Ordering::Release);

        let workers = std::mem::take(&mut *self.workers.lock());
        let mut first_error = None;
        for worker in workers {
            if let Err(e) = worker.join() {
                log::error!("worker pool '{}': {}", self.config.thread_name_prefix, e);
                first_error.get_or_insert(e);
            }
        }

        *self.state.lock() = PoolState::Stopped;
        self.state_changed.notify_all();
        log::debug!(
            "worker pool '{}' stopped after {} tasks",
            self.config.thread_name_prefix,
            self.completed_count()
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Token cancelled with [`CancellationReason::Shutdown`] when draining
    /// begins.
    ///
    /// Long-running tasks can watch it to finish early; queued tasks are
    /// still run either way.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Current lifecycle state
    pub fn state(&self) -> PoolState {
        *self.state.lock()
    }

    /// `true` while tasks are admitted
    pub fn is_running(&self) -> bool {
        self.state() == PoolState::Running
    }

    /// Number of workers the pool was built with
    pub fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// Tasks waiting in the queue (approximate)
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Tasks admitted so far
    pub fn total_submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Tasks that finished, whether they succeeded, failed or panicked
    pub fn completed_count(&self) -> u64 {
        self.stats.iter().map(|s| s.get_jobs_completed()).sum()
    }

    /// Tasks that returned an error
    pub fn failed_count(&self) -> u64 {
        self.stats.iter().map(|s| s.get_jobs_failed()).sum()
    }

    /// Tasks that panicked
    pub fn panicked_count(&self) -> u64 {
        self.stats.iter().map(|s| s.get_jobs_panicked()).sum()
    }

    /// Live statistics for each worker, indexed by worker id
    pub fn worker_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.stats.clone()
    }

    /// Configuration the pool was built with
    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Snapshot of every counter
    pub fn stats(&self) -> PoolStats {
        let workers: Vec<WorkerStatsSnapshot> = self.stats.iter().map(|s| s.snapshot()).collect();
        PoolStats {
            name: self.config.thread_name_prefix.clone(),
            state: self.state(),
            worker_count: self.worker_count(),
            submitted: self.total_submitted(),
            pending: self.pending_count(),
            completed: workers
                .iter()
                .map(|w| w.jobs_processed + w.jobs_failed + w.jobs_panicked)
                .sum(),
            failed: workers.iter().map(|w| w.jobs_failed).sum(),
            panicked: workers.iter().map(|w| w.jobs_panicked).sum(),
            workers,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.state() != PoolState::Stopped {
            if let Err(e) = self.shutdown() {
                log::error!(
                    "failed to shut down worker pool '{}' during drop: {}",
                    self.config.thread_name_prefix,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    fn test_pool(workers: usize) -> WorkerPool {
        WorkerPool::with_config(
            WorkerPoolConfig::new(workers).with_poll_interval(Duration::from_millis(10)),
        )
        .expect("Failed to create worker pool")
    }

    #[test]
    fn test_pool_creation() {
        let pool = test_pool(4);
        assert!(pool.is_running());
        assert_eq!(pool.state(), PoolState::Running);
        assert_eq!(pool.worker_count(), 4);
        assert_eq!(pool.worker_stats().len(), 4);

        pool.shutdown().expect("Failed to shutdown pool");
        assert_eq!(pool.state(), PoolState::Stopped);
        assert!(!pool.is_running());
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(ThreadError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_job_execution() {
        let pool = test_pool(2);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter_clone = Arc::clone(&counter);
            assert!(pool.execute(move || {
                counter_clone.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }));
        }

        pool.shutdown().expect("Failed to shutdown pool");
        assert_eq!(counter.load(Ordering::Relaxed), 10);
        assert_eq!(pool.completed_count(), 10);
        assert_eq!(pool.total_submitted(), 10);
        assert_eq!(pool.pending_count(), 0);
    }

    #[test]
    fn test_submit_after_shutdown_rejected() {
        let pool = test_pool(1);
        pool.shutdown().expect("Failed to shutdown pool");

        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);
        assert!(!pool.execute(move || {
            ran_clone.store(true, Ordering::Relaxed);
            Ok(())
        }));
        assert!(matches!(
            pool.try_submit(ClosureJob::new(|| Ok(()))),
            Err(ThreadError::NotRunning { .. })
        ));
        assert!(pool.submit_with_result(|| Ok(1)).is_none());
        assert!(!ran.load(Ordering::Relaxed));
        assert_eq!(pool.total_submitted(), 0);
    }

    #[test]
    fn test_submit_all_is_all_or_nothing() {
        let pool = test_pool(2);
        let counter = Arc::new(AtomicUsize::new(0));
        let batch = |n: usize| -> Vec<BoxedJob> {
            (0..n)
                .map(|_| {
                    let counter = Arc::clone(&counter);
                    Box::new(ClosureJob::new(move || {
                        counter.fetch_add(1, Ordering::Relaxed);
                        Ok(())
                    })) as BoxedJob
                })
                .collect()
        };

        assert!(pool.submit_all(batch(5)));
        pool.shutdown().expect("Failed to shutdown pool");
        assert!(!pool.submit_all(batch(5)));

        assert_eq!(counter.load(Ordering::Relaxed), 5);
        assert_eq!(pool.completed_count(), 5);
    }

    #[test]
    fn test_errors_and_panics_counted() {
        let pool = test_pool(1);
        assert!(pool.execute(|| Err(ThreadError::execution("expected failure"))));
        assert!(pool.execute(|| panic!("expected panic")));
        assert!(pool.execute(|| Ok(())));

        pool.shutdown().expect("Failed to shutdown pool");
        assert_eq!(pool.failed_count(), 1);
        assert_eq!(pool.panicked_count(), 1);
        assert_eq!(pool.completed_count(), 3);
    }

    #[test]
    fn test_submit_with_result() {
        let pool = test_pool(2);
        let value = pool
            .submit_with_result(|| Ok(21 * 2))
            .expect("Pool rejected task");
        let failure = pool
            .submit_with_result(|| -> Result<()> { Err(ThreadError::execution("nope")) })
            .expect("Pool rejected task");

        assert_eq!(value.wait().expect("Task failed"), 42);
        assert!(matches!(failure.wait(), Err(ThreadError::ExecutionError { .. })));
        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_try_submit_while_draining() {
        let pool = Arc::new(test_pool(1));
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);
        let (started_tx, started_rx) = crossbeam_channel::bounded::<()>(0);
        assert!(pool.execute(move || {
            started_tx.send(()).ok();
            release_rx.recv().ok();
            Ok(())
        }));
        started_rx.recv().expect("Task did not start");

        let shutdown = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.shutdown())
        };
        while pool.state() != PoolState::Draining {
            thread::sleep(Duration::from_millis(1));
        }

        assert!(matches!(
            pool.try_submit(ClosureJob::new(|| Ok(()))),
            Err(ThreadError::ShuttingDown { .. })
        ));
        assert!(pool.shutdown_token().is_cancelled());
        assert_eq!(pool.shutdown_token().reason(), Some(CancellationReason::Shutdown));

        release_tx.send(()).expect("Task already gone");
        shutdown
            .join()
            .expect("Shutdown thread panicked")
            .expect("Failed to shutdown pool");
        assert_eq!(pool.state(), PoolState::Stopped);
        assert_eq!(pool.completed_count(), 1);
    }

    #[test]
    fn test_concurrent_shutdown_waits_for_stopped() {
        let pool = Arc::new(test_pool(2));
        for _ in 0..20 {
            assert!(pool.execute(|| {
                thread::sleep(Duration::from_millis(2));
                Ok(())
            }));
        }

        let callers: Vec<_> = (0..3)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    pool.shutdown().expect("Failed to shutdown pool");
                    pool.state()
                })
            })
            .collect();

        for caller in callers {
            assert_eq!(caller.join().expect("Caller panicked"), PoolState::Stopped);
        }
        assert_eq!(pool.completed_count(), 20);
        pool.shutdown().expect("Second shutdown failed");
    }

    #[test]
    fn test_drop_drains_queue() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = test_pool(2);
            for _ in 0..50 {
                let counter = Arc::clone(&counter);
                pool.execute(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                });
            }
        }
        assert_eq!(counter.load(Ordering::Relaxed), 50);
    }

    #[test]
    fn test_stats_snapshot_serializes() {
        let pool = test_pool(2);
        pool.execute(|| Ok(()));
        pool.shutdown().expect("Failed to shutdown pool");

        let stats = pool.stats();
        assert_eq!(stats.state, PoolState::Stopped);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.workers.len(), 2);

        let json = stats.to_json().expect("Failed to serialize stats");
        assert!(json.contains(r#""state":"Stopped""#));
        let parsed: PoolStats = serde_json::from_str(&json).expect("Failed to parse stats");
        assert_eq!(parsed, stats);
    }
}
