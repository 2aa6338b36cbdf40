//! Per-task result delivery

use crate::core::{Job, Result, ThreadError};
use crate::pool::worker::{current_worker_id, panic_message};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::time::Duration;

/// Handle to the outcome of a task submitted with
/// [`WorkerPool::submit_with_result`](super::WorkerPool::submit_with_result).
///
/// Delivers the task's value, the error it returned, or
/// [`ThreadError::WorkerPanic`] if it panicked. Dropping the handle does not
/// cancel the task.
#[derive(Debug)]
pub struct JobResult<T> {
    receiver: Receiver<Result<T>>,
}

impl<T> JobResult<T> {
    /// Block until the task has finished.
    ///
    /// # Errors
    ///
    /// The task's own error, [`ThreadError::WorkerPanic`] if it panicked, or
    /// [`ThreadError::Other`] if it was dropped without running.
    pub fn wait(self) -> Result<T> {
        self.receiver.recv().unwrap_or_else(|_| Err(dropped()))
    }

    /// Wait up to `timeout` for the task to finish. The handle stays usable
    /// after a timeout.
    ///
    /// # Errors
    ///
    /// [`ThreadError::Timeout`] if the task is still running, otherwise as
    /// [`wait`](Self::wait).
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T> {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                Err(ThreadError::timeout(timeout.as_millis() as u64))
            }
            Err(RecvTimeoutError::Disconnected) => Err(dropped()),
        }
    }

    /// The outcome if the task has finished, without blocking
    pub fn try_get(&self) -> Option<Result<T>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(dropped())),
        }
    }
}

fn dropped() -> ThreadError {
    ThreadError::other("task was dropped before producing a result")
}

/// Runs a value-returning closure and sends its outcome to a [`JobResult`].
///
/// Errors and panics are reported to the worker as well, so they show up in
/// the pool's failure and panic counters.
pub(crate) struct ResultJob<F, T> {
    closure: Option<F>,
    sender: Sender<Result<T>>,
}

impl<F, T> ResultJob<F, T>
where
    F: FnOnce() -> Result<T> + Send,
    T: Send,
{
    pub(crate) fn new(closure: F) -> (Self, JobResult<T>) {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let job = Self {
            closure: Some(closure),
            sender,
        };
        (job, JobResult { receiver })
    }
}

impl<F, T> Job for ResultJob<F, T>
where
    F: FnOnce() -> Result<T> + Send,
    T: Send,
{
    fn execute(&mut self) -> Result<()> {
        let closure = self.closure.take().ok_or_else(|| {
            ThreadError::other("ResultJob already executed - cannot execute twice")
        })?;

        match catch_unwind(AssertUnwindSafe(closure)) {
            Ok(Ok(value)) => {
                // The caller may have dropped its handle; that is not a failure.
                let _ = self.sender.send(Ok(value));
                Ok(())
            }
            Ok(Err(e)) => {
                let message = e.to_string();
                let _ = self.sender.send(Err(e));
                Err(ThreadError::execution(message))
            }
            Err(panic) => {
                let worker_id = current_worker_id().unwrap_or_default();
                let message = panic_message(panic.as_ref());
                let _ = self
                    .sender
                    .send(Err(ThreadError::worker_panic(worker_id, message)));
                resume_unwind(panic)
            }
        }
    }

    fn name(&self) -> &str {
        "ResultJob"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_delivered() {
        let (mut job, result) = ResultJob::new(|| Ok(6 * 7));
        assert!(result.try_get().is_none());

        job.execute().expect("Job failed");
        assert_eq!(result.wait().expect("No value"), 42);
    }

    #[test]
    fn test_error_delivered_and_reported() {
        let (mut job, result) =
            ResultJob::new(|| -> Result<u8> { Err(ThreadError::execution("bad input")) });

        assert!(matches!(job.execute(), Err(ThreadError::ExecutionError { .. })));
        assert!(matches!(
            result.try_get(),
            Some(Err(ThreadError::ExecutionError { message })) if message == "bad input"
        ));
    }

    #[test]
    fn test_panic_delivered_then_resumed() {
        let (mut job, result) = ResultJob::new(|| -> Result<()> { panic!("exploded") });

        let outcome = catch_unwind(AssertUnwindSafe(|| job.execute()));
        assert!(outcome.is_err());
        assert!(matches!(
            result.wait(),
            Err(ThreadError::WorkerPanic { message, .. }) if message == "exploded"
        ));
    }

    #[test]
    fn test_wait_timeout_keeps_handle() {
        let (mut job, result) = ResultJob::new(|| Ok("done"));

        assert!(matches!(
            result.wait_timeout(Duration::from_millis(5)),
            Err(ThreadError::Timeout { timeout_ms: 5 })
        ));
        job.execute().expect("Job failed");
        assert_eq!(
            result.wait_timeout(Duration::from_millis(5)).expect("No value"),
            "done"
        );
    }

    #[test]
    fn test_dropped_job_reports_error() {
        let (job, result) = ResultJob::new(|| Ok(1));
        drop(job);
        assert!(matches!(result.wait(), Err(ThreadError::Other(_))));
    }
}
