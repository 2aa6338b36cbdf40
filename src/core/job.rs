//! Units of work executed by the worker pool

use crate::core::error::{Result, ThreadError};
use std::fmt;

/// A task that a worker runs to completion.
///
/// Returning an error marks the task as failed; the worker that ran it keeps
/// polling for more work either way.
pub trait Job: Send {
    /// Run the task
    ///
    /// # Errors
    ///
    /// Returns an error if the task fails. The error is logged and counted by
    /// the worker, it never reaches the submitter unless the task was
    /// submitted through [`WorkerPool::submit_with_result`].
    ///
    /// [`WorkerPool::submit_with_result`]: crate::pool::WorkerPool::submit_with_result
    fn execute(&mut self) -> Result<()>;

    /// Name used in logs and statistics
    fn name(&self) -> &str {
        "Job"
    }
}

impl fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({})", self.name())
    }
}

/// A boxed job that can be moved onto a worker thread
pub type BoxedJob = Box<dyn Job>;

/// Adapts a one-shot closure into a [`Job`]
pub struct ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    closure: Option<F>,
    name: String,
}

impl<F> ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    /// Wrap a closure
    pub fn new(closure: F) -> Self {
        Self::with_name(closure, "ClosureJob")
    }

    /// Wrap a closure under a custom name
    pub fn with_name<S: Into<String>>(closure: F, name: S) -> Self {
        Self {
            closure: Some(closure),
            name: name.into(),
        }
    }
}

impl<F> Job for ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    fn execute(&mut self) -> Result<()> {
        match self.closure.take() {
            Some(closure) => closure(),
            None => Err(ThreadError::other(format!(
                "{} already executed - cannot execute twice",
                self.name
            ))),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
