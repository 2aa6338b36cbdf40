//! Core types shared by the queues and the worker pool

pub mod cancellation;
pub mod error;
pub mod job;

pub use cancellation::{CancellationCallbackGuard, CancellationReason, CancellationToken};
pub use error::{Result, ThreadError};
pub use job::{BoxedJob, ClosureJob, Job};
