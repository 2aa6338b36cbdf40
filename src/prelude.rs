//! Convenient re-exports for common types and traits

pub use crate::core::{
    BoxedJob, CancellationReason, CancellationToken, ClosureJob, Job, Result, ThreadError,
};
pub use crate::pool::{JobResult, PoolState, WorkerPool, WorkerPoolConfig, WorkerStats};
pub use crate::queue::{BlockingQueue, BoundedQueue, PollingQueue, QueueError};
