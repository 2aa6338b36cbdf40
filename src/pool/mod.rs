//! Worker pool and worker implementations

pub mod config;
pub mod result;
pub mod shared;
pub mod worker;
pub mod worker_pool;

pub use config::WorkerPoolConfig;
pub use result::JobResult;
pub use worker::{Worker, WorkerStats, WorkerStatsSnapshot};
pub use worker_pool::{PoolState, PoolStats, WorkerPool};
