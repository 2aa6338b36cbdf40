//! # Rust Bounded Queue
//!
//! Thread-based producer/consumer primitives: a fixed-capacity blocking
//! queue and a worker pool that drains a FIFO task queue.
//!
//! ## Features
//!
//! - **Bounded Queue**: circular buffer guarded by one lock and two
//!   conditions; blocking, non-blocking, timed and cancellable put/take
//! - **Polling Queue**: the same contract with backoff-based waiting, for
//!   comparison and for environments without condition variables
//! - **Worker Pool**: fixed worker set, all-or-nothing batch submission,
//!   graceful shutdown that runs every queued task
//! - **Worker Statistics**: completed, failed and panicked task counts per
//!   worker, serializable as a snapshot
//!
//! ## Bounded Queue
//!
//! ```rust
//! use rust_bounded_queue::BoundedQueue;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(BoundedQueue::new(1).unwrap());
//! let producer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         queue.put(5);
//!         queue.put(6); // blocks until 5 is taken
//!     })
//! };
//!
//! assert_eq!(queue.take(), 5);
//! assert_eq!(queue.take(), 6);
//! producer.join().unwrap();
//! assert!(queue.is_empty());
//! ```
//!
//! ## Worker Pool
//!
//! ```rust
//! use rust_bounded_queue::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::with_config(
//!     WorkerPoolConfig::new(4).with_thread_name_prefix("my-worker"),
//! )?;
//!
//! for i in 0..10 {
//!     pool.execute(move || {
//!         println!("Task {} executing", i);
//!         Ok(())
//!     });
//! }
//!
//! let answer = pool.submit_with_result(|| Ok(6 * 7)).expect("pool is running");
//! assert_eq!(answer.wait()?, 42);
//!
//! pool.shutdown()?;
//! assert_eq!(pool.completed_count(), 11);
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Jobs
//!
//! ```rust
//! use rust_bounded_queue::prelude::*;
//!
//! struct Flush {
//!     path: String,
//! }
//!
//! impl Job for Flush {
//!     fn execute(&mut self) -> Result<()> {
//!         println!("Flushing {}", self.path);
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Flush"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::new(2)?;
//! assert!(pool.submit(Flush {
//!     path: "/tmp/out".to_string(),
//! }));
//! pool.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;

pub use crate::core::{
    BoxedJob, CancellationReason, CancellationToken, ClosureJob, Job, Result, ThreadError,
};
pub use crate::pool::{JobResult, PoolState, PoolStats, WorkerPool, WorkerPoolConfig, WorkerStats};
pub use crate::queue::{BlockingQueue, BoundedQueue, PollingConfig, PollingQueue, QueueError};
