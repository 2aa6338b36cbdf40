//! Blocking FIFO queues.
//!
//! # Implementations
//!
//! - [`BoundedQueue`]: fixed-capacity ring guarded by one lock and two
//!   conditions (`not_full`, `not_empty`). This is the queue to use.
//! - [`PollingQueue`]: the same ring, but blocked callers retry with bounded
//!   exponential backoff instead of sleeping on a condition. Kept as a
//!   fallback strategy and as a baseline in benchmarks.
//! - [`UnboundedQueue`]: growable FIFO used as the worker pool's task queue;
//!   consumers can wait with a timeout and owners can wait for it to drain.
//!
//! Both bounded strategies implement [`BlockingQueue`], so producer/consumer
//! code can be written once against the trait:
//!
//! ```rust
//! use rust_bounded_queue::queue::{BlockingQueue, BoundedQueue};
//! use std::sync::Arc;
//! use std::thread;
//!
//! fn pipe<Q: BlockingQueue<u32> + 'static>(queue: Arc<Q>) -> u32 {
//!     let producer = {
//!         let queue = Arc::clone(&queue);
//!         thread::spawn(move || (1..=10).for_each(|i| queue.put(i)))
//!     };
//!     let sum = (0..10).map(|_| queue.take()).sum();
//!     producer.join().unwrap();
//!     sum
//! }
//!
//! let queue = Arc::new(BoundedQueue::new(2).unwrap());
//! assert_eq!(pipe(queue), 55);
//! ```

mod bounded;
mod polling;
mod ring;
mod unbounded;

pub use bounded::BoundedQueue;
pub use polling::{PollingConfig, PollingQueue};
pub use unbounded::UnboundedQueue;

/// Errors returned by queue operations that give up on an item.
///
/// Every variant hands the rejected item back so the caller can retry,
/// reroute or drop it deliberately.
#[derive(Clone, PartialEq, Eq)]
pub enum QueueError<T> {
    /// Queue was full and the caller asked not to wait
    Full(T),
    /// Queue stayed full until the deadline passed
    Timeout(T),
    /// The wait was abandoned through a cancellation token
    Cancelled(T),
    /// Queue has been closed and accepts no more items
    Closed(T),
}

impl<T> QueueError<T> {
    /// Recovers the item that was not enqueued.
    pub fn into_inner(self) -> T {
        match self {
            QueueError::Full(item)
            | QueueError::Timeout(item)
            | QueueError::Cancelled(item)
            | QueueError::Closed(item) => item,
        }
    }
}

impl<T> std::fmt::Debug for QueueError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::Full(_) => f.write_str("Full(..)"),
            QueueError::Timeout(_) => f.write_str("Timeout(..)"),
            QueueError::Cancelled(_) => f.write_str("Cancelled(..)"),
            QueueError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> std::fmt::Display for QueueError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::Full(_) => write!(f, "queue is full"),
            QueueError::Timeout(_) => write!(f, "operation timed out"),
            QueueError::Cancelled(_) => write!(f, "operation cancelled"),
            QueueError::Closed(_) => write!(f, "queue is closed"),
        }
    }
}

impl<T> std::error::Error for QueueError<T> {}

/// Result type for queue operations that may hand an item back.
pub type QueueResult<T> = std::result::Result<(), QueueError<T>>;

/// A fixed-capacity FIFO with blocking `put` and `take`.
///
/// # Thread Safety
///
/// Implementations serialize every operation, including the status queries,
/// on one lock per queue. `is_full`/`is_empty`/`len` are still only snapshots:
/// use them for diagnostics, never to decide whether a following `put` or
/// `take` will block.
pub trait BlockingQueue<T>: Send + Sync {
    /// Inserts `item`, blocking while the queue is full.
    fn put(&self, item: T);

    /// Removes the oldest item, blocking while the queue is empty.
    fn take(&self) -> T;

    /// Inserts `item` if there is room right now.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`] with the item if the queue is full.
    fn try_put(&self, item: T) -> QueueResult<T>;

    /// Removes the oldest item if there is one right now.
    fn try_take(&self) -> Option<T>;

    /// Number of items currently queued.
    fn len(&self) -> usize;

    /// Maximum number of items the queue holds.
    fn capacity(&self) -> usize;

    /// `true` when every slot is occupied.
    fn is_full(&self) -> bool;

    /// `true` when no slot is occupied.
    fn is_empty(&self) -> bool;

    /// Short name of the waiting strategy, for logs and benchmarks.
    fn strategy(&self) -> &'static str;
}
