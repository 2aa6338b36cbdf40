//! Bounded blocking FIFO queue on an explicit lock and condition pair.

use super::ring::RingBuffer;
use super::{BlockingQueue, QueueError, QueueResult};
use crate::core::{CancellationCallbackGuard, CancellationToken, Result, ThreadError};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Shared<T> {
    ring: Mutex<RingBuffer<T>>,
    /// Producers wait here while `count == capacity`.
    not_full: Condvar,
    /// Consumers wait here while `count == 0`.
    not_empty: Condvar,
}

/// A fixed-capacity FIFO queue with blocking `put` and `take`.
///
/// All state (the slots, `head`, `tail` and `count`) lives behind a single
/// mutex. Producers that find the queue full sleep on `not_full`, consumers
/// that find it empty sleep on `not_empty`. Each successful `put` wakes one
/// consumer and each successful `take` wakes one producer, so a wakeup never
/// goes to a thread whose predicate the change could not have satisfied.
/// Every waiter re-checks its predicate after waking.
///
/// Blocking calls come in three flavours: unconditional (`put`/`take`),
/// deadline-bound (`put_timeout`/`take_timeout`) and cancellable
/// (`put_cancellable`/`take_cancellable`). A call that gives up has made no
/// change to the queue and hands any item back to the caller.
///
/// # Example
///
/// ```rust
/// use rust_bounded_queue::BoundedQueue;
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(BoundedQueue::new(1).unwrap());
/// queue.put(5);
///
/// let producer = {
///     let queue = Arc::clone(&queue);
///     // Blocks until the consumer below makes room
///     thread::spawn(move || queue.put(6))
/// };
///
/// assert_eq!(queue.take(), 5);
/// producer.join().unwrap();
/// assert_eq!(queue.take(), 6);
/// ```
pub struct BoundedQueue<T> {
    shared: Arc<Shared<T>>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::InvalidCapacity`] if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ThreadError::invalid_capacity(capacity));
        }
        Ok(Self {
            shared: Arc::new(Shared {
                ring: Mutex::new(RingBuffer::new(capacity)),
                not_full: Condvar::new(),
                not_empty: Condvar::new(),
            }),
            capacity,
        })
    }

    /// Maximum number of items the queue holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.shared.ring.lock().len()
    }

    /// `true` when no item is queued. Diagnostic snapshot only.
    pub fn is_empty(&self) -> bool {
        self.shared.ring.lock().is_empty()
    }

    /// `true` when every slot is occupied. Diagnostic snapshot only.
    pub fn is_full(&self) -> bool {
        self.shared.ring.lock().is_full()
    }

    /// Inserts `item` at the tail, blocking while the queue is full.
    pub fn put(&self, item: T) {
        let mut ring = self.shared.ring.lock();
        let mut item = item;
        loop {
            match ring.push(item) {
                Ok(()) => break,
                Err(rejected) => {
                    item = rejected;
                    self.shared.not_full.wait(&mut ring);
                }
            }
        }
        drop(ring);
        self.shared.not_empty.notify_one();
    }

    /// Removes the item at the head, blocking while the queue is empty.
    pub fn take(&self) -> T {
        let mut ring = self.shared.ring.lock();
        let item = loop {
            if let Some(item) = ring.pop() {
                break item;
            }
            self.shared.not_empty.wait(&mut ring);
        };
        drop(ring);
        self.shared.not_full.notify_one();
        item
    }

    /// Inserts `item` only if a slot is free right now.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`] holding `item` when the queue is full.
    pub fn try_put(&self, item: T) -> QueueResult<T> {
        let pushed = self.shared.ring.lock().push(item);
        match pushed {
            Ok(()) => {
                self.shared.not_empty.notify_one();
                Ok(())
            }
            Err(item) => Err(QueueError::Full(item)),
        }
    }

    /// Removes the head item only if one is queued right now.
    pub fn try_take(&self) -> Option<T> {
        let item = self.shared.ring.lock().pop();
        if item.is_some() {
            self.shared.not_full.notify_one();
        }
        item
    }

    /// Like [`put`](Self::put), but gives up once `timeout` has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Timeout`] holding `item` if no slot became free
    /// in time. The queue is left unchanged.
    pub fn put_timeout(&self, item: T, timeout: Duration) -> QueueResult<T> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            // Too far out to represent: same as no deadline.
            self.put(item);
            return Ok(());
        };
        let mut ring = self.shared.ring.lock();
        let mut item = item;
        loop {
            match ring.push(item) {
                Ok(()) => break,
                Err(rejected) => {
                    item = rejected;
                    // A waiter only leaves after its own push failed, so it
                    // never strands a wakeup meant for another producer.
                    if Instant::now() >= deadline {
                        return Err(QueueError::Timeout(item));
                    }
                    self.shared.not_full.wait_until(&mut ring, deadline);
                }
            }
        }
        drop(ring);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Like [`take`](Self::take), but returns `None` once `timeout` has
    /// elapsed with the queue still empty.
    pub fn take_timeout(&self, timeout: Duration) -> Option<T> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Some(self.take());
        };
        let mut ring = self.shared.ring.lock();
        let item = loop {
            if let Some(item) = ring.pop() {
                break item;
            }
            if Instant::now() >= deadline {
                return None;
            }
            self.shared.not_empty.wait_until(&mut ring, deadline);
        };
        drop(ring);
        self.shared.not_full.notify_one();
        Some(item)
    }

    /// Removes and returns every queued item in FIFO order, waking all
    /// blocked producers.
    pub fn drain(&self) -> Vec<T> {
        let items = self.shared.ring.lock().drain_all();
        if !items.is_empty() {
            self.shared.not_full.notify_all();
        }
        items
    }
}

impl<T: Send + 'static> BoundedQueue<T> {
    /// Like [`put`](Self::put), but abandons the wait when `token` is
    /// cancelled.
    ///
    /// A token that is already cancelled fails the call before it touches the
    /// queue, even if a slot is free. Once waiting, a producer that wakes to a
    /// free slot takes it even if the token was cancelled in the meantime.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Cancelled`] holding `item`; the queue is left
    /// unchanged.
    pub fn put_cancellable(&self, item: T, token: &CancellationToken) -> QueueResult<T> {
        if token.is_cancelled() {
            return Err(QueueError::Cancelled(item));
        }
        let _wake = self.wake_on_cancel(token, |shared| {
            shared.not_full.notify_all();
        });

        let mut ring = self.shared.ring.lock();
        let mut item = item;
        loop {
            match ring.push(item) {
                Ok(()) => break,
                Err(rejected) => {
                    item = rejected;
                    if token.is_cancelled() {
                        return Err(QueueError::Cancelled(item));
                    }
                    self.shared.not_full.wait(&mut ring);
                }
            }
        }
        drop(ring);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Like [`take`](Self::take), but abandons the wait when `token` is
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::Cancelled`] carrying the token's reason; the
    /// queue is left unchanged.
    pub fn take_cancellable(&self, token: &CancellationToken) -> Result<T> {
        token.check()?;
        let _wake = self.wake_on_cancel(token, |shared| {
            shared.not_empty.notify_all();
        });

        let mut ring = self.shared.ring.lock();
        let item = loop {
            if let Some(item) = ring.pop() {
                break item;
            }
            if token.is_cancelled() {
                drop(ring);
                return Err(token
                    .check()
                    .err()
                    .unwrap_or_else(|| ThreadError::cancelled("cancelled")));
            }
            self.shared.not_empty.wait(&mut ring);
        };
        drop(ring);
        self.shared.not_full.notify_one();
        Ok(item)
    }

    /// Registers a callback that wakes the waiters of one condition when
    /// `token` is cancelled. Must be called before taking the ring lock: an
    /// already cancelled token runs the callback inline.
    fn wake_on_cancel(
        &self,
        token: &CancellationToken,
        notify: fn(&Shared<T>),
    ) -> CancellationCallbackGuard {
        let shared = Arc::downgrade(&self.shared);
        token.on_cancel(move || {
            if let Some(shared) = shared.upgrade() {
                // Holding the lock orders this wakeup after any waiter's
                // predicate check, so the notification cannot slip past it.
                let _ring = shared.ring.lock();
                notify(&shared);
            }
        })
    }
}

impl<T: Send> BlockingQueue<T> for BoundedQueue<T> {
    fn put(&self, item: T) {
        BoundedQueue::put(self, item)
    }

    fn take(&self) -> T {
        BoundedQueue::take(self)
    }

    fn try_put(&self, item: T) -> QueueResult<T> {
        BoundedQueue::try_put(self, item)
    }

    fn try_take(&self) -> Option<T> {
        BoundedQueue::try_take(self)
    }

    fn len(&self) -> usize {
        BoundedQueue::len(self)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn is_full(&self) -> bool {
        BoundedQueue::is_full(self)
    }

    fn is_empty(&self) -> bool {
        BoundedQueue::is_empty(self)
    }

    fn strategy(&self) -> &'static str {
        "condvar"
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}
