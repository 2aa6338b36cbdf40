//! Unbounded FIFO task queue with close and drain support.

use super::{QueueError, QueueResult};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A growable FIFO queue shared by submitters and workers.
///
/// Pushing never blocks. Consumers wait on `not_empty`; owners that need the
/// backlog gone wait on `drained`, which is signalled whenever a pop leaves
/// the queue empty.
///
/// Closing is a one-way switch taken under the queue lock: after
/// [`close`](Self::close) returns, no push can succeed, while items already
/// queued stay available to consumers.
pub struct UnboundedQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    drained: Condvar,
}

impl<T> UnboundedQueue<T> {
    /// Creates an empty, open queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
            drained: Condvar::new(),
        }
    }

    /// Appends `item`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] holding `item` once the queue is closed.
    pub fn push(&self, item: T) -> QueueResult<T> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(QueueError::Closed(item));
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Appends every item of `items` under one lock acquisition, or none of
    /// them if the queue is closed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] holding the whole batch.
    pub fn push_all(&self, items: Vec<T>) -> QueueResult<Vec<T>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(QueueError::Closed(items));
        }
        let added = items.len();
        state.items.extend(items);
        drop(state);
        match added {
            0 => {}
            1 => {
                self.not_empty.notify_one();
            }
            _ => {
                self.not_empty.notify_all();
            }
        }
        Ok(())
    }

    /// Waits up to `timeout` for an item.
    ///
    /// Returns `None` on timeout, or immediately once the queue is closed and
    /// empty.
    /// A timeout too large to represent as a deadline waits without one.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                if state.items.is_empty() {
                    self.drained.notify_all();
                }
                return Some(item);
            }
            if state.closed {
                return None;
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return None;
                    }
                    self.not_empty.wait_until(&mut state, deadline);
                }
                None => self.not_empty.wait(&mut state),
            }
        }
    }

    /// Blocks until the queue is empty. Returns immediately if it already is.
    pub fn wait_until_empty(&self) {
        let mut state = self.state.lock();
        while !state.items.is_empty() {
            self.drained.wait(&mut state);
        }
    }

    /// Stops accepting items and wakes every waiting consumer.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.not_empty.notify_all();
    }

    /// `true` once the queue is closed and empty. No item can arrive after
    /// that, so consumers may stop polling.
    pub fn is_drained(&self) -> bool {
        let state = self.state.lock();
        state.closed && state.items.is_empty()
    }

    /// Number of items waiting.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// `true` when no item is waiting.
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }
}

impl<T> Default for UnboundedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for UnboundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("UnboundedQueue")
            .field("len", &state.items.len())
            .field("closed", &state.closed)
            .finish()
    }
}
