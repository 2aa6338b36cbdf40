//! Cancellation tokens for interrupting blocking waits
//!
//! A [`CancellationToken`] is shared between the thread that may block (a
//! producer in [`BoundedQueue::put_cancellable`], a consumer in
//! [`BoundedQueue::take_cancellable`], a long-running task) and whoever decides
//! that the wait should be abandoned.
//!
//! Blocking primitives hook into a token with [`CancellationToken::on_cancel`]:
//! the callback runs on the cancelling thread and is responsible for waking the
//! waiter. Registration and cancellation are ordered so that a callback is
//! never missed, whichever side gets there first.
//!
//! # Example
//!
//! ```rust
//! use rust_bounded_queue::{BoundedQueue, CancellationToken, QueueError};
//! use std::thread;
//!
//! let queue = BoundedQueue::new(1).unwrap();
//! queue.put(1);
//!
//! let token = CancellationToken::new();
//! let canceller = token.clone();
//! let waiter = thread::spawn(move || {
//!     // Queue is full, so this blocks until the token is cancelled
//!     queue.put_cancellable(2, &token)
//! });
//!
//! canceller.cancel();
//! assert!(matches!(waiter.join().unwrap(), Err(QueueError::Cancelled(2))));
//! ```
//!
//! [`BoundedQueue::put_cancellable`]: crate::queue::BoundedQueue::put_cancellable
//! [`BoundedQueue::take_cancellable`]: crate::queue::BoundedQueue::take_cancellable

use crate::core::{Result, ThreadError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

static NEXT_CALLBACK_ID: AtomicUsize = AtomicUsize::new(1);

fn next_callback_id() -> usize {
    NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed)
}

/// Reason for cancellation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancellationReason {
    /// Cancelled via [`CancellationToken::cancel()`]
    Manual,
    /// The owning pool is shutting down
    Shutdown,
    /// Custom cancellation reason
    Custom(String),
}

impl std::fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancellationReason::Manual => write!(f, "manually cancelled"),
            CancellationReason::Shutdown => write!(f, "shutting down"),
            CancellationReason::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

struct StoredCallback {
    id: usize,
    callback: Box<dyn FnOnce() + Send>,
}

struct Inner {
    cancelled: AtomicBool,
    reason: Mutex<Option<CancellationReason>>,
    callbacks: Mutex<Vec<StoredCallback>>,
}

/// A thread-safe, clonable cancellation flag with wake-up callbacks
///
/// Clones share state: cancelling any clone cancels all of them.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}

impl CancellationToken {
    /// Create a new token (not cancelled)
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                reason: Mutex::new(None),
                callbacks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Cancel with [`CancellationReason::Manual`]
    ///
    /// Idempotent: only the first call records a reason and runs callbacks.
    pub fn cancel(&self) {
        self.cancel_with_reason(CancellationReason::Manual);
    }

    /// Cancel with a specific reason, then run every registered callback on
    /// the calling thread
    pub fn cancel_with_reason(&self, reason: CancellationReason) {
        {
            let mut slot = self.inner.reason.lock();
            if slot.is_some() {
                return;
            }
            *slot = Some(reason);
            self.inner.cancelled.store(true, Ordering::Release);
        }

        // Flag is visible before the drain, so a concurrent on_cancel either
        // lands in this drain or observes the flag and runs its own callback.
        let callbacks: Vec<_> = self.inner.callbacks.lock().drain(..).collect();
        for stored in callbacks {
            (stored.callback)();
        }
    }

    /// Check if this token has been cancelled
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Returns the cancellation reason, `None` while not cancelled
    pub fn reason(&self) -> Option<CancellationReason> {
        self.inner.reason.lock().clone()
    }

    /// Returns [`ThreadError::Cancelled`] if cancelled, `Ok(())` otherwise
    ///
    /// ```rust
    /// use rust_bounded_queue::{CancellationToken, ThreadError};
    ///
    /// fn crunch(token: &CancellationToken) -> Result<(), ThreadError> {
    ///     for _ in 0..100 {
    ///         token.check()?;
    ///     }
    ///     Ok(())
    /// }
    ///
    /// let token = CancellationToken::new();
    /// token.cancel();
    /// assert!(crunch(&token).is_err());
    /// ```
    pub fn check(&self) -> Result<()> {
        match self.reason() {
            Some(reason) => Err(ThreadError::cancelled(reason.to_string())),
            None => Ok(()),
        }
    }

    /// Registers a callback to run when the token is cancelled
    ///
    /// If the token is already cancelled the callback runs immediately on the
    /// calling thread. The returned guard unregisters the callback when
    /// dropped, so callers must not hold locks the callback needs while
    /// registering.
    pub fn on_cancel<F>(&self, callback: F) -> CancellationCallbackGuard
    where
        F: FnOnce() + Send + 'static,
    {
        let id = next_callback_id();
        let mut callbacks = self.inner.callbacks.lock();

        if self.is_cancelled() {
            drop(callbacks);
            callback();
        } else {
            callbacks.push(StoredCallback {
                id,
                callback: Box::new(callback),
            });
        }

        CancellationCallbackGuard {
            token: Some(self.clone()),
            callback_id: id,
        }
    }

    fn remove_callback(&self, callback_id: usize) {
        self.inner.callbacks.lock().retain(|c| c.id != callback_id);
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard returned by [`CancellationToken::on_cancel()`]; unregisters the
/// callback on drop
pub struct CancellationCallbackGuard {
    token: Option<CancellationToken>,
    callback_id: usize,
}

impl CancellationCallbackGuard {
    /// Keep the callback registered after the guard is dropped
    pub fn detach(mut self) {
        self.token = None;
    }
}

impl Drop for CancellationCallbackGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.remove_callback(self.callback_id);
        }
    }
}
