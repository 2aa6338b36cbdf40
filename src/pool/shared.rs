//! Process-wide default pool
//!
//! Pools are normally constructed and owned explicitly. This module offers one
//! shared instance for code that has nowhere to thread a pool through. It is
//! installed either explicitly with [`init`] or lazily by [`get`].
//!
//! ```rust
//! use rust_bounded_queue::pool::{shared, WorkerPoolConfig};
//!
//! let pool = shared::init(WorkerPoolConfig::new(2)).unwrap();
//! assert!(pool.execute(|| Ok(())));
//!
//! // Same pool, same worker count: fine.
//! assert!(shared::init(WorkerPoolConfig::new(2)).is_ok());
//! // A different worker count is refused rather than ignored.
//! assert!(shared::init(WorkerPoolConfig::new(3)).is_err());
//! ```

use super::{WorkerPool, WorkerPoolConfig};
use crate::core::{Result, ThreadError};
use parking_lot::Mutex;
use std::sync::Arc;

static SHARED: Mutex<Option<Arc<WorkerPool>>> = Mutex::new(None);

/// Install the shared pool built from `config`, or return the one already
/// installed if it has the same worker count.
///
/// A shared pool that has been shut down is replaced.
///
/// # Errors
///
/// [`ThreadError::AlreadyInitialized`] if a running shared pool has a
/// different worker count, or any error from [`WorkerPool::with_config`].
pub fn init(config: WorkerPoolConfig) -> Result<Arc<WorkerPool>> {
    let mut slot = SHARED.lock();
    if let Some(pool) = slot.as_ref().filter(|pool| pool.is_running()) {
        if pool.worker_count() != config.worker_count {
            return Err(ThreadError::already_initialized(pool.worker_count()));
        }
        return Ok(Arc::clone(pool));
    }

    let pool = Arc::new(WorkerPool::with_config(config)?);
    *slot = Some(Arc::clone(&pool));
    Ok(pool)
}

/// The shared pool, created with [`WorkerPoolConfig::default`] (one worker
/// per CPU) if none is installed.
pub fn get() -> Result<Arc<WorkerPool>> {
    let mut slot = SHARED.lock();
    if let Some(pool) = slot.as_ref().filter(|pool| pool.is_running()) {
        return Ok(Arc::clone(pool));
    }

    let pool = Arc::new(WorkerPool::with_config(WorkerPoolConfig::default())?);
    *slot = Some(Arc::clone(&pool));
    Ok(pool)
}

/// Shut down and uninstall the shared pool, if any.
///
/// Tasks already queued still run. Clones of the pool handed out earlier
/// stay valid but reject new work.
pub fn shutdown() -> Result<()> {
    let pool = SHARED.lock().take();
    match pool {
        Some(pool) => pool.shutdown(),
        None => Ok(()),
    }
}
