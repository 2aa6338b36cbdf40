//! Error types for the queue and pool primitives

/// Result type for queue and pool operations
pub type Result<T> = std::result::Result<T, ThreadError>;

/// Errors that can occur in the queue and pool primitives
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ThreadError {
    /// Queue constructed with a capacity it cannot honor
    #[error("Invalid queue capacity {capacity}: capacity must be at least 1")]
    InvalidCapacity {
        /// Requested capacity
        capacity: usize,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// A blocking wait was abandoned through its cancellation token
    #[error("Operation cancelled: {reason}")]
    Cancelled {
        /// Reason recorded on the token
        reason: String,
    },

    /// A blocking wait gave up after its deadline
    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Worker pool has already been stopped
    #[error("Worker pool '{pool_name}' is not running")]
    NotRunning {
        /// Name of the worker pool
        pool_name: String,
    },

    /// Worker pool is draining and no longer admits work
    #[error("Worker pool is shutting down ({pending} tasks pending)")]
    ShuttingDown {
        /// Number of tasks still queued
        pending: usize,
    },

    /// The shared pool was already installed with a different worker count
    #[error("Shared worker pool already initialized with {worker_count} workers")]
    AlreadyInitialized {
        /// Worker count of the installed pool
        worker_count: usize,
    },

    /// Failed to spawn a worker thread
    #[error("Failed to spawn worker thread #{worker_id}: {message}")]
    SpawnError {
        /// ID of the worker that failed to spawn
        worker_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{worker_id}: {message}")]
    JoinError {
        /// ID of the worker that failed to join
        worker_id: usize,
        /// Error message
        message: String,
    },

    /// A task returned an error
    #[error("Task execution failed: {message}")]
    ExecutionError {
        /// Error message
        message: String,
    },

    /// A task panicked on a worker
    #[error("Task panicked on worker #{worker_id}: {message}")]
    WorkerPanic {
        /// ID of the worker that ran the task
        worker_id: usize,
        /// Panic message
        message: String,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl ThreadError {
    /// Create an invalid capacity error
    pub fn invalid_capacity(capacity: usize) -> Self {
        ThreadError::InvalidCapacity { capacity }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ThreadError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a cancelled error
    pub fn cancelled(reason: impl Into<String>) -> Self {
        ThreadError::Cancelled {
            reason: reason.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout_ms: u64) -> Self {
        ThreadError::Timeout { timeout_ms }
    }

    /// Create a not running error
    pub fn not_running(pool_name: impl Into<String>) -> Self {
        ThreadError::NotRunning {
            pool_name: pool_name.into(),
        }
    }

    /// Create a shutting down error
    pub fn shutting_down(pending: usize) -> Self {
        ThreadError::ShuttingDown { pending }
    }

    /// Create an already initialized error
    pub fn already_initialized(worker_count: usize) -> Self {
        ThreadError::AlreadyInitialized { worker_count }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        worker_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ThreadError::SpawnError {
            worker_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(worker_id: usize, message: impl Into<String>) -> Self {
        ThreadError::JoinError {
            worker_id,
            message: message.into(),
        }
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        ThreadError::ExecutionError {
            message: message.into(),
        }
    }

    /// Create a worker panic error
    pub fn worker_panic(worker_id: usize, message: impl Into<String>) -> Self {
        ThreadError::WorkerPanic {
            worker_id,
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ThreadError::Other(msg.into())
    }
}
