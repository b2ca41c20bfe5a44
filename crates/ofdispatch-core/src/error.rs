//! Error types for the dispatch core.

use thiserror::Error;

/// Errors surfaced by the worker pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Spawning a worker thread failed (resource exhaustion).
    ///
    /// The pool remains at its last good size; this is the only error in
    /// the core that is fatal to the operation that requested growth.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// A worker count of zero was requested.
    #[error("worker count must be at least 1")]
    ZeroWorkers,

    /// Every active worker is dead; the work item was dropped.
    #[error("no live workers available, work item dropped")]
    NoWorkers,
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
