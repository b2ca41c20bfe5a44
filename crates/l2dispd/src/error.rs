//! Error types for l2dispd.

use thiserror::Error;

/// Learning-switch evaluation daemon errors.
#[derive(Debug, Error)]
pub enum L2Error {
    /// IO error on the console.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Worker pool failure.
    #[error(transparent)]
    Pool(#[from] ofdispatch_core::PoolError),
}

/// Result type for l2dispd operations.
pub type Result<T> = std::result::Result<T, L2Error>;
