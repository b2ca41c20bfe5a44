//! Error types for spfdispd.

use thiserror::Error;

/// Shortest-path evaluation daemon errors.
#[derive(Debug, Error)]
pub enum SpfError {
    /// IO error reading a topology file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed topology file.
    #[error("topology file error: {0}")]
    TopologyFormat(#[from] serde_json::Error),

    /// Structurally invalid topology.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// Worker pool failure.
    #[error(transparent)]
    Pool(#[from] ofdispatch_core::PoolError),
}

/// Result type for spfdispd operations.
pub type Result<T> = std::result::Result<T, SpfError>;
