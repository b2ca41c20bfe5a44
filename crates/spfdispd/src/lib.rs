//! Shortest-path evaluation daemon.
//!
//! Compares single-threaded against worker-pool execution of per-packet
//! shortest-path decisions over a fixed topology with regenerable link
//! costs. The operator switches modes, grows the pool, reshuffles costs
//! and injects synthetic traffic at runtime through the console.
//!
//! # Components
//!
//! - [`engine`]: Dijkstra over the adjacency table, with deterministic
//!   tie-breaking, and the source-to-target resolution rule
//! - [`topology`]: the built-in reference topology, JSON topology files,
//!   and link-cost generation
//! - [`daemon`]: the [`Evaluation`](daemon::Evaluation) coordinator
//!   wiring gate, dispatcher, pool and sink together
//! - [`console`]: the interactive operator surface

pub mod console;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod topology;

pub use daemon::{Evaluation, EvaluationConfig, EvaluationStats};
pub use engine::{DestinationResolver, PathRequest, SpfEngine};
pub use error::{Result, SpfError};
pub use topology::{IngressSpec, LinkSpec, TargetSpec, TopologySpec};
