//! Worker-pool dispatch and result collection for the ofdispatch
//! control plane.
//!
//! This crate provides the machinery shared by the evaluation daemons
//! that compare single-threaded against pooled per-packet decision
//! making under identical traffic:
//!
//! - [`WorkerPool`]: dynamically-sized pool of worker threads with
//!   round-robin dispatch and state broadcast
//! - [`DecisionEngine`]: the per-packet computation a worker runs
//! - [`Dispatcher`]: routes packet events inline (mono) or to the pool
//!   (multi)
//! - [`ResultSink`]: background fan-in loop forwarding worker results to
//!   the network boundary
//! - [`ModeGate`]: the atomic mono/multi switch observed by both the
//!   dispatcher and the sink
//!
//! # Architecture
//!
//! ```text
//! packet event ──> [Dispatcher] ──mono──> inline engine ──> [DecisionEmitter]
//!                       │
//!                     multi
//!                       ↓
//!                  [WorkerPool] ──> worker thread ──> result channel
//!                                                          │
//!                                  [ResultSink] <──────────┘
//!                                       │ (gated by ModeGate)
//!                                       ↓
//!                                 [DecisionEmitter]
//! ```
//!
//! Workers are isolated units of execution: each owns a private engine
//! instance and sees shared state only through explicit broadcast
//! messages, tagged apart from work items on the same channel.

mod adjacency;
mod boundary;
pub mod control;
mod dispatch;
mod engine;
mod error;
mod fwd;
mod gate;
mod message;
mod pool;
mod sink;

pub use adjacency::{AdjacencyTable, Link};
pub use boundary::{CollectingEmitter, DecisionEmitter, LogEmitter};
pub use dispatch::{DispatchStats, Dispatcher};
pub use engine::DecisionEngine;
pub use error::{PoolError, PoolResult};
pub use fwd::{ForwardingTable, ForwardingTables};
pub use gate::{Mode, ModeGate, ParseModeError};
pub use message::{Decision, WorkerId, WorkerRequest};
pub use pool::{PoolStats, WorkerPool, WorkerRegistration};
pub use sink::ResultSink;
