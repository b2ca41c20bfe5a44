//! The outbound network boundary contract.

use crate::message::Decision;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Sink for completed forwarding decisions.
///
/// The boundary owns OpenFlow encoding and delivery; the core hands it a
/// [`Decision`] and observes no return value (fire-and-forget).
pub trait DecisionEmitter: Send + Sync {
    /// Forwards one decision to the device it belongs to.
    fn emit(&self, decision: &Decision);
}

/// Emitter that logs each decision at debug level and counts it.
///
/// The evaluation daemons use this as their boundary: the decisions are
/// observable through the log and the count feeds the `stats` command.
#[derive(Debug, Default)]
pub struct LogEmitter {
    emitted: AtomicU64,
}

impl LogEmitter {
    /// Creates an emitter with a zero count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of decisions emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }
}

impl DecisionEmitter for LogEmitter {
    fn emit(&self, decision: &Decision) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        debug!("packet-out: {}", decision);
    }
}

/// Emitter that stores every decision in memory.
///
/// Used by tests that assert on the exact decisions crossing the boundary.
#[derive(Debug, Default)]
pub struct CollectingEmitter {
    decisions: Mutex<Vec<Decision>>,
}

impl CollectingEmitter {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of decisions collected so far.
    pub fn len(&self) -> usize {
        self.decisions.lock().unwrap().len()
    }

    /// Returns true if nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all collected decisions in arrival order.
    pub fn decisions(&self) -> Vec<Decision> {
        self.decisions.lock().unwrap().clone()
    }
}

impl DecisionEmitter for CollectingEmitter {
    fn emit(&self, decision: &Decision) {
        self.decisions.lock().unwrap().push(*decision);
    }
}
