//! Tagged messages exchanged between the coordinator and worker units.

use ofdispatch_types::{BufferId, DatapathId, OutputPort, PortNo};
use std::fmt;

/// Identifier of a worker unit within the pool.
///
/// Worker ids are assigned in spawn order and never reused; the pool's
/// registry is append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request sent from the coordinator to a worker unit.
///
/// Every message on a worker's request channel carries this discriminator
/// so the worker loop can tell a state snapshot from a work item on the
/// same homogeneous channel.
#[derive(Debug, Clone)]
pub enum WorkerRequest<S, W> {
    /// Full replacement snapshot of the shared decision state.
    ///
    /// Per-channel FIFO ordering guarantees the worker applies it before
    /// any work item sent after it.
    StateUpdate(S),
    /// One packet awaiting a forwarding decision.
    Work(W),
    /// Stop the worker loop after all previously queued messages.
    Shutdown,
}

/// The computed forwarding outcome for one work item.
///
/// Produced exactly once per work item; ownership transfers from the
/// worker to the result sink over the worker's result channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// The datapath the packet-out must be sent to.
    pub datapath: DatapathId,
    /// The computed forwarding action.
    pub action: OutputPort,
    /// The switch-side buffer holding the packet.
    pub buffer_id: BufferId,
    /// The ingress port, echoed into the packet-out when known
    /// (set by the learning-switch engine, absent for path computation).
    pub in_port: Option<PortNo>,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dpid {} -> {} (buffer {})",
            self.datapath, self.action, self.buffer_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_worker_request_tags() {
        let state: WorkerRequest<u32, u32> = WorkerRequest::StateUpdate(1);
        let work: WorkerRequest<u32, u32> = WorkerRequest::Work(2);

        assert!(matches!(state, WorkerRequest::StateUpdate(1)));
        assert!(matches!(work, WorkerRequest::Work(2)));
    }

    #[test]
    fn test_decision_display() {
        let decision = Decision {
            datapath: DatapathId::new(7),
            action: OutputPort::Port(PortNo::new(3)),
            buffer_id: BufferId::new(99),
            in_port: None,
        };

        assert_eq!(decision.to_string(), "dpid 7 -> port 3 (buffer 99)");
    }
}
