//! MAC-learning decision engine.

use ofdispatch_core::{Decision, DecisionEngine, ForwardingTables};
use ofdispatch_types::{BufferId, DatapathId, MacAddress, OutputPort, PortNo};

/// One observed frame awaiting a forwarding decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L2Frame {
    /// The datapath that saw the frame.
    pub datapath: DatapathId,
    /// Source MAC of the frame.
    pub src: MacAddress,
    /// Destination MAC of the frame.
    pub dst: MacAddress,
    /// The port the frame entered on.
    pub in_port: PortNo,
    /// The switch-side buffer holding the frame.
    pub buffer_id: BufferId,
}

/// The learning-switch variant of the decision engine.
///
/// Learns the source's ingress port first, then looks up the
/// destination: a hit forwards out of the learned port, a miss floods.
/// All state is built from the frames this instance observed itself;
/// there is no broadcast state, so replicas on different workers may
/// diverge (an extra flood, never a misdelivery).
///
/// `extra_load` adds a configurable spin per frame to emulate heavier
/// per-packet computation when comparing mono against pooled execution.
pub struct L2Engine {
    tables: ForwardingTables,
    extra_load: u64,
}

impl L2Engine {
    /// Creates an engine with empty forwarding tables.
    pub fn new(extra_load: u64) -> Self {
        Self {
            tables: ForwardingTables::new(),
            extra_load,
        }
    }

    /// The learned tables (for inspection in tests and stats).
    pub fn tables(&self) -> &ForwardingTables {
        &self.tables
    }
}

/// Synthetic per-packet busy work.
fn spin(iterations: u64) {
    let mut load = 0u64;
    for i in 0..iterations {
        load = load.wrapping_add(i);
    }
    std::hint::black_box(load);
}

impl DecisionEngine for L2Engine {
    type Item = L2Frame;
    /// No broadcast state: every replica learns from its own traffic.
    type State = ();

    fn apply_state(&mut self, _state: ()) {}

    fn decide(&mut self, frame: L2Frame) -> Option<Decision> {
        let table = self.tables.table_mut(frame.datapath);
        // Learn before the destination lookup, so a frame addressed to
        // its own source already resolves.
        table.learn(frame.src, frame.in_port);
        spin(self.extra_load);
        let action = match table.lookup(&frame.dst) {
            Some(port) => OutputPort::Port(port),
            None => OutputPort::Flood,
        };
        Some(Decision {
            datapath: frame.datapath,
            action,
            buffer_id: frame.buffer_id,
            in_port: Some(frame.in_port),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mac(last: u8) -> MacAddress {
        MacAddress::new([0, 0, 0, 0, 0, last])
    }

    fn frame(dpid: u64, src: u8, dst: u8, in_port: u16, buffer: u32) -> L2Frame {
        L2Frame {
            datapath: DatapathId::new(dpid),
            src: mac(src),
            dst: mac(dst),
            in_port: PortNo::new(in_port),
            buffer_id: BufferId::new(buffer),
        }
    }

    #[test]
    fn test_unknown_destination_floods() {
        let mut engine = L2Engine::new(0);
        let decision = engine.decide(frame(1, 0x0a, 0x0b, 1, 1)).unwrap();

        assert_eq!(decision.action, OutputPort::Flood);
        assert_eq!(decision.datapath, DatapathId::new(1));
        assert_eq!(decision.in_port, Some(PortNo::new(1)));
        assert_eq!(decision.buffer_id, BufferId::new(1));
    }

    #[test]
    fn test_flood_then_learned_port() {
        let mut engine = L2Engine::new(0);

        // X unknown to Y's switch: flood. Afterwards X is learned on
        // port 1, so the reply is forwarded there.
        let first = engine.decide(frame(1, 0x0a, 0x0b, 1, 1)).unwrap();
        assert_eq!(first.action, OutputPort::Flood);

        let second = engine.decide(frame(1, 0x0b, 0x0a, 2, 2)).unwrap();
        assert_eq!(second.action, OutputPort::Port(PortNo::new(1)));
        assert_eq!(second.in_port, Some(PortNo::new(2)));
    }

    #[test]
    fn test_learns_before_destination_lookup() {
        let mut engine = L2Engine::new(0);

        // A frame addressed to its own source: the learn step must land
        // before the lookup, so the just-learned port is found.
        let decision = engine.decide(frame(1, 0x0a, 0x0a, 3, 1)).unwrap();
        assert_eq!(decision.action, OutputPort::Port(PortNo::new(3)));
    }

    #[test]
    fn test_tables_are_partitioned_per_datapath() {
        let mut engine = L2Engine::new(0);
        engine.decide(frame(1, 0x0a, 0x0b, 1, 1)).unwrap();

        // Switch 2 never saw X: it floods where switch 1 would forward.
        let on_other_switch = engine.decide(frame(2, 0x0b, 0x0a, 2, 2)).unwrap();
        assert_eq!(on_other_switch.action, OutputPort::Flood);

        let on_same_switch = engine.decide(frame(1, 0x0b, 0x0a, 2, 3)).unwrap();
        assert_eq!(on_same_switch.action, OutputPort::Port(PortNo::new(1)));
    }

    #[test]
    fn test_station_move_updates_port() {
        let mut engine = L2Engine::new(0);
        engine.decide(frame(1, 0x0a, 0x0b, 1, 1)).unwrap();
        engine.decide(frame(1, 0x0a, 0x0b, 4, 2)).unwrap();

        let reply = engine.decide(frame(1, 0x0b, 0x0a, 2, 3)).unwrap();
        assert_eq!(reply.action, OutputPort::Port(PortNo::new(4)));
    }

    #[test]
    fn test_extra_load_does_not_change_decisions() {
        let mut loaded = L2Engine::new(10_000);
        let mut bare = L2Engine::new(0);

        let f = frame(1, 0x0a, 0x0b, 1, 1);
        assert_eq!(loaded.decide(f), bare.decide(f));
    }
}
