//! Shortest-path decision engine.

use ofdispatch_core::{AdjacencyTable, Decision, DecisionEngine};
use ofdispatch_types::{BufferId, DatapathId, MacAddress, OutputPort, PortNo};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// One packet awaiting a path computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRequest {
    /// Source identity of the packet.
    pub src: MacAddress,
    /// The datapath the packet entered the network at.
    pub origin: DatapathId,
    /// The switch-side buffer holding the packet.
    pub buffer_id: BufferId,
}

/// Maps a packet's source identity to the node its traffic is routed
/// toward.
///
/// The reference deployment knows exactly two hosts and routes each
/// host's traffic to the other's sentinel node; unknown sources fall
/// back to the default target.
#[derive(Debug, Clone)]
pub struct DestinationResolver {
    targets: HashMap<MacAddress, DatapathId>,
    default_target: DatapathId,
}

impl DestinationResolver {
    /// Creates a resolver that sends everything to `default_target`.
    pub fn new(default_target: DatapathId) -> Self {
        Self {
            targets: HashMap::new(),
            default_target,
        }
    }

    /// Adds a source-specific target.
    pub fn with_target(mut self, src: MacAddress, target: DatapathId) -> Self {
        self.targets.insert(src, target);
        self
    }

    /// Resolves the target node for a source identity.
    pub fn resolve(&self, src: &MacAddress) -> DatapathId {
        self.targets.get(src).copied().unwrap_or(self.default_target)
    }
}

/// Computes the minimum-cost path from `origin` to `target`.
///
/// Dijkstra with closed-set expansion, terminating as soon as the target
/// closes. Among equal tentative distances the lowest node id closes
/// first, and an equal-cost relaxation keeps the lower-id predecessor, so
/// the chosen path is deterministic and independent of map iteration
/// order.
///
/// Returns the node sequence (origin first, target last) and the total
/// cost, or `None` when `origin == target`, either node is unknown, or no
/// path exists.
pub fn shortest_path(
    adj: &AdjacencyTable,
    origin: DatapathId,
    target: DatapathId,
) -> Option<(Vec<DatapathId>, u32)> {
    if origin == target || !adj.contains(origin) || !adj.contains(target) {
        return None;
    }

    let mut dist: HashMap<DatapathId, u32> = HashMap::new();
    let mut pred: HashMap<DatapathId, DatapathId> = HashMap::new();
    let mut closed: HashSet<DatapathId> = HashSet::new();
    let mut heap: BinaryHeap<Reverse<(u32, DatapathId)>> = BinaryHeap::new();

    dist.insert(origin, 0);
    heap.push(Reverse((0, origin)));

    while let Some(Reverse((distance, node))) = heap.pop() {
        if !closed.insert(node) {
            // Superseded heap entry for an already-closed node.
            continue;
        }
        if node == target {
            let mut path = vec![target];
            let mut current = target;
            while current != origin {
                current = *pred.get(&current)?;
                path.push(current);
            }
            path.reverse();
            return Some((path, distance));
        }
        for (neighbor, link) in adj.neighbors(node) {
            if closed.contains(&neighbor) {
                continue;
            }
            let alt = distance + link.cost;
            let better = match dist.get(&neighbor) {
                None => true,
                Some(&current) => {
                    alt < current
                        || (alt == current
                            && pred.get(&neighbor).is_some_and(|&p| node < p))
                }
            };
            if better {
                dist.insert(neighbor, alt);
                pred.insert(neighbor, node);
                heap.push(Reverse((alt, neighbor)));
            }
        }
    }

    None
}

/// The egress port of the first hop on the minimum-cost path.
pub fn first_hop(
    adj: &AdjacencyTable,
    origin: DatapathId,
    target: DatapathId,
) -> Option<PortNo> {
    let (path, _) = shortest_path(adj, origin, target)?;
    adj.egress(origin, path[1])
}

/// The shortest-path variant of the decision engine.
///
/// Holds a private replica of the adjacency table, replaced wholesale on
/// every state broadcast.
pub struct SpfEngine {
    resolver: DestinationResolver,
    adj: AdjacencyTable,
}

impl SpfEngine {
    /// Creates an engine over an initial table (empty for pool workers,
    /// which are seeded by broadcast before any work arrives).
    pub fn new(resolver: DestinationResolver, adj: AdjacencyTable) -> Self {
        Self { resolver, adj }
    }
}

impl DecisionEngine for SpfEngine {
    type Item = PathRequest;
    type State = AdjacencyTable;

    fn apply_state(&mut self, state: AdjacencyTable) {
        self.adj = state;
    }

    fn decide(&mut self, item: PathRequest) -> Option<Decision> {
        let target = self.resolver.resolve(&item.src);
        let port = first_hop(&self.adj, item.origin, target)?;
        Some(Decision {
            datapath: item.origin,
            action: OutputPort::Port(port),
            buffer_id: item.buffer_id,
            in_port: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dpid(id: u64) -> DatapathId {
        DatapathId::new(id)
    }

    fn mac(first: u8) -> MacAddress {
        MacAddress::new([first, 0, 0, 0, 0, 0])
    }

    /// A(1) -- B(2) -- C(3) triangle: going through B costs 2, the direct
    /// edge costs 5.
    fn triangle() -> AdjacencyTable {
        let mut adj = AdjacencyTable::new();
        adj.insert_link(dpid(1), dpid(2), PortNo::new(1), PortNo::new(1), 1);
        adj.insert_link(dpid(2), dpid(3), PortNo::new(2), PortNo::new(1), 1);
        adj.insert_link(dpid(1), dpid(3), PortNo::new(2), PortNo::new(2), 5);
        adj
    }

    #[test]
    fn test_prefers_cheaper_two_hop_path() {
        let (path, cost) = shortest_path(&triangle(), dpid(1), dpid(3)).unwrap();
        assert_eq!(path, vec![dpid(1), dpid(2), dpid(3)]);
        assert_eq!(cost, 2);
        assert_eq!(first_hop(&triangle(), dpid(1), dpid(3)), Some(PortNo::new(1)));
    }

    #[test]
    fn test_path_cost_matches_edge_sum() {
        let adj = triangle();
        let (path, cost) = shortest_path(&adj, dpid(1), dpid(3)).unwrap();

        let summed: u32 = path
            .windows(2)
            .map(|pair| adj.link(pair[0], pair[1]).unwrap().cost)
            .sum();
        assert_eq!(cost, summed);
    }

    #[test]
    fn test_equal_cost_tie_breaks_to_lowest_id() {
        // Two cost-2 paths from 1 to 4: via 2 and via 3.
        let mut adj = AdjacencyTable::new();
        adj.insert_link(dpid(1), dpid(2), PortNo::new(1), PortNo::new(1), 1);
        adj.insert_link(dpid(1), dpid(3), PortNo::new(2), PortNo::new(1), 1);
        adj.insert_link(dpid(2), dpid(4), PortNo::new(2), PortNo::new(1), 1);
        adj.insert_link(dpid(3), dpid(4), PortNo::new(2), PortNo::new(2), 1);

        let (path, cost) = shortest_path(&adj, dpid(1), dpid(4)).unwrap();
        assert_eq!(cost, 2);
        assert_eq!(path, vec![dpid(1), dpid(2), dpid(4)]);
    }

    #[test]
    fn test_origin_equals_target_is_no_route() {
        assert_eq!(shortest_path(&triangle(), dpid(1), dpid(1)), None);
    }

    #[test]
    fn test_unknown_nodes_are_no_route() {
        assert_eq!(shortest_path(&triangle(), dpid(1), dpid(99)), None);
        assert_eq!(shortest_path(&triangle(), dpid(99), dpid(1)), None);
    }

    #[test]
    fn test_disconnected_target_is_no_route() {
        let mut adj = triangle();
        adj.insert_link(dpid(8), dpid(9), PortNo::new(1), PortNo::new(1), 1);

        assert_eq!(shortest_path(&adj, dpid(1), dpid(9)), None);
    }

    #[test]
    fn test_resolver_falls_back_to_default() {
        let resolver = DestinationResolver::new(dpid(100))
            .with_target(mac(0x10), dpid(200));

        assert_eq!(resolver.resolve(&mac(0x10)), dpid(200));
        assert_eq!(resolver.resolve(&mac(0x20)), dpid(100));
    }

    #[test]
    fn test_engine_decides_first_hop() {
        let resolver = DestinationResolver::new(dpid(3));
        let mut engine = SpfEngine::new(resolver, triangle());

        let decision = engine
            .decide(PathRequest {
                src: mac(0x20),
                origin: dpid(1),
                buffer_id: BufferId::new(7),
            })
            .unwrap();

        assert_eq!(decision.datapath, dpid(1));
        assert_eq!(decision.action, OutputPort::Port(PortNo::new(1)));
        assert_eq!(decision.buffer_id, BufferId::new(7));
        assert_eq!(decision.in_port, None);
    }

    #[test]
    fn test_engine_drops_unroutable_request() {
        let resolver = DestinationResolver::new(dpid(1));
        let mut engine = SpfEngine::new(resolver, triangle());

        // Target resolves to the origin itself: no route, no panic.
        let decision = engine.decide(PathRequest {
            src: mac(0x20),
            origin: dpid(1),
            buffer_id: BufferId::NONE,
        });
        assert_eq!(decision, None);
    }

    #[test]
    fn test_engine_recomputes_after_state_replace() {
        let resolver = DestinationResolver::new(dpid(3));
        let mut engine = SpfEngine::new(resolver, triangle());
        let request = PathRequest {
            src: mac(0x20),
            origin: dpid(1),
            buffer_id: BufferId::NONE,
        };
        assert_eq!(
            engine.decide(request).unwrap().action,
            OutputPort::Port(PortNo::new(1))
        );

        // Make the direct edge the cheap one and replace the snapshot.
        let mut updated = AdjacencyTable::new();
        updated.insert_link(dpid(1), dpid(2), PortNo::new(1), PortNo::new(1), 10);
        updated.insert_link(dpid(2), dpid(3), PortNo::new(2), PortNo::new(1), 10);
        updated.insert_link(dpid(1), dpid(3), PortNo::new(2), PortNo::new(2), 5);
        engine.apply_state(updated);

        assert_eq!(
            engine.decide(request).unwrap().action,
            OutputPort::Port(PortNo::new(2))
        );
    }
}
