//! Weighted adjacency table of the switch topology.

use ofdispatch_types::{DatapathId, PortNo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One directed half of a link: the egress port toward a neighbor and the
/// link cost.
///
/// Costs are positive; a cost of zero is rejected by [`AdjacencyTable::insert_link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Egress port toward the neighbor.
    pub port: PortNo,
    /// Link cost (positive).
    pub cost: u32,
}

/// Weighted graph of network nodes used for shortest-path computation.
///
/// Symmetric by construction: [`insert_link`](Self::insert_link) writes the
/// entry in both directions, so every link is reachable from either end.
/// Exactly one authoritative copy lives in the coordinator; every worker
/// holds an eventually-consistent replica updated only via explicit
/// state broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyTable {
    nodes: HashMap<DatapathId, HashMap<DatapathId, Link>>,
}

impl AdjacencyTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a symmetric link between `a` and `b`.
    ///
    /// `port_a` is a's egress toward b, `port_b` is b's egress toward a;
    /// both directions share the same cost. Returns false (and inserts
    /// nothing) for a zero cost or a self link.
    pub fn insert_link(
        &mut self,
        a: DatapathId,
        b: DatapathId,
        port_a: PortNo,
        port_b: PortNo,
        cost: u32,
    ) -> bool {
        if cost == 0 || a == b {
            return false;
        }
        self.nodes
            .entry(a)
            .or_default()
            .insert(b, Link { port: port_a, cost });
        self.nodes
            .entry(b)
            .or_default()
            .insert(a, Link { port: port_b, cost });
        true
    }

    /// Returns true if the node is present.
    pub fn contains(&self, node: DatapathId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Number of nodes in the table.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the table holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all node ids.
    pub fn node_ids(&self) -> impl Iterator<Item = DatapathId> + '_ {
        self.nodes.keys().copied()
    }

    /// Iterates over a node's neighbors with their link attributes.
    ///
    /// Yields nothing for an unknown node.
    pub fn neighbors(
        &self,
        node: DatapathId,
    ) -> impl Iterator<Item = (DatapathId, Link)> + '_ {
        self.nodes
            .get(&node)
            .into_iter()
            .flat_map(|n| n.iter().map(|(id, link)| (*id, *link)))
    }

    /// Returns the link attributes of the directed edge `from -> to`.
    pub fn link(&self, from: DatapathId, to: DatapathId) -> Option<Link> {
        self.nodes.get(&from)?.get(&to).copied()
    }

    /// Returns the egress port of the directed edge `from -> to`.
    pub fn egress(&self, from: DatapathId, to: DatapathId) -> Option<PortNo> {
        self.link(from, to).map(|l| l.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dpid(id: u64) -> DatapathId {
        DatapathId::new(id)
    }

    #[test]
    fn test_insert_link_is_symmetric() {
        let mut adj = AdjacencyTable::new();
        assert!(adj.insert_link(dpid(1), dpid(2), PortNo::new(3), PortNo::new(4), 7));

        assert_eq!(
            adj.link(dpid(1), dpid(2)),
            Some(Link { port: PortNo::new(3), cost: 7 })
        );
        assert_eq!(
            adj.link(dpid(2), dpid(1)),
            Some(Link { port: PortNo::new(4), cost: 7 })
        );
        assert_eq!(adj.node_count(), 2);
    }

    #[test]
    fn test_insert_rejects_zero_cost_and_self_link() {
        let mut adj = AdjacencyTable::new();
        assert!(!adj.insert_link(dpid(1), dpid(2), PortNo::new(1), PortNo::new(1), 0));
        assert!(!adj.insert_link(dpid(1), dpid(1), PortNo::new(1), PortNo::new(2), 5));
        assert!(adj.is_empty());
    }

    #[test]
    fn test_egress_lookup() {
        let mut adj = AdjacencyTable::new();
        adj.insert_link(dpid(1), dpid(11), PortNo::new(2), PortNo::new(1), 10);

        assert_eq!(adj.egress(dpid(1), dpid(11)), Some(PortNo::new(2)));
        assert_eq!(adj.egress(dpid(11), dpid(1)), Some(PortNo::new(1)));
        assert_eq!(adj.egress(dpid(1), dpid(99)), None);
    }

    #[test]
    fn test_neighbors_unknown_node_is_empty() {
        let adj = AdjacencyTable::new();
        assert_eq!(adj.neighbors(dpid(5)).count(), 0);
    }

    #[test]
    fn test_reinsert_replaces_cost() {
        let mut adj = AdjacencyTable::new();
        adj.insert_link(dpid(1), dpid(2), PortNo::new(1), PortNo::new(1), 5);
        adj.insert_link(dpid(1), dpid(2), PortNo::new(1), PortNo::new(1), 9);

        assert_eq!(adj.link(dpid(1), dpid(2)).unwrap().cost, 9);
        assert_eq!(adj.link(dpid(2), dpid(1)).unwrap().cost, 9);
    }
}
