//! Topology descriptions and link-cost generation.

use crate::engine::DestinationResolver;
use crate::error::{Result, SpfError};
use ofdispatch_core::AdjacencyTable;
use ofdispatch_types::{DatapathId, MacAddress, PortNo};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One undirected link of the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    /// One end of the link.
    pub a: DatapathId,
    /// The other end.
    pub b: DatapathId,
    /// a's egress port toward b.
    pub port_a: PortNo,
    /// b's egress port toward a.
    pub port_b: PortNo,
    /// Fixed link cost; when absent the cost is rolled on every
    /// generation (startup and each `regen`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<u32>,
}

/// A traffic entry point for the synthetic injector: packets from `src`
/// enter the network at `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressSpec {
    /// Source identity of the injected packets.
    pub src: MacAddress,
    /// The datapath they enter at.
    pub origin: DatapathId,
}

/// A destination-resolution entry: traffic sourced by `src` is routed
/// toward `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Source identity.
    pub src: MacAddress,
    /// Target node for that source's traffic.
    pub target: DatapathId,
}

/// A complete topology description: the link set plus the destination
/// resolution rules and injector entry points.
///
/// Loaded once at startup from a JSON file, or taken from the built-in
/// reference topology. Costs are assigned by [`generate_costs`](Self::generate_costs);
/// the link set itself never changes at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySpec {
    /// All links, inserted symmetrically into the adjacency table.
    pub links: Vec<LinkSpec>,
    /// Source-specific routing targets.
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
    /// Target for sources without an explicit entry.
    pub default_target: DatapathId,
    /// Synthetic-traffic entry points.
    #[serde(default)]
    pub ingress: Vec<IngressSpec>,
}

/// The first evaluation host's MAC (routed toward sentinel node 200).
pub const HOST1_MAC: MacAddress = MacAddress::new([0x10, 0x10, 0x10, 0x00, 0x00, 0x00]);

/// The second evaluation host's MAC (routed toward sentinel node 100).
pub const HOST2_MAC: MacAddress = MacAddress::new([0x20, 0x20, 0x20, 0x00, 0x00, 0x00]);

/// The reference evaluation topology's links:
/// (a, b, port on a, port on b).
///
/// 23 switches in 7 tiers between two edge switches (1 and 2), with the
/// two hosts modeled as the sentinel nodes 100 and 200 hanging off the
/// edges.
const REFERENCE_LINKS: &[(u64, u64, u16, u16)] = &[
    (100, 1, 1, 1),
    (1, 11, 2, 1),
    (1, 12, 3, 2),
    (1, 13, 4, 1),
    (11, 12, 2, 1),
    (12, 13, 3, 2),
    (11, 21, 4, 1),
    (11, 22, 3, 2),
    (12, 22, 4, 3),
    (13, 22, 3, 4),
    (13, 23, 4, 1),
    (21, 22, 2, 1),
    (22, 23, 5, 2),
    (21, 31, 3, 1),
    (22, 31, 8, 2),
    (22, 32, 7, 2),
    (22, 33, 6, 2),
    (23, 33, 3, 1),
    (31, 32, 3, 1),
    (32, 33, 3, 3),
    (31, 41, 5, 1),
    (31, 42, 4, 2),
    (32, 42, 4, 3),
    (33, 42, 4, 4),
    (33, 43, 5, 1),
    (41, 42, 2, 1),
    (42, 43, 5, 2),
    (41, 51, 3, 1),
    (42, 51, 8, 2),
    (42, 52, 7, 2),
    (42, 53, 6, 2),
    (43, 53, 3, 1),
    (51, 52, 3, 1),
    (52, 53, 3, 3),
    (51, 61, 5, 1),
    (51, 62, 4, 2),
    (52, 62, 4, 3),
    (53, 62, 4, 4),
    (53, 63, 5, 1),
    (61, 62, 2, 1),
    (62, 63, 5, 2),
    (61, 71, 3, 1),
    (62, 71, 8, 2),
    (62, 72, 7, 2),
    (62, 73, 6, 2),
    (63, 73, 3, 1),
    (71, 72, 3, 1),
    (72, 73, 3, 3),
    (71, 2, 4, 2),
    (72, 2, 4, 3),
    (73, 2, 4, 4),
    (2, 200, 1, 1),
];

impl TopologySpec {
    /// The built-in reference evaluation topology.
    pub fn reference() -> Self {
        let links = REFERENCE_LINKS
            .iter()
            .map(|&(a, b, port_a, port_b)| LinkSpec {
                a: DatapathId::new(a),
                b: DatapathId::new(b),
                port_a: PortNo::new(port_a),
                port_b: PortNo::new(port_b),
                cost: None,
            })
            .collect();
        Self {
            links,
            targets: vec![TargetSpec {
                src: HOST1_MAC,
                target: DatapathId::new(200),
            }],
            default_target: DatapathId::new(100),
            ingress: vec![
                IngressSpec { src: HOST1_MAC, origin: DatapathId::new(1) },
                IngressSpec { src: HOST2_MAC, origin: DatapathId::new(2) },
            ],
        }
    }

    /// Loads a topology from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let spec: TopologySpec = serde_json::from_str(&data)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Validates the description.
    pub fn validate(&self) -> Result<()> {
        if self.links.is_empty() {
            return Err(SpfError::InvalidTopology("no links".to_string()));
        }
        for link in &self.links {
            if link.a == link.b {
                return Err(SpfError::InvalidTopology(format!(
                    "self link on datapath {}",
                    link.a
                )));
            }
            if link.cost == Some(0) {
                return Err(SpfError::InvalidTopology(format!(
                    "zero cost on link {}-{}",
                    link.a, link.b
                )));
            }
        }
        Ok(())
    }

    /// The destination resolver described by this topology.
    pub fn resolver(&self) -> DestinationResolver {
        let mut resolver = DestinationResolver::new(self.default_target);
        for entry in &self.targets {
            resolver = resolver.with_target(entry.src, entry.target);
        }
        resolver
    }

    /// Builds an adjacency table, rolling a uniform cost in 1..=100 for
    /// every link without a fixed one.
    ///
    /// Every link is inserted in both directions with the same cost.
    pub fn generate_costs(&self, rng: &mut StdRng) -> AdjacencyTable {
        let mut adj = AdjacencyTable::new();
        for link in &self.links {
            let cost = link.cost.unwrap_or_else(|| rng.gen_range(1..=100));
            adj.insert_link(link.a, link.b, link.port_a, link.port_b, cost);
        }
        adj
    }
}
