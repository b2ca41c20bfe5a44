//! Learned forwarding tables, partitioned per datapath.

use ofdispatch_types::{DatapathId, MacAddress, PortNo};
use std::collections::HashMap;

/// Per-device mapping from observed source MAC to ingress port.
///
/// Built incrementally from traffic; there is no aging.
#[derive(Debug, Clone, Default)]
pub struct ForwardingTable {
    entries: HashMap<MacAddress, PortNo>,
}

impl ForwardingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `src` was seen entering on `port`.
    ///
    /// Returns the previous port for `src`, if any (a station move).
    pub fn learn(&mut self, src: MacAddress, port: PortNo) -> Option<PortNo> {
        self.entries.insert(src, port)
    }

    /// Looks up the learned port for a destination.
    pub fn lookup(&self, dst: &MacAddress) -> Option<PortNo> {
        self.entries.get(dst).copied()
    }

    /// Number of learned stations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been learned yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Forwarding tables for all datapaths, keyed by datapath id.
///
/// In multi-worker mode every worker that happens to receive frames for a
/// datapath builds its own partial instance of that datapath's table from
/// the traffic it saw; replicas on different workers may diverge (one
/// worker floods a destination another has already learned). The
/// divergence only costs extra floods, never misdelivery.
#[derive(Debug, Clone, Default)]
pub struct ForwardingTables {
    tables: HashMap<DatapathId, ForwardingTable>,
}

impl ForwardingTables {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table for a datapath, creating it on first use.
    pub fn table_mut(&mut self, datapath: DatapathId) -> &mut ForwardingTable {
        self.tables.entry(datapath).or_default()
    }

    /// Returns the table for a datapath, if any frame has been seen for it.
    pub fn get(&self, datapath: DatapathId) -> Option<&ForwardingTable> {
        self.tables.get(&datapath)
    }

    /// Number of datapaths with at least one observed frame.
    pub fn datapath_count(&self) -> usize {
        self.tables.len()
    }

    /// Total learned stations across all datapaths.
    pub fn station_count(&self) -> usize {
        self.tables.values().map(|t| t.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mac(last: u8) -> MacAddress {
        MacAddress::new([0, 0, 0, 0, 0, last])
    }

    #[test]
    fn test_learn_and_lookup() {
        let mut table = ForwardingTable::new();
        assert!(table.lookup(&mac(1)).is_none());

        assert_eq!(table.learn(mac(1), PortNo::new(4)), None);
        assert_eq!(table.lookup(&mac(1)), Some(PortNo::new(4)));
    }

    #[test]
    fn test_learn_reports_station_move() {
        let mut table = ForwardingTable::new();
        table.learn(mac(1), PortNo::new(4));

        assert_eq!(table.learn(mac(1), PortNo::new(2)), Some(PortNo::new(4)));
        assert_eq!(table.lookup(&mac(1)), Some(PortNo::new(2)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_tables_partitioned_by_datapath() {
        let mut tables = ForwardingTables::new();
        tables.table_mut(DatapathId::new(1)).learn(mac(1), PortNo::new(1));
        tables.table_mut(DatapathId::new(2)).learn(mac(1), PortNo::new(9));

        assert_eq!(
            tables.get(DatapathId::new(1)).unwrap().lookup(&mac(1)),
            Some(PortNo::new(1))
        );
        assert_eq!(
            tables.get(DatapathId::new(2)).unwrap().lookup(&mac(1)),
            Some(PortNo::new(9))
        );
        assert!(tables.get(DatapathId::new(3)).is_none());
        assert_eq!(tables.datapath_count(), 2);
    }
}
