//! OpenFlow datapath identifier.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 64-bit OpenFlow datapath identifier (switch id).
///
/// The evaluation deployments also use sentinel datapath ids outside the
/// switch range to stand in for hosts when resolving path targets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DatapathId(u64);

impl DatapathId {
    /// Creates a datapath id from its raw value.
    pub const fn new(id: u64) -> Self {
        DatapathId(id)
    }

    /// Returns the raw value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DatapathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatapathId {
    type Err = ParseError;

    /// Parses a decimal or `0x`-prefixed hexadecimal datapath id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = if let Some(hex) = s.strip_prefix("0x") {
            u64::from_str_radix(hex, 16)
        } else {
            s.parse::<u64>()
        };
        parsed
            .map(DatapathId)
            .map_err(|_| ParseError::InvalidDatapathId(s.to_string()))
    }
}

impl From<u64> for DatapathId {
    fn from(id: u64) -> Self {
        DatapathId(id)
    }
}

impl From<DatapathId> for u64 {
    fn from(id: DatapathId) -> u64 {
        id.0
    }
}
