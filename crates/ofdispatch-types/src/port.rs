//! Switch port numbers, forwarding actions, and packet buffer handles.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A physical switch port number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PortNo(u16);

impl PortNo {
    /// Creates a port number from its raw value.
    pub const fn new(port: u16) -> Self {
        PortNo(port)
    }

    /// Returns the raw value.
    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for PortNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PortNo {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u16>()
            .map(PortNo)
            .map_err(|_| ParseError::InvalidPortNo(s.to_string()))
    }
}

impl From<u16> for PortNo {
    fn from(port: u16) -> Self {
        PortNo(port)
    }
}

/// The forwarding action computed for a packet: send out of one specific
/// port, or flood out of all ports (the learning switch's response to an
/// unknown destination).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputPort {
    /// Forward out of a single port.
    Port(PortNo),
    /// Flood out of all ports.
    Flood,
}

impl OutputPort {
    /// Returns the specific port, if the action is not a flood.
    pub const fn port(&self) -> Option<PortNo> {
        match self {
            OutputPort::Port(p) => Some(*p),
            OutputPort::Flood => None,
        }
    }

    /// Returns true if the action is a flood.
    pub const fn is_flood(&self) -> bool {
        matches!(self, OutputPort::Flood)
    }
}

impl fmt::Display for OutputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputPort::Port(p) => write!(f, "port {}", p),
            OutputPort::Flood => write!(f, "flood"),
        }
    }
}

/// A switch-side packet buffer handle.
///
/// Carried through the decision pipeline untouched; the network boundary
/// echoes it back so the switch can release the buffered packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BufferId(u32);

impl BufferId {
    /// The "no buffer" sentinel (the packet was not buffered).
    pub const NONE: BufferId = BufferId(u32::MAX);

    /// Creates a buffer id from its raw value.
    pub const fn new(id: u32) -> Self {
        BufferId(id)
    }

    /// Returns the raw value.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns true if this is the "no buffer" sentinel.
    pub const fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_port_no_parse() {
        let port: PortNo = "4".parse().unwrap();
        assert_eq!(port, PortNo::new(4));
        assert!("x".parse::<PortNo>().is_err());
        assert!("70000".parse::<PortNo>().is_err());
    }

    #[test]
    fn test_output_port_accessors() {
        assert_eq!(OutputPort::Port(PortNo::new(2)).port(), Some(PortNo::new(2)));
        assert_eq!(OutputPort::Flood.port(), None);
        assert!(OutputPort::Flood.is_flood());
        assert!(!OutputPort::Port(PortNo::new(1)).is_flood());
    }

    #[test]
    fn test_output_port_display() {
        assert_eq!(OutputPort::Port(PortNo::new(3)).to_string(), "port 3");
        assert_eq!(OutputPort::Flood.to_string(), "flood");
    }

    #[test]
    fn test_buffer_id_none() {
        assert!(BufferId::NONE.is_none());
        assert!(!BufferId::new(7).is_none());
        assert_eq!(BufferId::NONE.to_string(), "none");
        assert_eq!(BufferId::new(7).to_string(), "7");
    }
}
