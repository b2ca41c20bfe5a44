//! Common types for the ofdispatch control plane.
//!
//! This crate provides type-safe representations of the network primitives
//! shared by the ofdispatch daemons:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`DatapathId`]: OpenFlow datapath identifiers
//! - [`PortNo`]: switch port numbers
//! - [`OutputPort`]: a forwarding action (specific port or flood)
//! - [`BufferId`]: switch-side packet buffer handles

mod datapath;
mod mac;
mod port;

pub use datapath::DatapathId;
pub use mac::MacAddress;
pub use port::{BufferId, OutputPort, PortNo};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid datapath id: {0}")]
    InvalidDatapathId(String),

    #[error("invalid port number: {0}")]
    InvalidPortNo(String),
}
