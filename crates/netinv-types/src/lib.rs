//! Common network inventory types.
//!
//! This crate provides type-safe representations of the primitives the
//! inventory engine reconciles against discovered device state:
//!
//! - [`MacAddress`]: 48-bit hardware addresses with normalization of the
//!   usual vendor notations
//! - [`IpAddress`]: IPv4 and IPv6 addresses
//! - [`IpPrefix`]: IP network prefixes (CIDR notation) and mask arithmetic
//! - [`VlanId`]: IEEE 802.1Q VLAN identifiers
//! - [`AdminStatus`], [`OperStatus`], [`Duplex`]: interface link state

mod ip;
mod mac;
mod status;
mod vlan;

pub use ip::{IpAddress, IpPrefix, IpVersion, Ipv4Address, Ipv6Address};
pub use mac::MacAddress;
pub use status::{AdminStatus, Duplex, OperStatus};
pub use vlan::VlanId;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid IP prefix format: {0}")]
    InvalidIpPrefix(String),

    #[error("invalid netmask: {0}")]
    InvalidNetmask(String),

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(u16),

    #[error("invalid interface status: {0}")]
    InvalidStatus(String),
}
