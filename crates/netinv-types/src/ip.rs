//! IP address and prefix types with safe parsing and mask arithmetic.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// An IPv4 address wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ipv4Address(Ipv4Addr);

impl Ipv4Address {
    pub const fn inner(&self) -> Ipv4Addr {
        self.0
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Ipv4Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Ipv4Addr>()
            .map(Ipv4Address)
            .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
    }
}

/// An IPv6 address wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ipv6Address(Ipv6Addr);

impl Ipv6Address {
    pub const fn inner(&self) -> Ipv6Addr {
        self.0
    }
}

impl fmt::Display for Ipv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Ipv6Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Ipv6Addr>()
            .map(Ipv6Address)
            .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
    }
}

/// IP protocol version of an address or block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Prefix length of a single host address.
    pub const fn host_prefix_len(&self) -> u8 {
        match self {
            IpVersion::V4 => 32,
            IpVersion::V6 => 128,
        }
    }

    pub const fn as_u8(&self) -> u8 {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl TryFrom<u8> for IpVersion {
    type Error = ParseError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            4 => Ok(IpVersion::V4),
            6 => Ok(IpVersion::V6),
            other => Err(ParseError::InvalidIpAddress(format!(
                "unknown IP version {}",
                other
            ))),
        }
    }
}

impl From<IpVersion> for u8 {
    fn from(v: IpVersion) -> u8 {
        v.as_u8()
    }
}

/// An IP address that can be either IPv4 or IPv6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IpAddress {
    V4(Ipv4Address),
    V6(Ipv6Address),
}

impl IpAddress {
    /// Returns the protocol version of this address.
    pub const fn version(&self) -> IpVersion {
        match self {
            IpAddress::V4(_) => IpVersion::V4,
            IpAddress::V6(_) => IpVersion::V6,
        }
    }

    /// Returns true for 127.0.0.0/8 and ::1.
    pub fn is_loopback(&self) -> bool {
        IpAddr::from(*self).is_loopback()
    }

    /// The address as an unsigned integer, IPv4 in the low 32 bits.
    pub fn to_bits(&self) -> u128 {
        match self {
            IpAddress::V4(addr) => u128::from(u32::from(addr.inner())),
            IpAddress::V6(addr) => u128::from(addr.inner()),
        }
    }

    fn from_bits(version: IpVersion, bits: u128) -> Self {
        match version {
            // Truncation is the intent: only the low 32 bits carry IPv4.
            IpVersion::V4 => IpAddress::V4(Ipv4Address(Ipv4Addr::from(bits as u32))),
            IpVersion::V6 => IpAddress::V6(Ipv6Address(Ipv6Addr::from(bits))),
        }
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpAddress::V4(addr) => addr.fmt(f),
            IpAddress::V6(addr) => addr.fmt(f),
        }
    }
}

impl FromStr for IpAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(':') {
            s.parse::<Ipv6Address>().map(IpAddress::V6)
        } else {
            s.parse::<Ipv4Address>().map(IpAddress::V4)
        }
    }
}

impl From<IpAddress> for IpAddr {
    fn from(addr: IpAddress) -> Self {
        match addr {
            IpAddress::V4(a) => IpAddr::V4(a.inner()),
            IpAddress::V6(a) => IpAddr::V6(a.inner()),
        }
    }
}

/// An IP prefix in CIDR notation (e.g., 10.0.0.0/24 or 2001:db8::/32).
///
/// The stored address is kept as given; [`IpPrefix::network`] masks off the
/// host bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IpPrefix {
    address: IpAddress,
    prefix_len: u8,
}

impl IpPrefix {
    /// Creates a new IP prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix length is invalid for the address type
    /// (>32 for IPv4, >128 for IPv6).
    pub fn new(address: IpAddress, prefix_len: u8) -> Result<Self, ParseError> {
        let max_len = address.version().host_prefix_len();

        if prefix_len > max_len {
            return Err(ParseError::InvalidIpPrefix(format!(
                "prefix length {} exceeds maximum {} for address type",
                prefix_len, max_len
            )));
        }

        Ok(IpPrefix {
            address,
            prefix_len,
        })
    }

    /// The host prefix (/32 or /128) for a single address.
    pub fn host(address: IpAddress) -> Self {
        IpPrefix {
            address,
            prefix_len: address.version().host_prefix_len(),
        }
    }

    /// Builds a prefix from an address and a mask.
    ///
    /// The mask may be a prefix length (`"30"`, `"/64"`) or a dotted/colon
    /// netmask of the same family (`"255.255.255.252"`,
    /// `"ffff:ffff:ffff:ffff::"`). Non-contiguous masks are rejected.
    pub fn from_mask(address: IpAddress, mask: &str) -> Result<Self, ParseError> {
        let mask = mask.trim();
        let len_str = mask.strip_prefix('/').unwrap_or(mask);

        if let Ok(len) = len_str.parse::<u8>() {
            return Self::new(address, len);
        }

        let mask_addr: IpAddress = mask
            .parse()
            .map_err(|_| ParseError::InvalidNetmask(mask.to_string()))?;
        if mask_addr.version() != address.version() {
            return Err(ParseError::InvalidNetmask(mask.to_string()));
        }

        let width = u32::from(address.version().host_prefix_len());
        // Left-align the mask in 128 bits so both families share one check.
        let aligned = mask_addr.to_bits() << (128 - width);
        let ones = aligned.leading_ones();
        if aligned.checked_shl(ones).unwrap_or(0) != 0 {
            return Err(ParseError::InvalidNetmask(mask.to_string()));
        }

        // `ones` is bounded by `width`, which fits in u8.
        Self::new(address, ones as u8)
    }

    /// Returns the address this prefix was built from.
    pub const fn address(&self) -> &IpAddress {
        &self.address
    }

    /// Returns the prefix length in bits.
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub const fn version(&self) -> IpVersion {
        self.address.version()
    }

    /// Returns the network address (host bits cleared).
    pub fn network_address(&self) -> IpAddress {
        let width = u32::from(self.version().host_prefix_len());
        let host_bits = width - u32::from(self.prefix_len);
        let bits = self.address.to_bits();
        let masked = if host_bits >= 128 {
            0
        } else {
            (bits >> host_bits) << host_bits
        };
        IpAddress::from_bits(self.version(), masked)
    }

    /// Returns this prefix with host bits cleared.
    pub fn network(&self) -> IpPrefix {
        IpPrefix {
            address: self.network_address(),
            prefix_len: self.prefix_len,
        }
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for IpPrefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, len_str) = s
            .rsplit_once('/')
            .ok_or_else(|| ParseError::InvalidIpPrefix(s.to_string()))?;

        let address: IpAddress = addr_str.parse()?;
        let prefix_len: u8 = len_str
            .parse()
            .map_err(|_| ParseError::InvalidIpPrefix(s.to_string()))?;

        IpPrefix::new(address, prefix_len)
    }
}
