//! 802.1Q VLAN identifiers.

use crate::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Routed VLAN interface names: `Vlan100`, `vlan 100`, `Vl100`, `VLAN-100`.
static VLAN_IF_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:vlan|vl)[\s-]*(\d{1,4})\s*$").expect("valid VLAN name regex")
});

/// A VLAN id in the usable 802.1Q range.
///
/// ```
/// use netinv_types::VlanId;
///
/// let vlan = VlanId::new(100).unwrap();
/// assert_eq!(vlan.as_u16(), 100);
/// assert!(VlanId::new(0).is_err());
/// assert!(VlanId::new(4095).is_err());
///
/// assert_eq!(VlanId::from_interface_name("Vl100"), Some(vlan));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    /// VLAN 1. Owned by the inventory, never renamed from discovery.
    pub const DEFAULT: VlanId = VlanId(1);

    const USABLE: RangeInclusive<u16> = 1..=4094;

    pub fn new(id: u16) -> Result<Self, ParseError> {
        if Self::USABLE.contains(&id) {
            Ok(VlanId(id))
        } else {
            Err(ParseError::InvalidVlanId(id))
        }
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    pub const fn is_default(self) -> bool {
        self.0 == Self::DEFAULT.0
    }

    /// The VLAN a routed interface name refers to, if it names one.
    ///
    /// Names that are not VLAN interfaces, or carry an id outside the usable
    /// range, give `None`.
    pub fn from_interface_name(name: &str) -> Option<Self> {
        let digits = VLAN_IF_NAME.captures(name)?.get(1)?.as_str();
        Self::new(digits.parse().ok()?).ok()
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for VlanId {
    type Error = ParseError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        VlanId::new(id)
    }
}

impl From<VlanId> for u16 {
    fn from(vlan: VlanId) -> u16 {
        vlan.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vid(name: &str) -> Option<u16> {
        VlanId::from_interface_name(name).map(VlanId::as_u16)
    }

    #[test]
    fn test_usable_range() {
        assert_eq!(VlanId::new(1).unwrap(), VlanId::DEFAULT);
        assert_eq!(VlanId::new(4094).unwrap().as_u16(), 4094);
        assert_eq!(VlanId::new(0), Err(ParseError::InvalidVlanId(0)));
        assert_eq!(VlanId::new(4095), Err(ParseError::InvalidVlanId(4095)));
    }

    #[test]
    fn test_interface_names() {
        assert_eq!(vid("Vlan100"), Some(100));
        assert_eq!(vid("vlan 200"), Some(200));
        assert_eq!(vid("Vl300"), Some(300));
        assert_eq!(vid(" VLAN-42 "), Some(42));
    }

    #[test]
    fn test_non_vlan_names() {
        assert_eq!(vid("GigabitEthernet0/1"), None);
        assert_eq!(vid("Vlan5000"), None);
        assert_eq!(vid("Vlan0"), None);
        assert_eq!(vid("vlanif"), None);
        assert_eq!(vid("100"), None);
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        assert!(VlanId::try_from(4095).is_err());
        assert_eq!(u16::from(VlanId::DEFAULT), 1);
    }
}
