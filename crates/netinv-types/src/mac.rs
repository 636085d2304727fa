//! Hardware address type with normalizing parser.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 48-bit Ethernet hardware address.
///
/// Parsing accepts every notation devices commonly report and normalizes
/// them to the same value:
///
/// ```
/// use netinv_types::MacAddress;
///
/// let colon: MacAddress = "00:11:22:33:44:55".parse().unwrap();
/// let hyphen: MacAddress = "00-11-22-33-44-55".parse().unwrap();
/// let dotted: MacAddress = "0011.2233.4455".parse().unwrap();
/// let bare: MacAddress = "001122334455".parse().unwrap();
///
/// assert_eq!(colon, hyphen);
/// assert_eq!(colon, dotted);
/// assert_eq!(colon, bare);
/// assert_eq!(colon.to_string(), "00:11:22:33:44:55");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// The all-zero address some agents report for virtual interfaces.
    pub const ZERO: MacAddress = MacAddress([0; 6]);

    /// Group bit set; covers broadcast too.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Returns true if the address identifies a single piece of hardware.
    ///
    /// Zero, broadcast and multicast addresses show up in discovery output
    /// but never belong in the inventory.
    pub fn is_inventory_candidate(&self) -> bool {
        *self != Self::ZERO && !self.is_multicast()
    }

    fn from_hex_digits(digits: &str, original: &str) -> Result<Self, ParseError> {
        if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseError::InvalidMacAddress(original.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseError::InvalidMacAddress(original.to_string()))?;
        }
        Ok(MacAddress(bytes))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        // Colon/hyphen notation may drop leading zeros ("0:1b:2c:..."), so
        // pad each octet before joining.
        if let Some(separator) = [':', '-'].into_iter().find(|sep| trimmed.contains(*sep)) {
            let parts: Vec<&str> = trimmed.split(separator).collect();
            if parts.len() != 6 || parts.iter().any(|p| p.is_empty() || p.len() > 2) {
                return Err(ParseError::InvalidMacAddress(s.to_string()));
            }
            let digits: String = parts.iter().map(|p| format!("{:0>2}", p)).collect();
            return Self::from_hex_digits(&digits, s);
        }

        if trimmed.contains('.') {
            let parts: Vec<&str> = trimmed.split('.').collect();
            if parts.len() != 3 || parts.iter().any(|p| p.len() != 4) {
                return Err(ParseError::InvalidMacAddress(s.to_string()));
            }
            return Self::from_hex_digits(&parts.concat(), s);
        }

        Self::from_hex_digits(trimmed, s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_colon_format() {
        let mac: MacAddress = "00:11:22:33:44:55".parse().unwrap();
        assert_eq!(mac.to_string(), "00:11:22:33:44:55");

        let upper: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(upper.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_parse_short_octets() {
        let mac: MacAddress = "0:1b:2c:3:44:5".parse().unwrap();
        assert_eq!(mac.to_string(), "00:1b:2c:03:44:05");
    }

    #[test]
    fn test_parse_cisco_dotted() {
        let mac: MacAddress = "aabb.ccdd.eeff".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_parse_bare_and_prefixed_hex() {
        let bare: MacAddress = "AABBCCDDEEFF".parse().unwrap();
        let prefixed: MacAddress = "0xaabbccddeeff".parse().unwrap();
        assert_eq!(bare, prefixed);
        assert_eq!(bare.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_inventory_candidate() {
        assert!(!MacAddress::ZERO.is_inventory_candidate());
        let broadcast: MacAddress = "ff:ff:ff:ff:ff:ff".parse().unwrap();
        assert!(!broadcast.is_inventory_candidate());

        let multicast: MacAddress = "01:00:5e:00:00:01".parse().unwrap();
        assert!(!multicast.is_inventory_candidate());

        let unicast: MacAddress = "00:11:22:33:44:55".parse().unwrap();
        assert!(unicast.is_inventory_candidate());
    }

    #[test]
    fn test_invalid_format() {
        assert!("invalid".parse::<MacAddress>().is_err());
        assert!("00:11:22:33:44".parse::<MacAddress>().is_err());
        assert!("00:11:22:33:44:55:66".parse::<MacAddress>().is_err());
        assert!("gg:11:22:33:44:55".parse::<MacAddress>().is_err());
        assert!("0011.2233".parse::<MacAddress>().is_err());
        assert!("00112233445".parse::<MacAddress>().is_err());
        assert!("".parse::<MacAddress>().is_err());
    }
}
