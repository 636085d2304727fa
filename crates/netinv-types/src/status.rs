//! Interface link state as reported by discovery (IF-MIB / EtherLike-MIB).

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Administrative state of an interface (ifAdminStatus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminStatus {
    Up,
    Down,
    Testing,
}

impl AdminStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AdminStatus::Up => "up",
            AdminStatus::Down => "down",
            AdminStatus::Testing => "testing",
        }
    }
}

impl fmt::Display for AdminStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "1" => Ok(AdminStatus::Up),
            "down" | "2" => Ok(AdminStatus::Down),
            "testing" | "3" => Ok(AdminStatus::Testing),
            _ => Err(ParseError::InvalidStatus(s.to_string())),
        }
    }
}

/// Operational state of an interface (ifOperStatus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperStatus {
    Up,
    Down,
    Testing,
    Unknown,
    Dormant,
    NotPresent,
    LowerLayerDown,
}

impl OperStatus {
    /// Returns true if the interface is operationally up.
    pub const fn is_up(&self) -> bool {
        matches!(self, OperStatus::Up)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OperStatus::Up => "up",
            OperStatus::Down => "down",
            OperStatus::Testing => "testing",
            OperStatus::Unknown => "unknown",
            OperStatus::Dormant => "dormant",
            OperStatus::NotPresent => "notPresent",
            OperStatus::LowerLayerDown => "lowerLayerDown",
        }
    }
}

impl fmt::Display for OperStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "1" => Ok(OperStatus::Up),
            "down" | "2" => Ok(OperStatus::Down),
            "testing" | "3" => Ok(OperStatus::Testing),
            "unknown" | "4" => Ok(OperStatus::Unknown),
            "dormant" | "5" => Ok(OperStatus::Dormant),
            "notpresent" | "6" => Ok(OperStatus::NotPresent),
            "lowerlayerdown" | "7" => Ok(OperStatus::LowerLayerDown),
            _ => Err(ParseError::InvalidStatus(s.to_string())),
        }
    }
}

/// Duplex mode of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Duplex {
    Full,
    Half,
    Auto,
    Unknown,
}

impl Duplex {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Duplex::Full => "full",
            Duplex::Half => "half",
            Duplex::Auto => "auto",
            Duplex::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Duplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Duplex {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // dot3StatsDuplexStatus: unknown(1), halfDuplex(2), fullDuplex(3)
        match s.trim().to_lowercase().as_str() {
            "full" | "fullduplex" | "3" => Ok(Duplex::Full),
            "half" | "halfduplex" | "2" => Ok(Duplex::Half),
            "auto" => Ok(Duplex::Auto),
            "unknown" | "1" => Ok(Duplex::Unknown),
            _ => Err(ParseError::InvalidStatus(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oper_status_parse() {
        assert_eq!("up".parse::<OperStatus>().unwrap(), OperStatus::Up);
        assert_eq!("1".parse::<OperStatus>().unwrap(), OperStatus::Up);
        assert_eq!(
            "lowerLayerDown".parse::<OperStatus>().unwrap(),
            OperStatus::LowerLayerDown
        );
        assert!("sideways".parse::<OperStatus>().is_err());
    }

    #[test]
    fn test_duplex_parse() {
        assert_eq!("fullDuplex".parse::<Duplex>().unwrap(), Duplex::Full);
        assert_eq!("half".parse::<Duplex>().unwrap(), Duplex::Half);
        assert_eq!("2".parse::<Duplex>().unwrap(), Duplex::Half);
    }

    #[test]
    fn test_display_round_trip() {
        assert_eq!(OperStatus::NotPresent.to_string(), "notPresent");
        assert_eq!(AdminStatus::Testing.to_string(), "testing");
        assert_eq!(Duplex::Full.to_string(), "full");
    }
}
