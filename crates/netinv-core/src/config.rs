//! Inventory policy configuration.
//!
//! Loads the policy switches that drive interface defaulting, subnet
//! inference and diagnostics from a TOML file. Every key is optional and
//! falls back to the documented default.
//!
//! ```toml
//! if_snmp = true
//! if_overwrite_descr = false
//! update_device_ip_names = false
//! add_subnets = true
//! subnet_inherit_dev_info = false
//! max_neighbor_missed = 3
//! ignore_duplex = ["WS-C2950-24"]
//! ```

use crate::error::{InventoryError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Default location of the policy file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/netinv/netinv.toml";

/// Policy configuration injected into the interface manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Default for `Interface.snmp_managed` (IF_SNMP).
    #[serde(default = "default_if_snmp")]
    pub if_snmp: bool,

    /// Default for `Interface.overwrite_descr` (IF_OVERWRITE_DESCR).
    #[serde(default)]
    pub if_overwrite_descr: bool,

    /// Default for `Interface.auto_dns` (UPDATE_DEVICE_IP_NAMES).
    #[serde(default)]
    pub update_device_ip_names: bool,

    /// Infer and create subnets from discovered address masks (ADD_SUBNETS).
    #[serde(default = "default_add_subnets")]
    pub add_subnets: bool,

    /// Copy owner/used_by from the device onto inferred subnets
    /// (SUBNET_INHERIT_DEV_INFO).
    #[serde(default)]
    pub subnet_inherit_dev_info: bool,

    /// Consecutive polls a neighbor may go unseen before an automatic link
    /// is dropped.
    #[serde(default = "default_max_neighbor_missed")]
    pub max_neighbor_missed: u32,

    /// Device products known to misreport duplex (IGNORE_DUPLEX).
    #[serde(default)]
    pub ignore_duplex: Vec<String>,
}

fn default_if_snmp() -> bool {
    true
}

fn default_add_subnets() -> bool {
    true
}

fn default_max_neighbor_missed() -> u32 {
    3
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            if_snmp: default_if_snmp(),
            if_overwrite_descr: false,
            update_device_ip_names: false,
            add_subnets: default_add_subnets(),
            subnet_inherit_dev_info: false,
            max_neighbor_missed: default_max_neighbor_missed(),
            ignore_duplex: Vec::new(),
        }
    }
}

impl InventoryConfig {
    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| InventoryError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content).map_err(|e| match e {
                InventoryError::Config(msg) => {
                    InventoryError::Config(format!("{}: {}", path.display(), msg))
                }
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(InventoryError::Io(e)),
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| InventoryError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_neighbor_missed == 0 {
            return Err(InventoryError::Config(
                "max_neighbor_missed must be > 0".to_string(),
            ));
        }

        if self.ignore_duplex.iter().any(|p| p.trim().is_empty()) {
            return Err(InventoryError::Config(
                "ignore_duplex entries must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns true if duplex reports from this product should be ignored.
    pub fn ignores_duplex_for(&self, product: &str) -> bool {
        self.ignore_duplex
            .iter()
            .any(|p| p.trim().eq_ignore_ascii_case(product.trim()))
    }
}
