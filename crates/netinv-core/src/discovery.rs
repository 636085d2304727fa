//! Parsed discovery payload for a single interface.
//!
//! The collector hands the reconciler one [`DiscoveredInterface`] per polled
//! interface. Every section is optional; an absent section means "not
//! reported this poll" and leaves the matching stored state untouched.

use crate::config::InventoryConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scalar interface attributes as reported by the device.
///
/// Status and duplex values are kept as reported (`"up"`, `"2"`,
/// `"fullDuplex"`, ...) and parsed during reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceInfo {
    pub number: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub if_type: Option<String>,
    pub description: Option<String>,
    pub speed: Option<u64>,
    pub admin_status: Option<String>,
    pub oper_status: Option<String>,
    pub admin_duplex: Option<String>,
    pub oper_duplex: Option<String>,
    pub stp_id: Option<String>,
    pub bpdu_guard_enabled: Option<bool>,
    pub bpdu_filter_enabled: Option<bool>,
    pub loop_guard_enabled: Option<bool>,
    pub root_guard_enabled: Option<bool>,
    pub dp_remote_id: Option<String>,
    pub dp_remote_ip: Option<String>,
    pub dp_remote_port: Option<String>,
    pub dp_remote_type: Option<String>,
}

/// A VLAN the interface is a member of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveredVlan {
    pub name: Option<String>,
    /// STP instance number the VLAN is mapped to on this device.
    pub stp_instance: Option<u32>,
}

/// Per-instance spanning-tree state of this port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StpPortState {
    pub des_bridge: Option<String>,
    pub des_port: Option<String>,
    pub state: Option<String>,
}

impl StpPortState {
    pub fn is_empty(&self) -> bool {
        self.des_bridge.is_none() && self.des_port.is_none() && self.state.is_none()
    }
}

/// An address configured on the interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveredIp {
    /// Dotted netmask, colon netmask or prefix length.
    pub mask: Option<String>,
}

/// Everything discovery reported about one interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredInterface {
    #[serde(default)]
    pub info: InterfaceInfo,

    /// Hardware address in any accepted notation. `None` clears the stored
    /// reference.
    #[serde(default)]
    pub physaddr: Option<String>,

    /// VLAN memberships keyed by vid.
    #[serde(default)]
    pub vlans: Option<BTreeMap<u16, DiscoveredVlan>>,

    /// Addresses keyed by address string.
    #[serde(default)]
    pub ips: Option<BTreeMap<String, DiscoveredIp>>,

    /// Port STP state keyed by instance number.
    #[serde(default)]
    pub stp_instances: BTreeMap<u32, StpPortState>,
}

impl DiscoveredInterface {
    pub fn with_info(info: InterfaceInfo) -> Self {
        Self {
            info,
            ..Default::default()
        }
    }

    pub fn with_physaddr(mut self, physaddr: impl Into<String>) -> Self {
        self.physaddr = Some(physaddr.into());
        self
    }

    /// Adds a VLAN membership, creating the `vlans` section if needed.
    pub fn with_vlan(
        mut self,
        vid: u16,
        name: impl Into<String>,
        stp_instance: Option<u32>,
    ) -> Self {
        self.vlans.get_or_insert_with(BTreeMap::new).insert(
            vid,
            DiscoveredVlan {
                name: Some(name.into()),
                stp_instance,
            },
        );
        self
    }

    /// Adds an address, creating the `ips` section if needed.
    pub fn with_ip(mut self, address: impl Into<String>, mask: Option<&str>) -> Self {
        self.ips.get_or_insert_with(BTreeMap::new).insert(
            address.into(),
            DiscoveredIp {
                mask: mask.map(str::to_string),
            },
        );
        self
    }

    pub fn with_stp_state(mut self, instance: u32, state: StpPortState) -> Self {
        self.stp_instances.insert(instance, state);
        self
    }
}

/// One discovered interface bound to its stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryEntry {
    pub interface: crate::model::InterfaceId,
    #[serde(default)]
    pub record: DiscoveredInterface,
}

/// Per-poll options for reconciliation.
///
/// `Default` is the built-in policy; `InterfaceMgr::default_options` follows
/// the manager's configuration instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    /// Infer subnets from discovered masks.
    pub add_subnets: bool,
    /// Copy owner/used_by from the device onto new subnets.
    pub subnet_inherit: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            add_subnets: true,
            subnet_inherit: false,
        }
    }
}

impl From<&InventoryConfig> for ReconcileOptions {
    fn from(config: &InventoryConfig) -> Self {
        Self {
            add_subnets: config.add_subnets,
            subnet_inherit: config.subnet_inherit_dev_info,
        }
    }
}
