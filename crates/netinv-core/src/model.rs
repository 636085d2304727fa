//! Inventory records.
//!
//! Records reference each other by id. An id of `0` is never assigned by a
//! store; records built for insertion carry `id: 0` until the store returns
//! them with their assigned id.

use chrono::{DateTime, Utc};
use netinv_types::{
    AdminStatus, Duplex, IpAddress, IpPrefix, IpVersion, MacAddress, OperStatus, VlanId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type DeviceId = u64;
pub type InterfaceId = u64;
pub type PhysAddrId = u64;
pub type VlanRecordId = u64;
pub type InterfaceVlanId = u64;
pub type StpInstanceId = u64;
pub type IpblockId = u64;
pub type MonitorStatusId = u64;
/// Id of an owning organization/contact entity (read-only here).
pub type EntityId = u64;

/// Name of the monitor status new interfaces start in.
pub const UNKNOWN_MONITOR_STATUS: &str = "Unknown";

/// Provenance of an interface record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocStatus {
    /// Entered or edited by an operator.
    #[default]
    Manual,
    /// Populated by discovery.
    Snmp,
}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocStatus::Manual => f.write_str("manual"),
            DocStatus::Snmp => f.write_str("snmp"),
        }
    }
}

/// Device collaborator. Read-only from the engine's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// True when the device routes (ipForwarding = forwarding).
    #[serde(default)]
    pub ipforwarding: bool,
    #[serde(default)]
    pub owner: Option<EntityId>,
    #[serde(default)]
    pub used_by: Option<EntityId>,
    /// Product/model identifier, matched against the duplex ignore list.
    #[serde(default)]
    pub product: Option<String>,
}

impl Device {
    pub fn new(id: DeviceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ipforwarding: false,
            owner: None,
            used_by: None,
            product: None,
        }
    }
}

/// Monitoring status record (e.g. "Unknown", "Up", "Down").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub id: MonitorStatusId,
    pub name: String,
}

/// A network interface belonging to one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub id: InterfaceId,
    pub device: DeviceId,
    /// Ordinal reported by the device (ifIndex).
    pub number: Option<String>,
    pub name: String,
    pub if_type: Option<String>,
    pub description: Option<String>,
    /// Bits per second.
    pub speed: u64,
    pub admin_status: Option<AdminStatus>,
    pub oper_status: Option<OperStatus>,
    pub admin_duplex: Option<Duplex>,
    pub oper_duplex: Option<Duplex>,
    pub stp_id: Option<String>,
    pub bpdu_guard_enabled: Option<bool>,
    pub bpdu_filter_enabled: Option<bool>,
    pub loop_guard_enabled: Option<bool>,
    pub root_guard_enabled: Option<bool>,
    pub dp_remote_id: Option<String>,
    pub dp_remote_ip: Option<String>,
    pub dp_remote_port: Option<String>,
    pub dp_remote_type: Option<String>,
    pub physaddr: Option<PhysAddrId>,
    /// Symmetric partner; managed exclusively by the neighbor arbiter.
    pub neighbor: Option<InterfaceId>,
    /// True when the link was pinned by an operator.
    pub neighbor_fixed: bool,
    /// Consecutive polls in which the partner was not seen.
    pub neighbor_missed: u32,
    pub monitored: bool,
    pub snmp_managed: bool,
    pub overwrite_descr: bool,
    pub auto_dns: bool,
    /// Skip IP reconciliation for this interface entirely.
    pub ignore_ip: bool,
    pub doc_status: DocStatus,
    /// Monitor status id, `0` when the "Unknown" record does not exist.
    pub monitorstatus: MonitorStatusId,
}

impl Interface {
    /// Clears the neighbor slot fields (not persisted by itself).
    pub fn clear_neighbor(&mut self) {
        self.neighbor = None;
        self.neighbor_fixed = false;
        self.neighbor_missed = 0;
    }

    /// Returns true if this interface holds a pinned link to someone other
    /// than `other`.
    pub fn is_pinned_elsewhere(&self, other: InterfaceId) -> bool {
        self.neighbor_fixed && self.neighbor.is_some_and(|n| n != other)
    }
}

/// Input for creating an interface. Unset fields take policy defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInterface {
    pub device: Option<DeviceId>,
    pub name: Option<String>,
    pub number: Option<String>,
    pub if_type: Option<String>,
    pub description: Option<String>,
    pub speed: Option<u64>,
    pub doc_status: Option<DocStatus>,
    pub snmp_managed: Option<bool>,
    pub overwrite_descr: Option<bool>,
    pub monitored: Option<bool>,
    pub auto_dns: Option<bool>,
    pub ignore_ip: Option<bool>,
    pub monitorstatus: Option<MonitorStatusId>,
}

impl NewInterface {
    pub fn new(device: DeviceId, name: impl Into<String>) -> Self {
        Self {
            device: Some(device),
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Requested change to an interface's neighbor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborUpdate {
    /// Clear the link on both sides.
    Clear,
    /// Link symmetrically to `neighbor`.
    Link { neighbor: InterfaceId, fixed: bool },
}

impl NeighborUpdate {
    /// Maps a raw neighbor id as entered by operators: `0` clears.
    pub fn from_raw(neighbor: InterfaceId, fixed: bool) -> Self {
        if neighbor == 0 {
            NeighborUpdate::Clear
        } else {
            NeighborUpdate::Link { neighbor, fixed }
        }
    }
}

/// Partial update of an interface. `None` leaves the field untouched.
///
/// `physaddr` is doubly optional: `Some(None)` clears the reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceUpdate {
    pub number: Option<String>,
    pub name: Option<String>,
    pub if_type: Option<String>,
    pub description: Option<String>,
    pub speed: Option<u64>,
    pub admin_status: Option<AdminStatus>,
    pub oper_status: Option<OperStatus>,
    pub admin_duplex: Option<Duplex>,
    pub oper_duplex: Option<Duplex>,
    pub stp_id: Option<String>,
    pub bpdu_guard_enabled: Option<bool>,
    pub bpdu_filter_enabled: Option<bool>,
    pub loop_guard_enabled: Option<bool>,
    pub root_guard_enabled: Option<bool>,
    pub dp_remote_id: Option<String>,
    pub dp_remote_ip: Option<String>,
    pub dp_remote_port: Option<String>,
    pub dp_remote_type: Option<String>,
    pub physaddr: Option<Option<PhysAddrId>>,
    pub monitored: Option<bool>,
    pub snmp_managed: Option<bool>,
    pub overwrite_descr: Option<bool>,
    pub auto_dns: Option<bool>,
    pub ignore_ip: Option<bool>,
    pub doc_status: Option<DocStatus>,
    pub monitorstatus: Option<MonitorStatusId>,
    /// Routed to the neighbor arbiter, never written directly.
    pub neighbor: Option<NeighborUpdate>,
}

macro_rules! apply_fields {
    ($src:expr, $dst:expr, [$($field:ident),* $(,)?], [$($opt_field:ident),* $(,)?]) => {
        $(
            if let Some(value) = &$src.$field {
                $dst.$field = value.clone();
            }
        )*
        $(
            if let Some(value) = &$src.$opt_field {
                $dst.$opt_field = Some(value.clone());
            }
        )*
    };
}

impl InterfaceUpdate {
    /// Returns true if no storable field is set.
    pub fn is_empty(&self) -> bool {
        let mut scalar = self.clone();
        scalar.neighbor = None;
        scalar == InterfaceUpdate::default()
    }

    /// Copies every set field except `neighbor` onto `iface`.
    pub fn apply_to(&self, iface: &mut Interface) {
        apply_fields!(
            self,
            iface,
            [
                name, speed, physaddr, monitored, snmp_managed, overwrite_descr, auto_dns,
                ignore_ip, doc_status, monitorstatus,
            ],
            [
                number, if_type, description, admin_status, oper_status, admin_duplex,
                oper_duplex, stp_id, bpdu_guard_enabled, bpdu_filter_enabled,
                loop_guard_enabled, root_guard_enabled, dp_remote_id, dp_remote_ip,
                dp_remote_port, dp_remote_type,
            ]
        );
    }
}

/// A hardware address seen in the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysAddr {
    pub id: PhysAddrId,
    pub address: MacAddress,
    /// Set when the address was learned from an interface rather than a
    /// forwarding table.
    pub is_static: bool,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// A VLAN known to the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub id: VlanRecordId,
    pub vid: VlanId,
    pub name: String,
}

/// Membership of one interface in one VLAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceVlan {
    pub id: InterfaceVlanId,
    pub interface: InterfaceId,
    pub vlan: VlanRecordId,
    pub stp_instance: Option<StpInstanceId>,
    pub stp_des_bridge: Option<String>,
    pub stp_des_port: Option<String>,
    pub stp_state: Option<String>,
}

impl InterfaceVlan {
    pub fn new(interface: InterfaceId, vlan: VlanRecordId) -> Self {
        Self {
            id: 0,
            interface,
            vlan,
            stp_instance: None,
            stp_des_bridge: None,
            stp_des_port: None,
            stp_state: None,
        }
    }
}

/// A spanning-tree instance running on a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StpInstance {
    pub id: StpInstanceId,
    pub device: DeviceId,
    pub number: u32,
    #[serde(default)]
    pub root_bridge: Option<String>,
}

/// Classification of an IP block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpStatus {
    Container,
    Subnet,
    Static,
    Dynamic,
    Reserved,
    Discovered,
}

impl fmt::Display for IpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IpStatus::Container => "Container",
            IpStatus::Subnet => "Subnet",
            IpStatus::Static => "Static",
            IpStatus::Dynamic => "Dynamic",
            IpStatus::Reserved => "Reserved",
            IpStatus::Discovered => "Discovered",
        };
        f.write_str(s)
    }
}

/// A host address or a subnet. Unique by (address, prefix length).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipblock {
    pub id: IpblockId,
    pub prefix: IpPrefix,
    pub status: IpStatus,
    pub version: IpVersion,
    /// Owning interface, host addresses only.
    pub interface: Option<InterfaceId>,
    /// Associated VLAN, subnets only.
    pub vlan: Option<VlanRecordId>,
    pub owner: Option<EntityId>,
    pub used_by: Option<EntityId>,
    /// Set on records whose address-tree placement is rebuilt later in bulk.
    pub no_update_tree: bool,
}

impl Ipblock {
    /// A new host record (/32 or /128) owned by `interface`.
    pub fn host(address: IpAddress, interface: InterfaceId) -> Self {
        Self {
            id: 0,
            prefix: IpPrefix::host(address),
            status: IpStatus::Static,
            version: address.version(),
            interface: Some(interface),
            vlan: None,
            owner: None,
            used_by: None,
            no_update_tree: true,
        }
    }

    /// A new subnet record for `network` (host bits are cleared).
    pub fn subnet(network: IpPrefix) -> Self {
        Self {
            id: 0,
            prefix: network.network(),
            status: IpStatus::Subnet,
            version: network.version(),
            interface: None,
            vlan: None,
            owner: None,
            used_by: None,
            no_update_tree: true,
        }
    }

    pub fn address(&self) -> &IpAddress {
        self.prefix.address()
    }
}
