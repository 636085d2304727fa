//! Storage collaborator.
//!
//! The engine never touches persistence directly; it goes through [`Store`],
//! one typed method per entity operation. Every call is its own unit of
//! work: there is no cross-record transaction.
//!
//! Contract for implementations:
//! - `insert_*` assigns a fresh id and returns the stored record.
//! - `update_*` fails with `NotFound` when the id does not exist.
//! - Uniqueness (PhysAddr address, Vlan vid, Ipblock prefix, membership
//!   pair) is enforced on write and reported as a `Storage` error.

mod memory;

pub use memory::{MemoryStore, StoreSnapshot};

use crate::error::Result;
use crate::model::{
    Device, DeviceId, Interface, InterfaceId, InterfaceVlan, InterfaceVlanId, Ipblock,
    MonitorStatus, PhysAddr, StpInstance, Vlan, VlanRecordId,
};
use async_trait::async_trait;
use netinv_types::{IpPrefix, MacAddress, VlanId};

/// Typed persistence operations used by the interface manager.
#[async_trait]
pub trait Store: Send + Sync {
    // Read-only collaborators
    async fn device(&self, id: DeviceId) -> Result<Option<Device>>;
    async fn monitor_status_by_name(&self, name: &str) -> Result<Option<MonitorStatus>>;
    async fn stp_instance(&self, device: DeviceId, number: u32) -> Result<Option<StpInstance>>;

    // Interfaces
    async fn interface(&self, id: InterfaceId) -> Result<Option<Interface>>;
    async fn interfaces(&self) -> Result<Vec<Interface>>;
    /// Interfaces whose `neighbor` slot points at `id`.
    async fn interfaces_with_neighbor(&self, id: InterfaceId) -> Result<Vec<Interface>>;
    async fn insert_interface(&self, interface: Interface) -> Result<Interface>;
    async fn update_interface(&self, interface: &Interface) -> Result<()>;
    /// Deletes the interface and its VLAN memberships.
    async fn delete_interface(&self, id: InterfaceId) -> Result<()>;

    // Hardware addresses
    async fn physaddr_by_address(&self, address: &MacAddress) -> Result<Option<PhysAddr>>;
    async fn insert_physaddr(&self, physaddr: PhysAddr) -> Result<PhysAddr>;
    async fn update_physaddr(&self, physaddr: &PhysAddr) -> Result<()>;

    // VLANs
    async fn vlan(&self, id: VlanRecordId) -> Result<Option<Vlan>>;
    async fn vlan_by_vid(&self, vid: VlanId) -> Result<Option<Vlan>>;
    async fn insert_vlan(&self, vlan: Vlan) -> Result<Vlan>;
    async fn update_vlan(&self, vlan: &Vlan) -> Result<()>;

    // VLAN memberships
    async fn interface_vlans(&self, interface: InterfaceId) -> Result<Vec<InterfaceVlan>>;
    async fn interface_vlan(
        &self,
        interface: InterfaceId,
        vlan: VlanRecordId,
    ) -> Result<Option<InterfaceVlan>>;
    async fn insert_interface_vlan(&self, membership: InterfaceVlan) -> Result<InterfaceVlan>;
    async fn update_interface_vlan(&self, membership: &InterfaceVlan) -> Result<()>;
    async fn delete_interface_vlan(&self, id: InterfaceVlanId) -> Result<()>;

    // IP blocks
    async fn ipblock(&self, prefix: &IpPrefix) -> Result<Option<Ipblock>>;
    async fn insert_ipblock(&self, block: Ipblock) -> Result<Ipblock>;
    async fn update_ipblock(&self, block: &Ipblock) -> Result<()>;
}
