//! In-process [`Store`] backed by lock-protected tables.
//!
//! Used by tests and by `netinv-syncd`, which persists the whole store as a
//! JSON snapshot between runs.

use super::Store;
use crate::error::{InventoryError, Result};
use crate::model::{
    Device, DeviceId, Interface, InterfaceId, InterfaceVlan, InterfaceVlanId, Ipblock,
    MonitorStatus, MonitorStatusId, PhysAddr, PhysAddrId, StpInstance, StpInstanceId, Vlan,
    VlanRecordId,
};
use async_trait::async_trait;
use netinv_types::{IpPrefix, MacAddress, VlanId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Serializable contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    /// Last id handed out. Ids are unique across all tables.
    pub last_id: u64,
    pub devices: BTreeMap<DeviceId, Device>,
    pub monitor_statuses: BTreeMap<MonitorStatusId, MonitorStatus>,
    pub stp_instances: BTreeMap<StpInstanceId, StpInstance>,
    pub interfaces: BTreeMap<InterfaceId, Interface>,
    pub physaddrs: BTreeMap<PhysAddrId, PhysAddr>,
    pub vlans: BTreeMap<VlanRecordId, Vlan>,
    pub interface_vlans: BTreeMap<InterfaceVlanId, InterfaceVlan>,
    pub ipblocks: BTreeMap<u64, Ipblock>,
}

impl StoreSnapshot {
    fn max_id(&self) -> u64 {
        [
            self.devices.keys().next_back(),
            self.monitor_statuses.keys().next_back(),
            self.stp_instances.keys().next_back(),
            self.interfaces.keys().next_back(),
            self.physaddrs.keys().next_back(),
            self.vlans.keys().next_back(),
            self.interface_vlans.keys().next_back(),
            self.ipblocks.keys().next_back(),
        ]
        .into_iter()
        .flatten()
        .copied()
        .max()
        .unwrap_or(0)
    }

    fn allocate_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<StoreSnapshot>,

    /// Operations forced to fail (for testing)
    #[cfg(test)]
    failing: parking_lot::Mutex<std::collections::HashSet<&'static str>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from previously saved contents.
    pub fn from_snapshot(mut snapshot: StoreSnapshot) -> Self {
        snapshot.last_id = snapshot.last_id.max(snapshot.max_id());
        Self {
            tables: RwLock::new(snapshot),
            #[cfg(test)]
            failing: Default::default(),
        }
    }

    /// Returns a copy of the current contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.tables.read().clone()
    }

    /// Loads a JSON snapshot from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content).map_err(|e| {
            InventoryError::storage("load", format!("{}: {}", path.display(), e))
        })?;
        info!(
            path = %path.display(),
            interfaces = snapshot.interfaces.len(),
            "Loaded store snapshot"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Writes the current contents to disk as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&*self.tables.read())
            .map_err(|e| InventoryError::storage("save", e.to_string()))?;
        fs::write(path, content)?;
        debug!(path = %path.display(), "Saved store snapshot");
        Ok(())
    }

    /// Adds a device record. Devices are owned by device-level sync; this is
    /// the seeding entry point.
    pub fn add_device(&self, mut device: Device) -> Device {
        let mut tables = self.tables.write();
        device.id = tables.allocate_id();
        tables.devices.insert(device.id, device.clone());
        device
    }

    pub fn add_monitor_status(&self, name: impl Into<String>) -> MonitorStatus {
        let mut tables = self.tables.write();
        let status = MonitorStatus {
            id: tables.allocate_id(),
            name: name.into(),
        };
        tables.monitor_statuses.insert(status.id, status.clone());
        status
    }

    /// Records an STP instance as device-level STP sync would.
    pub fn add_stp_instance(&self, device: DeviceId, number: u32) -> StpInstance {
        let mut tables = self.tables.write();
        let instance = StpInstance {
            id: tables.allocate_id(),
            device,
            number,
            root_bridge: None,
        };
        tables.stp_instances.insert(instance.id, instance.clone());
        instance
    }

    /// Makes every subsequent call of `operation` fail with a storage error.
    #[cfg(test)]
    pub fn fail_operation(&self, operation: &'static str) {
        self.failing.lock().insert(operation);
    }

    fn check_fault(&self, _operation: &'static str) -> Result<()> {
        #[cfg(test)]
        if self.failing.lock().contains(_operation) {
            return Err(InventoryError::storage(_operation, "injected failure"));
        }
        Ok(())
    }
}

fn duplicate(operation: &str, what: impl std::fmt::Display) -> InventoryError {
    InventoryError::storage(operation, format!("duplicate {}", what))
}

#[async_trait]
impl Store for MemoryStore {
    async fn device(&self, id: DeviceId) -> Result<Option<Device>> {
        Ok(self.tables.read().devices.get(&id).cloned())
    }

    async fn monitor_status_by_name(&self, name: &str) -> Result<Option<MonitorStatus>> {
        Ok(self
            .tables
            .read()
            .monitor_statuses
            .values()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn stp_instance(&self, device: DeviceId, number: u32) -> Result<Option<StpInstance>> {
        Ok(self
            .tables
            .read()
            .stp_instances
            .values()
            .find(|s| s.device == device && s.number == number)
            .cloned())
    }

    async fn interface(&self, id: InterfaceId) -> Result<Option<Interface>> {
        Ok(self.tables.read().interfaces.get(&id).cloned())
    }

    async fn interfaces(&self) -> Result<Vec<Interface>> {
        Ok(self.tables.read().interfaces.values().cloned().collect())
    }

    async fn interfaces_with_neighbor(&self, id: InterfaceId) -> Result<Vec<Interface>> {
        Ok(self
            .tables
            .read()
            .interfaces
            .values()
            .filter(|i| i.neighbor == Some(id))
            .cloned()
            .collect())
    }

    async fn insert_interface(&self, mut interface: Interface) -> Result<Interface> {
        self.check_fault("insert_interface")?;
        let mut tables = self.tables.write();
        interface.id = tables.allocate_id();
        tables.interfaces.insert(interface.id, interface.clone());
        Ok(interface)
    }

    async fn update_interface(&self, interface: &Interface) -> Result<()> {
        self.check_fault("update_interface")?;
        let mut tables = self.tables.write();
        let slot = tables
            .interfaces
            .get_mut(&interface.id)
            .ok_or_else(|| InventoryError::not_found("Interface", interface.id))?;
        *slot = interface.clone();
        Ok(())
    }

    async fn delete_interface(&self, id: InterfaceId) -> Result<()> {
        self.check_fault("delete_interface")?;
        let mut tables = self.tables.write();
        if tables.interfaces.remove(&id).is_none() {
            return Err(InventoryError::not_found("Interface", id));
        }
        tables.interface_vlans.retain(|_, m| m.interface != id);
        for block in tables.ipblocks.values_mut() {
            if block.interface == Some(id) {
                block.interface = None;
            }
        }
        Ok(())
    }

    async fn physaddr_by_address(&self, address: &MacAddress) -> Result<Option<PhysAddr>> {
        Ok(self
            .tables
            .read()
            .physaddrs
            .values()
            .find(|p| p.address == *address)
            .cloned())
    }

    async fn insert_physaddr(&self, mut physaddr: PhysAddr) -> Result<PhysAddr> {
        self.check_fault("insert_physaddr")?;
        let mut tables = self.tables.write();
        if tables.physaddrs.values().any(|p| p.address == physaddr.address) {
            return Err(duplicate("insert_physaddr", physaddr.address));
        }
        physaddr.id = tables.allocate_id();
        tables.physaddrs.insert(physaddr.id, physaddr.clone());
        Ok(physaddr)
    }

    async fn update_physaddr(&self, physaddr: &PhysAddr) -> Result<()> {
        self.check_fault("update_physaddr")?;
        let mut tables = self.tables.write();
        if tables
            .physaddrs
            .values()
            .any(|p| p.id != physaddr.id && p.address == physaddr.address)
        {
            return Err(duplicate("update_physaddr", physaddr.address));
        }
        let slot = tables
            .physaddrs
            .get_mut(&physaddr.id)
            .ok_or_else(|| InventoryError::not_found("PhysAddr", physaddr.id))?;
        *slot = physaddr.clone();
        Ok(())
    }

    async fn vlan(&self, id: VlanRecordId) -> Result<Option<Vlan>> {
        Ok(self.tables.read().vlans.get(&id).cloned())
    }

    async fn vlan_by_vid(&self, vid: VlanId) -> Result<Option<Vlan>> {
        Ok(self
            .tables
            .read()
            .vlans
            .values()
            .find(|v| v.vid == vid)
            .cloned())
    }

    async fn insert_vlan(&self, mut vlan: Vlan) -> Result<Vlan> {
        self.check_fault("insert_vlan")?;
        let mut tables = self.tables.write();
        if tables.vlans.values().any(|v| v.vid == vlan.vid) {
            return Err(duplicate("insert_vlan", format!("vid {}", vlan.vid)));
        }
        vlan.id = tables.allocate_id();
        tables.vlans.insert(vlan.id, vlan.clone());
        Ok(vlan)
    }

    async fn update_vlan(&self, vlan: &Vlan) -> Result<()> {
        self.check_fault("update_vlan")?;
        let mut tables = self.tables.write();
        if tables
            .vlans
            .values()
            .any(|v| v.id != vlan.id && v.vid == vlan.vid)
        {
            return Err(duplicate("update_vlan", format!("vid {}", vlan.vid)));
        }
        let slot = tables
            .vlans
            .get_mut(&vlan.id)
            .ok_or_else(|| InventoryError::not_found("Vlan", vlan.id))?;
        *slot = vlan.clone();
        Ok(())
    }

    async fn interface_vlans(&self, interface: InterfaceId) -> Result<Vec<InterfaceVlan>> {
        Ok(self
            .tables
            .read()
            .interface_vlans
            .values()
            .filter(|m| m.interface == interface)
            .cloned()
            .collect())
    }

    async fn interface_vlan(
        &self,
        interface: InterfaceId,
        vlan: VlanRecordId,
    ) -> Result<Option<InterfaceVlan>> {
        Ok(self
            .tables
            .read()
            .interface_vlans
            .values()
            .find(|m| m.interface == interface && m.vlan == vlan)
            .cloned())
    }

    async fn insert_interface_vlan(&self, mut membership: InterfaceVlan) -> Result<InterfaceVlan> {
        self.check_fault("insert_interface_vlan")?;
        let mut tables = self.tables.write();
        if tables
            .interface_vlans
            .values()
            .any(|m| m.interface == membership.interface && m.vlan == membership.vlan)
        {
            return Err(duplicate(
                "insert_interface_vlan",
                format!("membership {}/{}", membership.interface, membership.vlan),
            ));
        }
        membership.id = tables.allocate_id();
        tables.interface_vlans.insert(membership.id, membership.clone());
        Ok(membership)
    }

    async fn update_interface_vlan(&self, membership: &InterfaceVlan) -> Result<()> {
        self.check_fault("update_interface_vlan")?;
        let mut tables = self.tables.write();
        let slot = tables
            .interface_vlans
            .get_mut(&membership.id)
            .ok_or_else(|| InventoryError::not_found("InterfaceVlan", membership.id))?;
        *slot = membership.clone();
        Ok(())
    }

    async fn delete_interface_vlan(&self, id: InterfaceVlanId) -> Result<()> {
        self.check_fault("delete_interface_vlan")?;
        self.tables
            .write()
            .interface_vlans
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| InventoryError::not_found("InterfaceVlan", id))
    }

    async fn ipblock(&self, prefix: &IpPrefix) -> Result<Option<Ipblock>> {
        Ok(self
            .tables
            .read()
            .ipblocks
            .values()
            .find(|b| b.prefix == *prefix)
            .cloned())
    }

    async fn insert_ipblock(&self, mut block: Ipblock) -> Result<Ipblock> {
        self.check_fault("insert_ipblock")?;
        let mut tables = self.tables.write();
        if tables.ipblocks.values().any(|b| b.prefix == block.prefix) {
            return Err(duplicate("insert_ipblock", block.prefix));
        }
        block.id = tables.allocate_id();
        tables.ipblocks.insert(block.id, block.clone());
        Ok(block)
    }

    async fn update_ipblock(&self, block: &Ipblock) -> Result<()> {
        self.check_fault("update_ipblock")?;
        let mut tables = self.tables.write();
        if tables
            .ipblocks
            .values()
            .any(|b| b.id != block.id && b.prefix == block.prefix)
        {
            return Err(duplicate("update_ipblock", block.prefix));
        }
        let slot = tables
            .ipblocks
            .get_mut(&block.id)
            .ok_or_else(|| InventoryError::not_found("Ipblock", block.id))?;
        *slot = block.clone();
        Ok(())
    }
}
