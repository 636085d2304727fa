//! Interface create / update / delete.

use super::InterfaceMgr;
use crate::error::{InventoryError, Result};
use crate::model::{
    DocStatus, Interface, InterfaceId, InterfaceUpdate, NeighborUpdate, NewInterface,
    UNKNOWN_MONITOR_STATUS,
};
use crate::store::Store;
use tracing::{debug, info, instrument};

impl<S: Store> InterfaceMgr<S> {
    /// Creates an interface, filling unset fields from policy.
    ///
    /// Requires `device` and a non-empty `name`; the device must exist.
    #[instrument(skip(self, input), fields(device = ?input.device, name = ?input.name))]
    pub async fn create(&self, input: NewInterface) -> Result<Interface> {
        let device = input
            .device
            .ok_or_else(|| InventoryError::validation("device is required"))?;
        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| InventoryError::validation("name is required"))?
            .to_string();

        self.device(device).await?;

        let monitorstatus = match input.monitorstatus {
            Some(id) => id,
            None => self
                .store
                .monitor_status_by_name(UNKNOWN_MONITOR_STATUS)
                .await?
                .map_or(0, |s| s.id),
        };

        let interface = Interface {
            id: 0,
            device,
            number: input.number,
            name,
            if_type: input.if_type,
            description: input.description,
            speed: input.speed.unwrap_or(0),
            admin_status: None,
            oper_status: None,
            admin_duplex: None,
            oper_duplex: None,
            stp_id: None,
            bpdu_guard_enabled: None,
            bpdu_filter_enabled: None,
            loop_guard_enabled: None,
            root_guard_enabled: None,
            dp_remote_id: None,
            dp_remote_ip: None,
            dp_remote_port: None,
            dp_remote_type: None,
            physaddr: None,
            neighbor: None,
            neighbor_fixed: false,
            neighbor_missed: 0,
            monitored: input.monitored.unwrap_or(false),
            snmp_managed: input.snmp_managed.unwrap_or(self.config.if_snmp),
            overwrite_descr: input
                .overwrite_descr
                .unwrap_or(self.config.if_overwrite_descr),
            auto_dns: input
                .auto_dns
                .unwrap_or(self.config.update_device_ip_names),
            ignore_ip: input.ignore_ip.unwrap_or(false),
            doc_status: input.doc_status.unwrap_or(DocStatus::Manual),
            monitorstatus,
        };

        let interface = self.store.insert_interface(interface).await?;
        info!(id = interface.id, "Created interface {}", interface.name);
        Ok(interface)
    }

    /// Applies a partial update.
    ///
    /// A `neighbor` change is routed through the neighbor arbiter first; the
    /// remaining fields are written as one update on top of the result. The
    /// write happens under `neighbor_lock`, so it always carries the current
    /// neighbor slot.
    #[instrument(skip(self, fields))]
    pub async fn update(&self, id: InterfaceId, fields: InterfaceUpdate) -> Result<Interface> {
        if let Some(name) = &fields.name {
            if name.trim().is_empty() {
                return Err(InventoryError::validation("name must not be empty"));
            }
        }

        match fields.neighbor {
            Some(NeighborUpdate::Clear) => self.remove_neighbor(id).await?,
            Some(NeighborUpdate::Link { neighbor, fixed }) => {
                self.add_neighbor(id, neighbor, fixed).await?
            }
            None => {}
        }

        if fields.is_empty() {
            return self.get(id).await;
        }

        let _guard = self.neighbor_lock.lock().await;
        let mut interface = self.get(id).await?;
        let before = interface.clone();
        fields.apply_to(&mut interface);
        if interface == before {
            debug!(id, "Update carries no changes");
            return Ok(interface);
        }

        self.store.update_interface(&interface).await?;
        debug!(id, "Updated interface");
        Ok(interface)
    }

    /// Deletes an interface after clearing every neighbor slot that points
    /// at it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: InterfaceId) -> Result<()> {
        let _guard = self.neighbor_lock.lock().await;

        let interface = self.get(id).await?;
        for mut peer in self.store.interfaces_with_neighbor(id).await? {
            if peer.id == id {
                continue;
            }
            peer.clear_neighbor();
            self.store.update_interface(&peer).await?;
            debug!(peer = peer.id, "Cleared neighbor pointing at deleted interface");
        }

        self.store.delete_interface(id).await?;
        info!(id, "Deleted interface {}", interface.name);
        Ok(())
    }
}
