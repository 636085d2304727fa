//! Discovered address resolution.
//!
//! Turns one discovered address (plus optional mask) into a host Ipblock
//! owned by the interface and, on routing devices, the subnet it sits in.

use super::{push_warning, InterfaceMgr, IpResolution, SyncWarning, WarningKind};
use crate::discovery::ReconcileOptions;
use crate::error::{InventoryError, Result};
use crate::model::{Device, Interface, IpStatus, Ipblock, VlanRecordId};
use crate::store::Store;
use netinv_types::{IpAddress, IpPrefix, IpVersion, VlanId};
use tracing::{debug, info, instrument};

impl<S: Store> InterfaceMgr<S> {
    /// Records `address` on `interface`.
    ///
    /// Loopback addresses are ignored. With a mask, `add_subnets` and a
    /// forwarding device, the covering subnet is found or created first.
    /// Failures to store the subnet or host record are returned as warnings.
    #[instrument(skip(self, interface, options), fields(interface = interface.id))]
    pub async fn resolve_ip(
        &self,
        interface: &Interface,
        address: &str,
        mask: Option<&str>,
        options: ReconcileOptions,
    ) -> Result<IpResolution> {
        let address = address.trim();
        if address.is_empty() {
            return Err(InventoryError::validation("address is required"));
        }
        let ip: IpAddress = address
            .parse()
            .map_err(|_| InventoryError::validation(format!("invalid address {}", address)))?;

        let mut resolution = IpResolution::default();
        if ip.is_loopback() {
            debug!(%ip, "Skipping loopback address");
            return Ok(resolution);
        }

        if let Some(mask) = mask.filter(|m| !m.trim().is_empty()) {
            if options.add_subnets {
                let device = self.device(interface.device).await?;
                if device.ipforwarding {
                    self.resolve_subnet(interface, &device, ip, mask, options, &mut resolution)
                        .await?;
                } else {
                    debug!(%ip, device = device.id, "Device does not forward, no subnet");
                }
            }
        }

        self.resolve_host(interface, ip, &mut resolution).await?;
        Ok(resolution)
    }

    async fn resolve_subnet(
        &self,
        interface: &Interface,
        device: &Device,
        ip: IpAddress,
        mask: &str,
        options: ReconcileOptions,
        resolution: &mut IpResolution,
    ) -> Result<()> {
        let prefix = match IpPrefix::from_mask(ip, mask) {
            Ok(prefix) => prefix,
            Err(e) => {
                push_warning(
                    &mut resolution.warnings,
                    SyncWarning::new(WarningKind::Subnet, ip.to_string(), e),
                );
                return Ok(());
            }
        };

        let network = prefix.network();
        let point_to_point = ip.version() == IpVersion::V4 && prefix.prefix_len() == 31;
        if *network.address() == ip && !point_to_point {
            debug!(%prefix, "Address is its own network, no subnet");
            return Ok(());
        }

        let vlan = self.subnet_vlan(interface).await?;

        if let Some(mut existing) = self.store.ipblock(&network).await? {
            if vlan.is_some() && existing.vlan != vlan {
                existing.vlan = vlan;
                if let Err(e) = self.store.update_ipblock(&existing).await {
                    push_warning(
                        &mut resolution.warnings,
                        SyncWarning::new(WarningKind::Subnet, network.to_string(), e),
                    );
                }
            }
            resolution.subnet = Some(existing);
            return Ok(());
        }

        let mut block = Ipblock::subnet(network);
        block.vlan = vlan;
        if options.subnet_inherit {
            block.owner = device.owner;
            block.used_by = device.used_by;
        }

        match self.store.insert_ipblock(block).await {
            Ok(block) => {
                info!(subnet = %block.prefix, vlan = ?block.vlan, "Created subnet");
                resolution.mark_changed(block.version);
                resolution.subnet = Some(block);
            }
            Err(e) => push_warning(
                &mut resolution.warnings,
                SyncWarning::new(WarningKind::Subnet, network.to_string(), e),
            ),
        }
        Ok(())
    }

    async fn resolve_host(
        &self,
        interface: &Interface,
        ip: IpAddress,
        resolution: &mut IpResolution,
    ) -> Result<()> {
        let host = IpPrefix::host(ip);

        // Existing records already passed validation when first stored.
        if let Some(mut existing) = self.store.ipblock(&host).await? {
            if existing.status != IpStatus::Static || existing.interface != Some(interface.id) {
                existing.status = IpStatus::Static;
                existing.interface = Some(interface.id);
                if let Err(e) = self.store.update_ipblock(&existing).await {
                    push_warning(
                        &mut resolution.warnings,
                        SyncWarning::new(WarningKind::HostIp, ip.to_string(), e),
                    );
                    return Ok(());
                }
                debug!(%ip, "Reassigned address to interface");
            }
            resolution.ipblock = Some(existing);
            return Ok(());
        }

        match self.store.insert_ipblock(Ipblock::host(ip, interface.id)).await {
            Ok(block) => {
                info!(%ip, "Created address");
                resolution.mark_changed(block.version);
                resolution.ipblock = Some(block);
            }
            Err(e) => push_warning(
                &mut resolution.warnings,
                SyncWarning::new(WarningKind::HostIp, ip.to_string(), e),
            ),
        }
        Ok(())
    }

    /// Picks the VLAN an inferred subnet belongs to: the interface's only
    /// membership, or the VLAN named by a routed VLAN interface.
    async fn subnet_vlan(&self, interface: &Interface) -> Result<Option<VlanRecordId>> {
        let memberships = self.store.interface_vlans(interface.id).await?;
        if let [only] = memberships.as_slice() {
            return Ok(Some(only.vlan));
        }

        match VlanId::from_interface_name(&interface.name) {
            Some(vid) => Ok(self.store.vlan_by_vid(vid).await?.map(|v| v.id)),
            None => Ok(None),
        }
    }
}
