//! Per-poll discovery reconciliation.
//!
//! Order of work for one interface:
//! 1. scalar fields and hardware address, written as one update
//! 2. VLAN membership diff with STP attributes
//! 3. address resolution
//!
//! Only a failure on the interface itself aborts; problems with individual
//! sub-items are collected as [`SyncWarning`]s.

use super::{
    push_warning, BatchFailure, BatchReport, InterfaceMgr, ReconcileOutcome, SyncWarning,
    WarningKind,
};
use crate::discovery::{
    DiscoveredInterface, DiscoveredVlan, DiscoveryEntry, InterfaceInfo, ReconcileOptions,
    StpPortState,
};
use crate::error::Result;
use crate::model::{
    DeviceId, DocStatus, Interface, InterfaceId, InterfaceUpdate, InterfaceVlan,
    InterfaceVlanId, PhysAddr, PhysAddrId, Vlan, VlanRecordId,
};
use crate::store::Store;
use chrono::Utc;
use netinv_types::{MacAddress, VlanId};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

/// Parses an optional discovered value, recording a warning on failure.
fn parse_field<T: FromStr>(
    field: &str,
    value: Option<&String>,
    warnings: &mut Vec<SyncWarning>,
) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let value = value?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            push_warning(warnings, SyncWarning::new(WarningKind::Field, field, e));
            None
        }
    }
}

/// Builds the field update for the scalar section of a discovery record.
fn info_update(info: &InterfaceInfo, warnings: &mut Vec<SyncWarning>) -> InterfaceUpdate {
    InterfaceUpdate {
        number: info.number.clone(),
        name: info.name.clone().filter(|n| !n.trim().is_empty()),
        if_type: info.if_type.clone(),
        description: info.description.clone(),
        speed: info.speed,
        admin_status: parse_field("admin_status", info.admin_status.as_ref(), warnings),
        oper_status: parse_field("oper_status", info.oper_status.as_ref(), warnings),
        admin_duplex: parse_field("admin_duplex", info.admin_duplex.as_ref(), warnings),
        oper_duplex: parse_field("oper_duplex", info.oper_duplex.as_ref(), warnings),
        stp_id: info.stp_id.clone(),
        bpdu_guard_enabled: info.bpdu_guard_enabled,
        bpdu_filter_enabled: info.bpdu_filter_enabled,
        loop_guard_enabled: info.loop_guard_enabled,
        root_guard_enabled: info.root_guard_enabled,
        dp_remote_id: info.dp_remote_id.clone(),
        dp_remote_ip: info.dp_remote_ip.clone(),
        dp_remote_port: info.dp_remote_port.clone(),
        dp_remote_type: info.dp_remote_type.clone(),
        doc_status: Some(DocStatus::Snmp),
        ..Default::default()
    }
}

/// Copies the STP attributes present in `port` onto `membership`.
fn apply_stp_state(membership: &mut InterfaceVlan, port: &StpPortState) {
    if let Some(bridge) = &port.des_bridge {
        membership.stp_des_bridge = Some(bridge.clone());
    }
    if let Some(des_port) = &port.des_port {
        membership.stp_des_port = Some(des_port.clone());
    }
    if let Some(state) = &port.state {
        membership.stp_state = Some(state.clone());
    }
}

impl<S: Store> InterfaceMgr<S> {
    /// Brings interface `id` in line with what discovery reported.
    #[instrument(skip(self, record, options))]
    pub async fn reconcile(
        &self,
        id: InterfaceId,
        record: &DiscoveredInterface,
        options: ReconcileOptions,
    ) -> Result<ReconcileOutcome> {
        let current = self.get(id).await?;
        let mut warnings = Vec::new();

        let mut fields = info_update(&record.info, &mut warnings);
        fields.physaddr = Some(
            self.resolve_physaddr(record.physaddr.as_deref(), &mut warnings)
                .await,
        );
        if !current.overwrite_descr {
            fields.description = None;
        }

        let interface = self.update(id, fields).await?;

        if let Some(vlans) = &record.vlans {
            self.sync_vlans(&interface, vlans, &record.stp_instances, &mut warnings)
                .await?;
        }

        let mut outcome = ReconcileOutcome {
            interface,
            ipv4_changed: false,
            ipv6_changed: false,
            warnings,
        };

        if let Some(ips) = &record.ips {
            if outcome.interface.ignore_ip {
                debug!(id, "Interface ignores IP information");
            } else {
                for (address, ip) in ips {
                    match self
                        .resolve_ip(&outcome.interface, address, ip.mask.as_deref(), options)
                        .await
                    {
                        Ok(resolution) => outcome.absorb(resolution),
                        Err(e) if e.is_caller_error() => push_warning(
                            &mut outcome.warnings,
                            SyncWarning::new(WarningKind::HostIp, address.as_str(), e),
                        ),
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        debug!(
            id,
            warnings = outcome.warnings.len(),
            ipv4_changed = outcome.ipv4_changed,
            ipv6_changed = outcome.ipv6_changed,
            "Reconciled interface"
        );
        Ok(outcome)
    }

    /// Reconciles every entry for `device`. A failing interface is recorded
    /// in the report and the batch moves on.
    #[instrument(skip(self, entries, options), fields(count = entries.len()))]
    pub async fn reconcile_batch(
        &self,
        device: DeviceId,
        entries: &[DiscoveryEntry],
        options: ReconcileOptions,
    ) -> Result<BatchReport> {
        self.device(device).await?;

        let mut report = BatchReport::default();
        for entry in entries {
            let result = match self.store.interface(entry.interface).await {
                Ok(Some(iface)) if iface.device != device => {
                    report.failures.push(BatchFailure {
                        interface: entry.interface,
                        error: format!(
                            "Interface {} belongs to device {}",
                            entry.interface, iface.device
                        ),
                    });
                    continue;
                }
                Ok(_) => self.reconcile(entry.interface, &entry.record, options).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    warn!(interface = entry.interface, error = %e, "Interface sync failed");
                    report.failures.push(BatchFailure {
                        interface: entry.interface,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            device,
            reconciled = report.outcomes.len(),
            failed = report.failures.len(),
            warnings = report.warning_count(),
            "Device sync complete"
        );
        Ok(report)
    }

    /// Finds or creates the PhysAddr for a discovered hardware address.
    /// Returns `None` (clearing the reference) when there is nothing usable.
    async fn resolve_physaddr(
        &self,
        address: Option<&str>,
        warnings: &mut Vec<SyncWarning>,
    ) -> Option<PhysAddrId> {
        let raw = address.map(str::trim).filter(|a| !a.is_empty())?;

        let mac = match raw.parse::<MacAddress>() {
            Ok(mac) if mac.is_inventory_candidate() => mac,
            Ok(mac) => {
                push_warning(
                    warnings,
                    SyncWarning::new(
                        WarningKind::PhysAddr,
                        raw,
                        format!("{} is not a unicast address", mac),
                    ),
                );
                return None;
            }
            Err(e) => {
                push_warning(warnings, SyncWarning::new(WarningKind::PhysAddr, raw, e));
                return None;
            }
        };

        let now = Utc::now();
        let result = match self.store.physaddr_by_address(&mac).await {
            Ok(Some(mut existing)) => {
                existing.last_seen = now;
                existing.is_static = true;
                self.store
                    .update_physaddr(&existing)
                    .await
                    .map(|()| existing.id)
            }
            Ok(None) => self
                .store
                .insert_physaddr(PhysAddr {
                    id: 0,
                    address: mac,
                    is_static: true,
                    first_seen: now,
                    last_seen: now,
                })
                .await
                .map(|p| {
                    debug!(%mac, "Created hardware address");
                    p.id
                }),
            Err(e) => Err(e),
        };

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                push_warning(warnings, SyncWarning::new(WarningKind::PhysAddr, mac.to_string(), e));
                None
            }
        }
    }

    /// Diffs discovered VLAN membership against the stored one.
    async fn sync_vlans(
        &self,
        interface: &Interface,
        vlans: &BTreeMap<u16, DiscoveredVlan>,
        stp_ports: &BTreeMap<u32, StpPortState>,
        warnings: &mut Vec<SyncWarning>,
    ) -> Result<()> {
        let mut stale: BTreeSet<InterfaceVlanId> = self
            .store
            .interface_vlans(interface.id)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();

        for (&raw_vid, discovered) in vlans {
            let vid = match VlanId::new(raw_vid) {
                Ok(vid) => vid,
                Err(e) => {
                    push_warning(
                        warnings,
                        SyncWarning::new(WarningKind::Vlan, raw_vid.to_string(), e),
                    );
                    continue;
                }
            };

            let vlan = self.find_or_create_vlan(vid, discovered.name.as_deref()).await?;
            let membership = match self.store.interface_vlan(interface.id, vlan).await? {
                Some(membership) => membership,
                None => {
                    let membership = self
                        .store
                        .insert_interface_vlan(InterfaceVlan::new(interface.id, vlan))
                        .await?;
                    info!(interface = interface.id, %vid, "Added VLAN membership");
                    membership
                }
            };
            stale.remove(&membership.id);

            let Some(instance_number) = discovered.stp_instance else {
                continue;
            };
            let Some(instance) = self
                .store
                .stp_instance(interface.device, instance_number)
                .await?
            else {
                push_warning(
                    warnings,
                    SyncWarning::new(
                        WarningKind::StpInstance,
                        format!("vlan {}", vid),
                        format!(
                            "STP instance {} not found on device {}",
                            instance_number, interface.device
                        ),
                    ),
                );
                continue;
            };

            let mut updated = membership.clone();
            updated.stp_instance = Some(instance.id);
            if let Some(port) = stp_ports.get(&instance_number) {
                apply_stp_state(&mut updated, port);
            }
            if updated != membership {
                self.store.update_interface_vlan(&updated).await?;
                debug!(
                    interface = interface.id,
                    %vid,
                    instance = instance_number,
                    "Updated STP state"
                );
            }
        }

        for id in stale {
            self.store.delete_interface_vlan(id).await?;
            info!(interface = interface.id, membership = id, "Removed VLAN membership");
        }
        Ok(())
    }

    /// Returns the record id for `vid`, creating the VLAN if needed. The
    /// default VLAN is never renamed.
    async fn find_or_create_vlan(&self, vid: VlanId, name: Option<&str>) -> Result<VlanRecordId> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        match self.store.vlan_by_vid(vid).await? {
            Some(mut vlan) => {
                if let Some(name) = name {
                    if !vid.is_default() && vlan.name != name {
                        debug!(%vid, from = %vlan.name, to = name, "Renaming VLAN");
                        vlan.name = name.to_string();
                        self.store.update_vlan(&vlan).await?;
                    }
                }
                Ok(vlan.id)
            }
            None => {
                let vlan = self
                    .store
                    .insert_vlan(Vlan {
                        id: 0,
                        vid,
                        name: name.map_or_else(|| vid.to_string(), str::to_string),
                    })
                    .await?;
                info!(%vid, name = %vlan.name, "Created VLAN");
                Ok(vlan.id)
            }
        }
    }
}
