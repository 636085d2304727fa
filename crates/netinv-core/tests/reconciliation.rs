//! End-to-end behavior of the interface manager over the in-memory store.

use async_trait::async_trait;
use netinv_core::model::{
    Device, DeviceId, Interface, InterfaceId, InterfaceVlan, InterfaceVlanId, IpStatus, Ipblock,
    MonitorStatus, PhysAddr, StpInstance, Vlan, VlanRecordId,
};
use netinv_core::{
    format_speed, DiscoveredInterface, DiscoveryEntry, InterfaceMgr, InterfaceUpdate,
    InventoryConfig, InventoryError, MemoryStore, NeighborUpdate, NewInterface,
    ReconcileOptions, Store,
};
use netinv_types::{Duplex, IpPrefix, MacAddress, OperStatus, VlanId};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::sync::Arc;

struct Harness {
    mgr: InterfaceMgr<MemoryStore>,
    router: DeviceId,
    switch: DeviceId,
}

impl Harness {
    fn new(config: InventoryConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let router = store
            .add_device(Device {
                ipforwarding: true,
                product: Some("ASR1001".to_string()),
                ..Device::new(0, "rtr1")
            })
            .id;
        let switch = store
            .add_device(Device {
                product: Some("WS-C2950-24".to_string()),
                ..Device::new(0, "sw1")
            })
            .id;
        store.add_monitor_status("Unknown");
        Self {
            mgr: InterfaceMgr::new(store, config),
            router,
            switch,
        }
    }

    async fn interface(&self, device: DeviceId, name: &str) -> InterfaceId {
        self.mgr
            .create(NewInterface::new(device, name))
            .await
            .unwrap()
            .id
    }

    async fn get(&self, id: InterfaceId) -> Interface {
        self.mgr.get(id).await.unwrap()
    }

    async fn vids(&self, id: InterfaceId) -> BTreeSet<u16> {
        let store = self.mgr.store();
        let mut vids = BTreeSet::new();
        for membership in store.interface_vlans(id).await.unwrap() {
            let vlan = store.vlan(membership.vlan).await.unwrap().unwrap();
            vids.insert(vlan.vid.as_u16());
        }
        vids
    }
}

fn prefix(s: &str) -> IpPrefix {
    s.parse().unwrap()
}

#[tokio::test]
async fn add_neighbor_links_both_sides() {
    let h = Harness::new(InventoryConfig::default());
    let a = h.interface(h.router, "Gi0/0").await;
    let b = h.interface(h.switch, "Gi0/24").await;

    for fixed in [false, true] {
        h.mgr.remove_neighbor(a).await.unwrap();
        h.mgr.add_neighbor(a, b, fixed).await.unwrap();

        let (ia, ib) = (h.get(a).await, h.get(b).await);
        assert_eq!(ia.neighbor, Some(b));
        assert_eq!(ib.neighbor, Some(a));
        assert_eq!(ia.neighbor_fixed, fixed);
        assert_eq!(ib.neighbor_fixed, fixed);
        assert_eq!(ia.neighbor_missed, 0);
    }
}

#[tokio::test]
async fn add_neighbor_twice_is_idempotent() {
    let h = Harness::new(InventoryConfig::default());
    let a = h.interface(h.router, "Gi0/0").await;
    let b = h.interface(h.switch, "Gi0/24").await;

    h.mgr.add_neighbor(a, b, false).await.unwrap();
    let before = h.mgr.store().snapshot();
    h.mgr.add_neighbor(a, b, false).await.unwrap();
    assert_eq!(h.mgr.store().snapshot(), before);
}

#[tokio::test]
async fn fixed_link_is_not_overwritten() {
    let h = Harness::new(InventoryConfig::default());
    let a = h.interface(h.router, "Gi0/0").await;
    let b = h.interface(h.switch, "Gi0/24").await;
    let c = h.interface(h.switch, "Gi0/23").await;

    h.mgr.add_neighbor(a, b, true).await.unwrap();
    let err = h.mgr.add_neighbor(a, c, false).await.unwrap_err();

    assert!(matches!(err, InventoryError::User(_)));
    assert_eq!(h.get(a).await.neighbor, Some(b));
    assert!(h.get(a).await.neighbor_fixed);
    assert_eq!(h.get(b).await.neighbor, Some(a));
    assert_eq!(h.get(c).await.neighbor, None);
}

#[tokio::test]
async fn remove_neighbor_clears_both_sides() {
    let h = Harness::new(InventoryConfig::default());
    let a = h.interface(h.router, "Gi0/0").await;
    let b = h.interface(h.switch, "Gi0/24").await;

    h.mgr.add_neighbor(b, a, true).await.unwrap();
    h.mgr.remove_neighbor(a).await.unwrap();

    assert_eq!(h.get(a).await.neighbor, None);
    assert_eq!(h.get(b).await.neighbor, None);
    assert!(!h.get(b).await.neighbor_fixed);
}

#[tokio::test]
async fn update_routes_neighbor_through_arbiter() {
    let h = Harness::new(InventoryConfig::default());
    let a = h.interface(h.router, "Gi0/0").await;
    let b = h.interface(h.switch, "Gi0/24").await;

    let updated = h
        .mgr
        .update(
            a,
            InterfaceUpdate {
                neighbor: Some(NeighborUpdate::from_raw(b, true)),
                monitored: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.neighbor, Some(b));
    assert!(updated.monitored);
    assert!(h.get(b).await.neighbor_fixed);

    h.mgr
        .update(
            a,
            InterfaceUpdate {
                neighbor: Some(NeighborUpdate::from_raw(0, false)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(h.get(a).await.neighbor, None);
    assert_eq!(h.get(b).await.neighbor, None);
    assert!(h.get(a).await.monitored);
}

#[tokio::test]
async fn delete_clears_dangling_neighbors() {
    let h = Harness::new(InventoryConfig::default());
    let a = h.interface(h.router, "Gi0/0").await;
    let b = h.interface(h.switch, "Gi0/24").await;

    h.mgr.add_neighbor(a, b, true).await.unwrap();
    h.mgr.delete(a).await.unwrap();

    let ib = h.get(b).await;
    assert_eq!(ib.neighbor, None);
    assert!(!ib.neighbor_fixed);
    assert_eq!(ib.neighbor_missed, 0);
    assert!(h.mgr.store().interface(a).await.unwrap().is_none());
}

#[tokio::test]
async fn duplex_mismatch_reported_and_filtered() {
    let h = Harness::new(InventoryConfig {
        ignore_duplex: vec!["WS-C2950-24".to_string()],
        ..Default::default()
    });
    let a = h.interface(h.router, "Gi0/0").await;
    let b = h.interface(h.switch, "Gi0/24").await;
    h.mgr.add_neighbor(a, b, false).await.unwrap();

    for (id, duplex) in [(a, "half"), (b, "full")] {
        let record = DiscoveredInterface::with_info(netinv_core::InterfaceInfo {
            oper_status: Some("up".to_string()),
            oper_duplex: Some(duplex.to_string()),
            ..Default::default()
        });
        h.mgr
            .reconcile(id, &record, ReconcileOptions::default())
            .await
            .unwrap();
    }
    assert_eq!(h.get(a).await.oper_duplex, Some(Duplex::Half));
    assert_eq!(h.get(b).await.oper_status, Some(OperStatus::Up));

    assert_eq!(h.mgr.find_duplex_mismatches(false).await.unwrap(), vec![(a, b)]);
    assert!(h.mgr.find_duplex_mismatches(true).await.unwrap().is_empty());
}

#[tokio::test]
async fn vlan_membership_diff() {
    let h = Harness::new(InventoryConfig::default());
    let id = h.interface(h.switch, "Gi0/1").await;

    h.mgr
        .reconcile(
            id,
            &DiscoveredInterface::default()
                .with_vlan(10, "users", None)
                .with_vlan(20, "voice", None),
            ReconcileOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(h.vids(id).await, BTreeSet::from([10, 20]));
    let vlan10 = h
        .mgr
        .store()
        .vlan_by_vid(VlanId::new(10).unwrap())
        .await
        .unwrap()
        .unwrap();

    h.mgr
        .reconcile(
            id,
            &DiscoveredInterface::default()
                .with_vlan(20, "voice", None)
                .with_vlan(30, "servers", None),
            ReconcileOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(h.vids(id).await, BTreeSet::from([20, 30]));
    let store = h.mgr.store();
    assert!(store
        .vlan_by_vid(VlanId::new(30).unwrap())
        .await
        .unwrap()
        .is_some());
    assert!(store.interface_vlan(id, vlan10.id).await.unwrap().is_none());
    // the VLAN itself outlives the membership
    assert!(store.vlan(vlan10.id).await.unwrap().is_some());
}

#[tokio::test]
async fn absent_vlan_section_leaves_memberships() {
    let h = Harness::new(InventoryConfig::default());
    let id = h.interface(h.switch, "Gi0/1").await;

    h.mgr
        .reconcile(
            id,
            &DiscoveredInterface::default().with_vlan(10, "users", None),
            ReconcileOptions::default(),
        )
        .await
        .unwrap();
    h.mgr
        .reconcile(id, &DiscoveredInterface::default(), ReconcileOptions::default())
        .await
        .unwrap();
    assert_eq!(h.vids(id).await, BTreeSet::from([10]));
}

#[tokio::test]
async fn loopback_is_a_noop() {
    let h = Harness::new(InventoryConfig::default());
    let id = h.interface(h.router, "Lo0").await;
    let iface = h.get(id).await;

    let before = h.mgr.store().snapshot();
    let resolution = h
        .mgr
        .resolve_ip(&iface, "127.0.0.1", Some("255.0.0.0"), ReconcileOptions::default())
        .await
        .unwrap();

    assert_eq!(resolution.ipblock, None);
    assert!(!resolution.ipv4_changed);
    assert_eq!(h.mgr.store().snapshot(), before);
}

#[tokio::test]
async fn subnet_and_host_created_from_mask() {
    let h = Harness::new(InventoryConfig::default());
    let id = h.interface(h.router, "Gi0/0").await;
    let iface = h.get(id).await;

    let resolution = h
        .mgr
        .resolve_ip(&iface, "10.0.0.5", Some("255.255.255.252"), ReconcileOptions::default())
        .await
        .unwrap();

    assert!(resolution.ipv4_changed);
    assert!(!resolution.ipv6_changed);

    let store = h.mgr.store();
    let subnet = store.ipblock(&prefix("10.0.0.4/30")).await.unwrap().unwrap();
    assert_eq!(subnet.status, IpStatus::Subnet);
    assert_eq!(subnet.interface, None);

    let host = store.ipblock(&prefix("10.0.0.5/32")).await.unwrap().unwrap();
    assert_eq!(host.status, IpStatus::Static);
    assert_eq!(host.interface, Some(id));
    assert_eq!(resolution.ipblock, Some(host));

    // a second poll changes nothing
    let again = h
        .mgr
        .resolve_ip(&iface, "10.0.0.5", Some("30"), ReconcileOptions::default())
        .await
        .unwrap();
    assert!(!again.ipv4_changed);
    assert_eq!(store.snapshot().ipblocks.len(), 2);
}

#[tokio::test]
async fn point_to_point_subnet_created() {
    let h = Harness::new(InventoryConfig::default());
    let id = h.interface(h.router, "Se0/0").await;
    let iface = h.get(id).await;

    let resolution = h
        .mgr
        .resolve_ip(&iface, "192.0.2.1", Some("255.255.255.254"), ReconcileOptions::default())
        .await
        .unwrap();

    let subnet = resolution.subnet.unwrap();
    assert_eq!(subnet.prefix, prefix("192.0.2.0/31"));
    assert_eq!(subnet.status, IpStatus::Subnet);
}

#[tokio::test]
async fn subnet_uses_single_vlan_membership() {
    let h = Harness::new(InventoryConfig::default());
    let id = h.interface(h.router, "Gi0/0.50").await;

    let outcome = h
        .mgr
        .reconcile(
            id,
            &DiscoveredInterface::default()
                .with_vlan(50, "transit", None)
                .with_ip("172.16.50.1", Some("255.255.255.0")),
            ReconcileOptions::default(),
        )
        .await
        .unwrap();
    assert!(outcome.ipv4_changed);

    let store = h.mgr.store();
    let vlan = store
        .vlan_by_vid(VlanId::new(50).unwrap())
        .await
        .unwrap()
        .unwrap();
    let subnet = store.ipblock(&prefix("172.16.50.0/24")).await.unwrap().unwrap();
    assert_eq!(subnet.vlan, Some(vlan.id));
}

#[tokio::test]
async fn batch_isolates_failures() {
    let h = Harness::new(InventoryConfig::default());
    let good = h.interface(h.router, "Gi0/0").await;
    let foreign = h.interface(h.switch, "Gi0/1").await;

    let entries = vec![
        DiscoveryEntry {
            interface: good,
            record: DiscoveredInterface::default().with_ip("10.9.0.1", Some("24")),
        },
        DiscoveryEntry {
            interface: 4242,
            record: DiscoveredInterface::default(),
        },
        DiscoveryEntry {
            interface: foreign,
            record: DiscoveredInterface::default(),
        },
    ];

    let report = h
        .mgr
        .reconcile_batch(h.router, &entries, ReconcileOptions::default())
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].interface.id, good);
    assert!(report.ipv4_changed);
    let failed: Vec<_> = report.failures.iter().map(|f| f.interface).collect();
    assert_eq!(failed, vec![4242, foreign]);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn batch_for_unknown_device_fails() {
    let h = Harness::new(InventoryConfig::default());
    let err = h
        .mgr
        .reconcile_batch(9999, &[], ReconcileOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::NotFound { entity: "Device", .. }));
}

#[tokio::test]
async fn snapshot_survives_restart() {
    let h = Harness::new(InventoryConfig::default());
    let a = h.interface(h.router, "Gi0/0").await;
    let b = h.interface(h.switch, "Gi0/24").await;
    h.mgr.add_neighbor(a, b, true).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.json");
    h.mgr.store().save(&path).unwrap();

    let restored = InterfaceMgr::new(
        Arc::new(MemoryStore::load(&path).unwrap()),
        InventoryConfig::default(),
    );
    let ia = restored.get(a).await.unwrap();
    assert_eq!(ia.neighbor, Some(b));
    assert!(ia.neighbor_fixed);
}

/// Forwards to a [`MemoryStore`] but yields to the scheduler before writing
/// an interface with `monitored` set, widening the read-modify-write window
/// of field updates.
struct YieldingStore {
    inner: MemoryStore,
}

#[async_trait]
impl Store for YieldingStore {
    async fn device(&self, id: DeviceId) -> netinv_core::Result<Option<Device>> {
        self.inner.device(id).await
    }
    async fn monitor_status_by_name(
        &self,
        name: &str,
    ) -> netinv_core::Result<Option<MonitorStatus>> {
        self.inner.monitor_status_by_name(name).await
    }
    async fn stp_instance(
        &self,
        device: DeviceId,
        number: u32,
    ) -> netinv_core::Result<Option<StpInstance>> {
        self.inner.stp_instance(device, number).await
    }
    async fn interface(&self, id: InterfaceId) -> netinv_core::Result<Option<Interface>> {
        self.inner.interface(id).await
    }
    async fn interfaces(&self) -> netinv_core::Result<Vec<Interface>> {
        self.inner.interfaces().await
    }
    async fn interfaces_with_neighbor(
        &self,
        id: InterfaceId,
    ) -> netinv_core::Result<Vec<Interface>> {
        self.inner.interfaces_with_neighbor(id).await
    }
    async fn insert_interface(&self, interface: Interface) -> netinv_core::Result<Interface> {
        self.inner.insert_interface(interface).await
    }
    async fn update_interface(&self, interface: &Interface) -> netinv_core::Result<()> {
        if interface.monitored {
            for _ in 0..20 {
                tokio::task::yield_now().await;
            }
        }
        self.inner.update_interface(interface).await
    }
    async fn delete_interface(&self, id: InterfaceId) -> netinv_core::Result<()> {
        self.inner.delete_interface(id).await
    }
    async fn physaddr_by_address(
        &self,
        address: &MacAddress,
    ) -> netinv_core::Result<Option<PhysAddr>> {
        self.inner.physaddr_by_address(address).await
    }
    async fn insert_physaddr(&self, physaddr: PhysAddr) -> netinv_core::Result<PhysAddr> {
        self.inner.insert_physaddr(physaddr).await
    }
    async fn update_physaddr(&self, physaddr: &PhysAddr) -> netinv_core::Result<()> {
        self.inner.update_physaddr(physaddr).await
    }
    async fn vlan(&self, id: VlanRecordId) -> netinv_core::Result<Option<Vlan>> {
        self.inner.vlan(id).await
    }
    async fn vlan_by_vid(&self, vid: VlanId) -> netinv_core::Result<Option<Vlan>> {
        self.inner.vlan_by_vid(vid).await
    }
    async fn insert_vlan(&self, vlan: Vlan) -> netinv_core::Result<Vlan> {
        self.inner.insert_vlan(vlan).await
    }
    async fn update_vlan(&self, vlan: &Vlan) -> netinv_core::Result<()> {
        self.inner.update_vlan(vlan).await
    }
    async fn interface_vlans(
        &self,
        interface: InterfaceId,
    ) -> netinv_core::Result<Vec<InterfaceVlan>> {
        self.inner.interface_vlans(interface).await
    }
    async fn interface_vlan(
        &self,
        interface: InterfaceId,
        vlan: VlanRecordId,
    ) -> netinv_core::Result<Option<InterfaceVlan>> {
        self.inner.interface_vlan(interface, vlan).await
    }
    async fn insert_interface_vlan(
        &self,
        membership: InterfaceVlan,
    ) -> netinv_core::Result<InterfaceVlan> {
        self.inner.insert_interface_vlan(membership).await
    }
    async fn update_interface_vlan(&self, membership: &InterfaceVlan) -> netinv_core::Result<()> {
        self.inner.update_interface_vlan(membership).await
    }
    async fn delete_interface_vlan(&self, id: InterfaceVlanId) -> netinv_core::Result<()> {
        self.inner.delete_interface_vlan(id).await
    }
    async fn ipblock(&self, prefix: &IpPrefix) -> netinv_core::Result<Option<Ipblock>> {
        self.inner.ipblock(prefix).await
    }
    async fn insert_ipblock(&self, block: Ipblock) -> netinv_core::Result<Ipblock> {
        self.inner.insert_ipblock(block).await
    }
    async fn update_ipblock(&self, block: &Ipblock) -> netinv_core::Result<()> {
        self.inner.update_ipblock(block).await
    }
}

#[tokio::test]
async fn field_update_racing_link_keeps_symmetry() {
    let inner = MemoryStore::new();
    let router = inner.add_device(Device::new(0, "rtr1")).id;
    let switch = inner.add_device(Device::new(0, "sw1")).id;
    let mgr = InterfaceMgr::new(Arc::new(YieldingStore { inner }), InventoryConfig::default());
    let a = mgr.create(NewInterface::new(router, "Gi0/0")).await.unwrap().id;
    let b = mgr.create(NewInterface::new(switch, "Gi0/24")).await.unwrap().id;

    let (updated, linked) = tokio::join!(
        mgr.update(
            a,
            InterfaceUpdate {
                monitored: Some(true),
                ..Default::default()
            },
        ),
        mgr.add_neighbor(a, b, true),
    );
    updated.unwrap();
    linked.unwrap();

    let (ia, ib) = (mgr.get(a).await.unwrap(), mgr.get(b).await.unwrap());
    assert!(ia.monitored);
    assert_eq!(ia.neighbor, Some(b));
    assert!(ia.neighbor_fixed);
    assert_eq!(ib.neighbor, Some(a));
    assert!(ib.neighbor_fixed);
}

#[test]
fn speed_strings() {
    assert_eq!(format_speed(1_544_000), "T1");
    assert_eq!(format_speed(1_000_000_000), "1.0 Gbps");
    assert_eq!(format_speed(100), "100 bps");
}
