//! netinv-core - Interface reconciliation engine
//!
//! Keeps a network inventory's interface records in line with what devices
//! report on each poll, without losing manually curated state.
//!
//! # Architecture
//!
//! ```text
//! discovery record ──► InterfaceMgr::reconcile
//!                        ├─ field sync + hardware address (lifecycle update)
//!                        ├─ VLAN membership diff + STP attributes
//!                        └─ resolve_ip per address (host + subnet)
//!
//! topology job ──────► InterfaceMgr::add_neighbor / remove_neighbor
//!                        (single writer for the neighbor graph)
//!
//!                     all writes ──► Store (async trait)
//! ```
//!
//! # Example
//!
//! ```
//! use netinv_core::{
//!     DiscoveredInterface, InterfaceMgr, InventoryConfig, MemoryStore, NewInterface,
//!     ReconcileOptions,
//! };
//! use netinv_core::model::Device;
//! use std::sync::Arc;
//!
//! # tokio_test_block(async {
//! let store = Arc::new(MemoryStore::new());
//! let device = store.add_device(Device::new(0, "core-sw1"));
//! let mgr = InterfaceMgr::new(store, InventoryConfig::default());
//!
//! let iface = mgr.create(NewInterface::new(device.id, "Gi0/1")).await.unwrap();
//! let record = DiscoveredInterface::default().with_vlan(10, "users", None);
//! let outcome = mgr
//!     .reconcile(iface.id, &record, ReconcileOptions::default())
//!     .await
//!     .unwrap();
//! assert!(outcome.warnings.is_empty());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod interface;
pub mod model;
mod speed;
pub mod store;

pub use config::{InventoryConfig, DEFAULT_CONFIG_PATH};
pub use discovery::{
    DiscoveredInterface, DiscoveredIp, DiscoveredVlan, DiscoveryEntry, InterfaceInfo,
    ReconcileOptions, StpPortState,
};
pub use error::{InventoryError, Result};
pub use interface::{
    BatchFailure, BatchReport, InterfaceMgr, IpResolution, ReconcileOutcome, SyncWarning,
    WarningKind,
};
pub use model::{InterfaceUpdate, NeighborUpdate, NewInterface};
pub use speed::format_speed;
pub use store::{MemoryStore, Store, StoreSnapshot};
