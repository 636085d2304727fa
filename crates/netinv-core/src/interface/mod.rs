//! Interface manager.
//!
//! [`InterfaceMgr`] owns every write to interface records and the entities
//! hanging off them. Its operations are split by concern:
//!
//! - `lifecycle`: create / update / delete with policy defaults
//! - `neighbor`: symmetric neighbor links and duplex diagnostics
//! - `ip_resolver`: host address and subnet upsert
//! - `reconcile`: per-poll discovery sync, composing the above

mod ip_resolver;
mod lifecycle;
mod neighbor;
mod reconcile;
mod types;

pub use types::{
    BatchFailure, BatchReport, IpResolution, ReconcileOutcome, SyncWarning, WarningKind,
};

use crate::config::InventoryConfig;
use crate::discovery::ReconcileOptions;
use crate::error::{InventoryError, Result};
use crate::model::{Device, DeviceId, Interface, InterfaceId};
use crate::store::Store;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Reconciliation engine for interface records.
pub struct InterfaceMgr<S> {
    store: Arc<S>,
    config: InventoryConfig,
    /// Held by every neighbor graph mutation and every whole-record
    /// interface write.
    neighbor_lock: Mutex<()>,
}

impl<S: Store> InterfaceMgr<S> {
    /// Creates a manager over `store` with the given policy.
    pub fn new(store: Arc<S>, config: InventoryConfig) -> Self {
        Self {
            store,
            config,
            neighbor_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Reconcile options taken from the injected policy rather than
    /// [`ReconcileOptions::default`].
    pub fn default_options(&self) -> ReconcileOptions {
        ReconcileOptions::from(&self.config)
    }

    /// Loads an interface or fails with `NotFound`.
    pub async fn get(&self, id: InterfaceId) -> Result<Interface> {
        self.store
            .interface(id)
            .await?
            .ok_or_else(|| InventoryError::not_found("Interface", id))
    }

    async fn device(&self, id: DeviceId) -> Result<Device> {
        self.store
            .device(id)
            .await?
            .ok_or_else(|| InventoryError::not_found("Device", id))
    }
}

/// Logs a warning and appends it to `warnings`.
fn push_warning(warnings: &mut Vec<SyncWarning>, warning: SyncWarning) {
    warn!(
        kind = %warning.kind,
        subject = %warning.subject,
        "{}",
        warning.message
    );
    warnings.push(warning);
}
