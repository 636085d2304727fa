//! Neighbor link arbitration.
//!
//! Each interface has one neighbor slot. A link is always written to both
//! slots, and a slot pinned by an operator (`neighbor_fixed`) is never
//! replaced by automatic discovery. All mutations hold `neighbor_lock`, so
//! the clear-then-set sequence below never interleaves with another one.

use super::InterfaceMgr;
use crate::error::{InventoryError, Result};
use crate::model::{DeviceId, Interface, InterfaceId};
use crate::store::Store;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

impl<S: Store> InterfaceMgr<S> {
    /// Links `id` and `neighbor` symmetrically.
    ///
    /// Re-adding an existing link is a no-op whatever `fixed` says; to pin
    /// an automatic link, remove it first. Fails with a user error if either
    /// side is pinned to some other interface.
    #[instrument(skip(self))]
    pub async fn add_neighbor(
        &self,
        id: InterfaceId,
        neighbor: InterfaceId,
        fixed: bool,
    ) -> Result<()> {
        if neighbor == 0 {
            return Err(InventoryError::validation("neighbor id is required"));
        }
        if neighbor == id {
            return Err(InventoryError::user(format!(
                "Interface {} cannot be its own neighbor",
                id
            )));
        }

        let _guard = self.neighbor_lock.lock().await;

        let this = self.get(id).await?;
        let other = self.get(neighbor).await?;

        if this.neighbor == Some(neighbor) && other.neighbor == Some(id) {
            debug!(id, neighbor, "Neighbor link already in place");
            return Ok(());
        }

        for (side, partner) in [(&this, neighbor), (&other, id)] {
            if side.is_pinned_elsewhere(partner) {
                return Err(InventoryError::user(format!(
                    "Interface {} is manually linked to {}",
                    side.id,
                    side.neighbor.unwrap_or_default()
                )));
            }
        }

        self.clear_slots(id).await?;
        self.clear_slots(neighbor).await?;

        let mut this = self.get(id).await?;
        let mut other = self.get(neighbor).await?;
        for (side, partner) in [(&mut this, neighbor), (&mut other, id)] {
            side.neighbor = Some(partner);
            side.neighbor_fixed = fixed;
            side.neighbor_missed = 0;
        }
        self.store.update_interface(&this).await?;
        self.store.update_interface(&other).await?;

        info!(id, neighbor, fixed, "Linked neighbors");
        Ok(())
    }

    /// Clears the neighbor slot of `id` and of every interface pointing at
    /// it. Succeeds on an already empty slot.
    #[instrument(skip(self))]
    pub async fn remove_neighbor(&self, id: InterfaceId) -> Result<()> {
        let _guard = self.neighbor_lock.lock().await;
        self.clear_slots(id).await
    }

    /// Records a poll in which the neighbor of `id` was not seen.
    ///
    /// Automatic links are dropped once the miss count exceeds
    /// `max_neighbor_missed`; pinned links only accumulate the count.
    #[instrument(skip(self))]
    pub async fn record_neighbor_missed(&self, id: InterfaceId) -> Result<Interface> {
        let _guard = self.neighbor_lock.lock().await;

        let mut interface = self.get(id).await?;
        let Some(neighbor) = interface.neighbor else {
            return Ok(interface);
        };

        interface.neighbor_missed = interface.neighbor_missed.saturating_add(1);
        if !interface.neighbor_fixed && interface.neighbor_missed > self.config.max_neighbor_missed
        {
            info!(
                id,
                neighbor,
                missed = interface.neighbor_missed,
                "Neighbor aged out"
            );
            self.clear_slots(id).await?;
            return self.get(id).await;
        }

        self.store.update_interface(&interface).await?;
        debug!(id, missed = interface.neighbor_missed, "Neighbor missed");
        Ok(interface)
    }

    /// Records a poll in which the neighbor of `id` was seen again.
    #[instrument(skip(self))]
    pub async fn record_neighbor_seen(&self, id: InterfaceId) -> Result<()> {
        let _guard = self.neighbor_lock.lock().await;

        let interface = self.get(id).await?;
        let partner = match interface.neighbor {
            Some(neighbor) => self.store.interface(neighbor).await?,
            None => None,
        };
        let sides = std::iter::once(interface).chain(partner);

        for mut side in sides {
            if side.neighbor_missed != 0 {
                side.neighbor_missed = 0;
                self.store.update_interface(&side).await?;
            }
        }
        Ok(())
    }

    /// Finds linked pairs that are both up but disagree on duplex.
    ///
    /// Each pair is reported once as `(lower id, higher id)`. With
    /// `filter_ignored`, pairs touching a device whose product is on the
    /// `ignore_duplex` list are dropped.
    #[instrument(skip(self))]
    pub async fn find_duplex_mismatches(
        &self,
        filter_ignored: bool,
    ) -> Result<Vec<(InterfaceId, InterfaceId)>> {
        let interfaces: HashMap<InterfaceId, Interface> = self
            .store
            .interfaces()
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        let mut ignored: HashMap<DeviceId, bool> = HashMap::new();
        let mut pairs = Vec::new();

        for a in interfaces.values() {
            let Some(b) = a
                .neighbor
                .filter(|&n| a.id < n)
                .and_then(|n| interfaces.get(&n))
            else {
                continue;
            };

            let both_up = a.oper_status.is_some_and(|s| s.is_up())
                && b.oper_status.is_some_and(|s| s.is_up());
            let mismatch = match (a.oper_duplex, b.oper_duplex) {
                (Some(da), Some(db)) => da != db,
                _ => false,
            };
            if !both_up || !mismatch {
                continue;
            }

            if filter_ignored && !self.config.ignore_duplex.is_empty() {
                let mut skip = false;
                for device in [a.device, b.device] {
                    let is_ignored = match ignored.get(&device) {
                        Some(&known) => known,
                        None => {
                            let known = self
                                .store
                                .device(device)
                                .await?
                                .and_then(|d| d.product)
                                .is_some_and(|p| self.config.ignores_duplex_for(&p));
                            ignored.insert(device, known);
                            known
                        }
                    };
                    skip |= is_ignored;
                }
                if skip {
                    debug!(a = a.id, b = b.id, "Duplex mismatch ignored for product");
                    continue;
                }
            }

            pairs.push((a.id, b.id));
        }

        pairs.sort_unstable();
        Ok(pairs)
    }

    /// Clears `id`'s slot and every slot pointing at it. Caller holds
    /// `neighbor_lock`.
    async fn clear_slots(&self, id: InterfaceId) -> Result<()> {
        let mut interface = self.get(id).await?;
        if interface.neighbor.is_some()
            || interface.neighbor_fixed
            || interface.neighbor_missed != 0
        {
            interface.clear_neighbor();
            self.store.update_interface(&interface).await?;
        }

        for mut peer in self.store.interfaces_with_neighbor(id).await? {
            if peer.id == id {
                continue;
            }
            peer.clear_neighbor();
            self.store.update_interface(&peer).await?;
            debug!(id, peer = peer.id, "Cleared pointing neighbor");
        }
        Ok(())
    }
}
