//! Per-entity write serialization.
//!
//! Each entity key maps to an async mutex. A write holds its entity's guard
//! from snapshot through settlement, so a second write to the same entity
//! starts only after the first has settled. Entries are dropped once nobody
//! holds or waits on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

use crate::store::EntityKey;

type Slot = Arc<tokio::sync::Mutex<()>>;

#[derive(Clone, Default)]
pub(crate) struct EntityLocks {
    slots: Arc<Mutex<HashMap<EntityKey, Slot>>>,
}

pub(crate) struct EntityGuard {
    key: EntityKey,
    locks: EntityLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl EntityLocks {
    pub(crate) async fn acquire(&self, key: EntityKey) -> EntityGuard {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            slots.entry(key).or_default().clone()
        };
        let guard = slot.lock_owned().await;
        EntityGuard { key, locks: self.clone(), guard: Some(guard) }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    fn release(&self, key: EntityKey) {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if slots.get(&key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(&key);
        }
    }
}

impl Drop for EntityGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(self.key);
    }
}
