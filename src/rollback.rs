//! Rollback snapshots: the last known-good value of entities with an
//! optimistic edit in flight.
//!
//! At most one entry per id. `snapshot` upserts, `take` hands the value back
//! for restoration and forgets it, `clear` forgets it after a confirmed write.
//! Applying a restored value to the board graph is the store's job.

use std::collections::HashMap;
use std::hash::Hash;

use crate::model::{Board, BoardId, Task, TaskId};

/// An entity that can be snapshotted by id.
pub trait Snapshot: Clone {
    type Id: Copy + Eq + Hash + std::fmt::Debug;

    fn snapshot_id(&self) -> Self::Id;
}

impl Snapshot for Task {
    type Id = TaskId;

    fn snapshot_id(&self) -> TaskId {
        self.id
    }
}

impl Snapshot for Board {
    type Id = BoardId;

    fn snapshot_id(&self) -> BoardId {
        self.id
    }
}

#[derive(Debug, Clone)]
pub struct RollbackRegistry<T: Snapshot> {
    entries: HashMap<T::Id, T>,
}

impl<T: Snapshot> Default for RollbackRegistry<T> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<T: Snapshot> RollbackRegistry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `entity` as the value to restore on failure, replacing any prior entry.
    pub fn snapshot(&mut self, entity: &T) {
        self.entries.insert(entity.snapshot_id(), entity.clone());
    }

    /// Remove and return the stored value.
    pub fn take(&mut self, id: T::Id) -> Option<T> {
        self.entries.remove(&id)
    }

    /// Forget the stored value without restoring it.
    pub fn clear(&mut self, id: T::Id) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Replace the stored value if one exists. Used when fresher server data
    /// arrives while an edit is still in flight.
    pub fn rebase(&mut self, entity: &T) -> bool {
        match self.entries.get_mut(&entity.snapshot_id()) {
            Some(slot) => {
                *slot = entity.clone();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.entries.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: T::Id) -> bool {
        self.entries.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "rollback_test.rs"]
mod tests;
