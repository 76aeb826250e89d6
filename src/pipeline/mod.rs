//! Optimistic mutation pipeline — every board and task write goes through here.
//!
//! DESIGN
//! ======
//! Each operation follows one shape: validate, apply an optimistic change to
//! the store (a temp entity for creates, a snapshot plus edit for updates, a
//! removal for deletes), call the remote API with no store guard held, then
//! reconcile on success or compensate on failure. Status is bracketed with
//! `begin` and exactly one terminal transition per call.
//!
//! Writes to an existing entity hold that entity's lock from snapshot through
//! settlement, so same-entity edits apply one after another. Creates do not:
//! their temp entity is unknown to the server and edits to it stay local until
//! the create settles, at which point the local fields are sent as a follow-up
//! update.
//!
//! ERROR HANDLING
//! ==============
//! Operations never return `Err`. A failure is logged, compensated, recorded
//! on the status machine with the error's display text, and handed back as
//! [`Settlement::Failed`]. Nothing is retried.

mod boards;
mod locks;
mod tasks;

#[cfg(test)]
mod mock_api;

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ApiError, BoardApi, HttpBoardApi};
use crate::config::ClientConfig;
use crate::decay::StatusDecay;
use crate::status::Resource;
use crate::store::{EntityKey, FetchKey, SharedStore, Store};

use self::locks::EntityLocks;

// =============================================================================
// SETTLEMENT
// =============================================================================

/// How a pipeline operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Settlement {
    Succeeded,
    Failed(ApiError),
    /// The request succeeded but a newer fetch or write for the same data
    /// had already been issued, so the response was discarded.
    Superseded,
}

impl Settlement {
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    #[must_use]
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

#[derive(Clone)]
pub struct Pipeline {
    api: Arc<dyn BoardApi>,
    store: SharedStore,
    locks: EntityLocks,
    decay: StatusDecay,
}

impl Pipeline {
    #[must_use]
    pub fn new(api: Arc<dyn BoardApi>, config: &ClientConfig) -> Self {
        Self::with_store(api, Store::shared(config.event_capacity), config)
    }

    #[must_use]
    pub fn with_store(api: Arc<dyn BoardApi>, store: SharedStore, config: &ClientConfig) -> Self {
        let decay = StatusDecay::new(store.clone(), config.status_reset);
        Self { api, store, locks: EntityLocks::default(), decay }
    }

    /// Build a pipeline over the HTTP adapter.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be constructed.
    pub fn connect(config: &ClientConfig) -> Result<Self, ApiError> {
        let api = HttpBoardApi::from_config(config)?;
        Ok(Self::new(Arc::new(api), config))
    }

    /// The store this pipeline writes to. Outside the crate it is read-only.
    #[must_use]
    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    // =========================================================================
    // STATUS BRACKETING
    // =========================================================================

    async fn begin(&self, resource: Resource) {
        self.decay.cancel(resource);
        self.store.write().await.begin(resource);
    }

    /// `begin` plus a fresh generation for `key`, under one guard.
    async fn begin_fetch(&self, resource: Resource, key: FetchKey) -> u64 {
        self.decay.cancel(resource);
        let mut store = self.store.write().await;
        store.begin(resource);
        store.next_generation(key)
    }

    fn mark_succeeded(&self, store: &mut Store, resource: Resource) {
        let epoch = store.succeed(resource);
        self.decay.arm(resource, epoch);
    }

    fn succeed_in(&self, store: &mut Store, resource: Resource) -> Settlement {
        self.mark_succeeded(store, resource);
        Settlement::Succeeded
    }

    /// A successful request whose data was discarded.
    fn supersede_in(&self, store: &mut Store, resource: Resource) -> Settlement {
        self.mark_succeeded(store, resource);
        Settlement::Superseded
    }

    fn fail_in(&self, store: &mut Store, resource: Resource, error: ApiError) -> Settlement {
        warn!(resource = resource.as_str(), error = %error, "operation failed");
        let epoch = store.fail(resource, error.to_string());
        self.decay.arm(resource, epoch);
        Settlement::Failed(error)
    }

    async fn succeed(&self, resource: Resource) -> Settlement {
        let mut store = self.store.write().await;
        self.succeed_in(&mut store, resource)
    }

    async fn fail(&self, resource: Resource, error: ApiError) -> Settlement {
        let mut store = self.store.write().await;
        self.fail_in(&mut store, resource, error)
    }

    // =========================================================================
    // ORPHANS
    // =========================================================================

    /// Delete a server entity whose temp placeholder was removed locally while
    /// its create was in flight. Best effort: failure is logged only.
    async fn delete_orphan(&self, key: EntityKey) {
        let result = match key {
            EntityKey::Board(id) => self.api.delete_board(id).await,
            EntityKey::Task(id) => self.api.delete_task(id).await,
        };
        match result {
            Ok(()) => info!(?key, "orphaned entity deleted"),
            Err(e) => warn!(?key, error = %e, "orphaned entity cleanup failed"),
        }
    }
}

fn board_not_found() -> ApiError {
    ApiError::NotFound("Board not found".into())
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".into())
}

fn board_still_creating() -> ApiError {
    ApiError::Validation("Board is still being created".into())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
