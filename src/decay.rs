//! Time-driven status decay: `succeeded`/`failed` fall back to `idle` after a
//! quiescence window.
//!
//! DESIGN
//! ======
//! One cancellable delayed task per resource. Entering a terminal state
//! aborts any armed timer and arms a new one; `begin` aborts it outright. The
//! timer only resets if the status epoch still matches the one it was armed
//! for, so an abort that loses the race against a firing timer is harmless.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::status::Resource;
use crate::store::SharedStore;

#[derive(Clone)]
pub struct StatusDecay {
    store: SharedStore,
    window: Duration,
    timers: Arc<Mutex<HashMap<Resource, JoinHandle<()>>>>,
}

impl StatusDecay {
    /// A zero `window` disables decay.
    #[must_use]
    pub fn new(store: SharedStore, window: Duration) -> Self {
        Self { store, window, timers: Arc::new(Mutex::new(HashMap::new())) }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedule a reset of `resource` for the terminal state stamped `epoch`.
    pub fn arm(&self, resource: Resource, epoch: u64) {
        if self.window.is_zero() {
            return;
        }
        let store = self.store.clone();
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if store.write().await.reset_if_current(resource, epoch) {
                debug!(resource = resource.as_str(), "status decayed to idle");
            }
        });

        let mut timers = self
            .timers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(previous) = timers.insert(resource, handle) {
            previous.abort();
        }
    }

    pub fn cancel(&self, resource: Resource) {
        let mut timers = self
            .timers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(handle) = timers.remove(&resource) {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_armed(&self, resource: Resource) -> bool {
        let timers = self
            .timers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        timers.get(&resource).is_some_and(|h| !h.is_finished())
    }
}

#[cfg(test)]
#[path = "decay_test.rs"]
mod tests;
