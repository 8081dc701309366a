// ── Listener registration ──
//
// Unordered set of readers interested in cycle completions. Membership
// is owned by the caller through a `Subscription` handle: dropping the
// handle removes the listener.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::trace;

use super::CoordinatorState;

/// Something that wants to hear about every completed refresh cycle.
///
/// Called once per cycle, after the new state is published. Keep it
/// quick: the next cycle does not start until all listeners return.
pub trait Listener: Send + Sync + 'static {
    fn on_refresh(&self, state: &CoordinatorState);
}

impl<F> Listener for F
where
    F: Fn(&CoordinatorState) + Send + Sync + 'static,
{
    fn on_refresh(&self, state: &CoordinatorState) {
        self(state);
    }
}

pub(crate) struct ListenerSet {
    next_id: AtomicU64,
    listeners: DashMap<u64, Arc<dyn Listener>>,
}

impl ListenerSet {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: DashMap::new(),
        }
    }

    pub(crate) fn insert(&self, listener: Arc<dyn Listener>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(id, listener);
        trace!(id, "listener registered");
        id
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        if removed {
            trace!(id, "listener removed");
        }
        removed
    }

    /// Call every registered listener exactly once.
    ///
    /// The set is copied first so a listener may drop its own (or any
    /// other) subscription without deadlocking on a map shard.
    pub(crate) fn notify(&self, state: &CoordinatorState) {
        let listeners: Vec<Arc<dyn Listener>> = self
            .listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for listener in listeners {
            listener.on_refresh(state);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

/// Handle for a registered listener. Dropping it unregisters.
#[must_use = "dropping a Subscription immediately unregisters the listener"]
pub struct Subscription {
    id: u64,
    set: Weak<ListenerSet>,
}

impl Subscription {
    pub(crate) fn new(id: u64, set: &Arc<ListenerSet>) -> Self {
        Self {
            id,
            set: Arc::downgrade(set),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Unregister now instead of at drop.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(set) = self.set.upgrade() {
            set.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
