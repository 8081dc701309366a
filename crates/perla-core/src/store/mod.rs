// ── Coordinator state storage ──
//
// Lock-free snapshot storage plus the listener set that is told about
// every completed cycle.

mod listeners;
mod state_store;

pub use listeners::{Listener, Subscription};
pub use state_store::CoordinatorState;

pub(crate) use listeners::ListenerSet;
pub(crate) use state_store::StateStore;
