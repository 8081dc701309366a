// ── Atomic coordinator state ──
//
// Snapshot, availability, and bookkeeping live in one immutable record
// that is swapped as a whole. Readers never lock and never observe a
// half-applied cycle.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::outcome::{FetchError, RefreshOutcome};
use crate::snapshot::Snapshot;

/// Everything a reader can learn about the appliance, as of the last
/// completed cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoordinatorState {
    /// Last known-good snapshot, possibly several cycles old.
    pub snapshot: Option<Arc<Snapshot>>,
    /// `true` iff the most recent completed cycle succeeded.
    pub available: bool,
    /// Failure of the most recent cycle, cleared on success.
    pub last_error: Option<FetchError>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    /// Completed cycles, successful or not.
    pub cycles: u64,
}

/// Single-writer, many-reader holder of the current [`CoordinatorState`].
pub(crate) struct StateStore {
    state: ArcSwap<CoordinatorState>,
}

impl StateStore {
    pub(crate) fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(CoordinatorState::default()),
        }
    }

    pub(crate) fn load(&self) -> Arc<CoordinatorState> {
        self.state.load_full()
    }

    pub(crate) fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.state.load().snapshot.clone()
    }

    pub(crate) fn is_available(&self) -> bool {
        self.state.load().available
    }

    /// Fold a completed cycle into a new state and publish it.
    ///
    /// Only the coordinator's cycle-completion step calls this, and at
    /// most one cycle is in flight, so load-then-store cannot race.
    pub(crate) fn apply(&self, outcome: &RefreshOutcome) -> Arc<CoordinatorState> {
        let prev = self.state.load_full();
        let now = Utc::now();

        let next = match outcome {
            RefreshOutcome::Success(snapshot) => CoordinatorState {
                snapshot: Some(Arc::clone(snapshot)),
                available: true,
                last_error: None,
                last_success: Some(now),
                last_attempt: Some(now),
                cycles: prev.cycles + 1,
            },
            RefreshOutcome::Failure(err) => CoordinatorState {
                snapshot: prev.snapshot.clone(),
                available: false,
                last_error: Some(err.clone()),
                last_success: prev.last_success,
                last_attempt: Some(now),
                cycles: prev.cycles + 1,
            },
        };

        let next = Arc::new(next);
        self.state.store(Arc::clone(&next));
        next
    }
}
