// ── Poll coordinator ──
//
// Owns the refresh cadence, the single authoritative snapshot, and
// fan-out to listeners for one appliance. Concurrent refresh requests
// collapse into the one in-flight fetch.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use perla_api::{FailureKind, PerlaClient};

use crate::config::ConnectionParams;
use crate::error::CoreError;
use crate::outcome::{FetchError, RefreshOutcome};
use crate::snapshot::Snapshot;
use crate::store::{CoordinatorState, Listener, ListenerSet, StateStore, Subscription};

type OutcomeSlot = watch::Receiver<Option<RefreshOutcome>>;

/// Polls one appliance and shares the latest snapshot with any number
/// of readers.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Construction does not
/// touch the network: call [`start()`](Self::start) for the periodic
/// timer, or [`request_refresh()`](Self::request_refresh) for an
/// on-demand cycle.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    params: ConnectionParams,
    client: PerlaClient,
    store: StateStore,
    listeners: Arc<ListenerSet>,
    /// Pending-operation slot. `Some` while a cycle is in flight; every
    /// waiter holds a clone of the receiver.
    in_flight: Mutex<Option<OutcomeSlot>>,
    /// Pinged after each completed cycle so the timer can re-arm.
    cycle_done: Notify,
    cancel: CancellationToken,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    /// Create a coordinator for `params`. Does NOT fetch.
    pub fn new(params: ConnectionParams) -> Result<Self, CoreError> {
        params.validate()?;
        let client = params.build_client()?;
        Ok(Self::with_client(params, client))
    }

    /// Create a coordinator around an existing fetcher.
    pub fn with_client(params: ConnectionParams, client: PerlaClient) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                params,
                client,
                store: StateStore::new(),
                listeners: Arc::new(ListenerSet::new()),
                in_flight: Mutex::new(None),
                cycle_done: Notify::new(),
                cancel: CancellationToken::new(),
                task_handle: Mutex::new(None),
            }),
        }
    }

    /// The immutable connection parameters.
    pub fn params(&self) -> &ConnectionParams {
        &self.inner.params
    }

    /// The URL polled every cycle.
    pub fn status_url(&self) -> &url::Url {
        self.inner.client.status_url()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the periodic refresh task.
    ///
    /// The first cycle runs immediately. After that the timer is armed
    /// only once a cycle has completed, so a slow appliance never causes
    /// overlapping cycles. Calling `start()` twice is a no-op.
    pub fn start(&self) {
        let mut handle = self
            .inner
            .task_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if handle.is_some() {
            return;
        }

        let coordinator = self.clone();
        let cancel = self.inner.cancel.clone();
        *handle = Some(tokio::spawn(refresh_task(coordinator, cancel)));

        info!(
            url = %self.status_url(),
            interval_secs = self.inner.params.poll_interval.as_secs(),
            "coordinator started"
        );
    }

    /// Stop the periodic refresh task and wait for it to exit.
    ///
    /// A fetch already in flight still completes and is still delivered
    /// to its waiters. Shutdown is final: the timer cannot be restarted.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let handle = self
            .inner
            .task_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        debug!("coordinator stopped");
    }

    /// Whether the periodic task is running.
    pub fn is_running(&self) -> bool {
        !self.inner.cancel.is_cancelled()
            && self
                .inner
                .task_handle
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some()
    }

    // ── Listeners ────────────────────────────────────────────────

    /// Add a listener that is called once per completed cycle.
    ///
    /// Does not trigger a refresh. Dropping the returned handle removes
    /// the listener.
    pub fn register(&self, listener: impl Listener) -> Subscription {
        let id = self.inner.listeners.insert(Arc::new(listener));
        Subscription::new(id, &self.inner.listeners)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Make sure a refresh is in flight and wait for its outcome.
    ///
    /// If a cycle is already running this joins it instead of starting
    /// another, so the appliance sees at most one outstanding request.
    /// All joined callers receive the same outcome. The cycle runs on
    /// its own task: a caller that stops waiting does not cancel it.
    pub async fn request_refresh(&self) -> RefreshOutcome {
        let mut slot = self.join_or_start_cycle();

        let outcome = slot
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|outcome| (*outcome).clone());

        outcome.unwrap_or_else(|| {
            RefreshOutcome::Failure(FetchError::new(
                FailureKind::Connection,
                "refresh task ended without an outcome",
            ))
        })
    }

    fn join_or_start_cycle(&self) -> OutcomeSlot {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(slot) = in_flight.as_ref() {
            trace!("joining in-flight refresh");
            return slot.clone();
        }

        let (tx, rx) = watch::channel(None);
        *in_flight = Some(rx.clone());
        drop(in_flight);

        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.run_cycle(tx).await });
        rx
    }

    /// One complete cycle: fetch, publish, notify, release waiters.
    async fn run_cycle(&self, tx: watch::Sender<Option<RefreshOutcome>>) {
        // Clears the slot even if a listener panics.
        let guard = InFlightGuard(&self.inner.in_flight);

        let was_available = self.inner.store.is_available();
        let outcome = self.fetch().await;
        let state = self.inner.store.apply(&outcome);

        match (&outcome, was_available) {
            (RefreshOutcome::Success(snapshot), false) => {
                info!(fields = snapshot.len(), "appliance available");
            }
            (RefreshOutcome::Success(snapshot), true) => {
                debug!(fields = snapshot.len(), "refresh complete");
            }
            (RefreshOutcome::Failure(err), true) => {
                warn!(kind = %err.kind, error = %err.message, "appliance unavailable");
            }
            (RefreshOutcome::Failure(err), false) => {
                debug!(kind = %err.kind, error = %err.message, "appliance still unavailable");
            }
        }

        self.inner.listeners.notify(&state);
        drop(guard);

        self.inner.cycle_done.notify_waiters();
        tx.send_replace(Some(outcome));
    }

    async fn fetch(&self) -> RefreshOutcome {
        match self.inner.client.fetch_status().await {
            Ok(payload) => RefreshOutcome::Success(Arc::new(Snapshot::from(payload))),
            Err(err) => RefreshOutcome::Failure(FetchError::from(&err)),
        }
    }

    // ── Readers ──────────────────────────────────────────────────

    /// Last known-good snapshot, or `None` if no cycle has succeeded yet.
    pub fn current_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.store.snapshot()
    }

    /// `true` iff the most recently completed cycle succeeded.
    pub fn is_available(&self) -> bool {
        self.inner.store.is_available()
    }

    /// Full state as of the last completed cycle.
    pub fn state(&self) -> Arc<CoordinatorState> {
        self.inner.store.load()
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("url", &self.status_url().as_str())
            .field("available", &self.is_available())
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

struct InFlightGuard<'a>(&'a Mutex<Option<OutcomeSlot>>);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

// ── Background task ──────────────────────────────────────────────

/// Refresh immediately, then once per quiet interval.
///
/// Any completed cycle, including a manual one, re-arms the timer, so the
/// interval is always measured from the end of the latest cycle.
async fn refresh_task(coordinator: Coordinator, cancel: CancellationToken) {
    let interval = coordinator.inner.params.poll_interval;

    'cycles: loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break 'cycles,
            _ = coordinator.request_refresh() => {}
        }

        loop {
            let completed = coordinator.inner.cycle_done.notified();
            tokio::select! {
                biased;
                () = cancel.cancelled() => break 'cycles,
                () = completed => {
                    trace!("cycle completed elsewhere; re-arming timer");
                }
                () = tokio::time::sleep(interval) => break,
            }
        }
    }

    debug!("refresh task stopped");
}
