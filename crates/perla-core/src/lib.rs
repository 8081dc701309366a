//! Polling layer between `perla-api` and its consumers (CLI, dashboards).
//!
//! This crate owns the refresh lifecycle and the presentation model for a
//! BWT Perla water softener:
//!
//! - **[`Coordinator`]**: Single-flight poller for one appliance.
//!   [`start()`](Coordinator::start) runs a refresh immediately and then
//!   once per quiet interval; [`request_refresh()`](Coordinator::request_refresh)
//!   joins the in-flight cycle instead of issuing a second request. Readers
//!   use [`current_snapshot()`](Coordinator::current_snapshot) and
//!   [`is_available()`](Coordinator::is_available), or
//!   [`register()`](Coordinator::register) a listener.
//!
//! - **[`Snapshot`]**: Immutable copy of the last successfully decoded
//!   status document, shared as `Arc<Snapshot>`. A failed cycle never
//!   replaces it.
//!
//! - **[`readings`]**: Static descriptors that turn raw fields into typed,
//!   named readings (scaled volumes, local timestamps, problem flags).
//!
//! - **[`setup`]**: Validate-and-probe flow used before an appliance entry
//!   is saved.
//!
//! - **[`diagnostics`]**: Redacted state export.

pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod error;
pub mod outcome;
pub mod readings;
pub mod setup;
pub mod snapshot;
pub mod store;
pub mod translations;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    ConnectionParams, Credentials, DEFAULT_POLL_INTERVAL, DEFAULT_PORT, DEFAULT_TIMEOUT,
    MAX_POLL_INTERVAL, MIN_POLL_INTERVAL,
};
pub use coordinator::Coordinator;
pub use diagnostics::{DiagnosticsReport, diagnostics};
pub use error::CoreError;
pub use outcome::{FetchError, RefreshOutcome};
pub use readings::{DEVICE_INFO, Reading, ReadingValue, read_all};
pub use setup::{SetupFlow, SetupInput, SetupOutcome, probe};
pub use snapshot::Snapshot;
pub use store::{CoordinatorState, Listener, Subscription};

pub use perla_api::FailureKind;
