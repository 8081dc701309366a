// perla-api: Async Rust client for the BWT Perla local status endpoint

pub mod client;
pub mod error;
pub mod transport;

pub use client::{BasicAuth, PerlaClient, STATUS_PATH, StatusPayload};
pub use error::{Error, FailureKind};
pub use transport::{DEFAULT_TIMEOUT, TransportConfig};
