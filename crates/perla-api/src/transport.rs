// Shared transport configuration for building reqwest::Client instances.
//
// The appliance speaks plain HTTP on the local network, so the only
// knobs are the request timeout and the user agent.

use std::time::Duration;

use crate::error::Error;

/// Default bound on a single status fetch, covering connect, send and
/// body read.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("perla/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// The overall deadline is enforced per request by the caller; the
    /// client only gets a connect timeout so a dead host fails fast.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .connect_timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Client(e.to_string()))
    }
}
