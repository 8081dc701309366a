// ── Runtime connection parameters ──
//
// These types describe *how* to reach one appliance. They carry
// credential data and polling cadence, but never touch disk.
// The CLI (or any other host) builds `ConnectionParams` and hands it in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use perla_api::{BasicAuth, PerlaClient, TransportConfig};

use crate::error::CoreError;

pub use perla_api::DEFAULT_TIMEOUT;

/// Port the appliance's local API listens on out of the box.
pub const DEFAULT_PORT: u16 = 8080;

/// Default time between the end of one cycle and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Floor on the poll interval so the appliance is not hammered.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Ceiling on the poll interval.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(3600);

/// HTTP Basic credentials for the appliance.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Everything needed to poll a single appliance.
///
/// Immutable for the lifetime of a [`Coordinator`](crate::Coordinator):
/// changing any field means building a new coordinator.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    /// Host name or IP address, without scheme.
    pub host: String,
    /// TCP port; `None` means the scheme default (80).
    pub port: Option<u16>,
    /// Basic-auth credentials; `None` when the appliance is open.
    pub credentials: Option<Credentials>,
    /// Delay between the end of one refresh cycle and the next.
    pub poll_interval: Duration,
    /// Deadline for a single fetch.
    pub timeout: Duration,
}

impl ConnectionParams {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: normalize_host(&host.into()),
            port: None,
            credentials: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Attach Basic credentials. An empty username means "no auth".
    pub fn with_credentials(mut self, username: impl Into<String>, password: SecretString) -> Self {
        let username = username.into().trim().to_owned();
        self.credentials = if username.is_empty() {
            None
        } else {
            Some(Credentials { username, password })
        };
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the invariants a coordinator relies on.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.host.is_empty() {
            return Err(CoreError::Validation {
                field: "host".into(),
                reason: "host cannot be empty".into(),
            });
        }
        if self.poll_interval < MIN_POLL_INTERVAL || self.poll_interval > MAX_POLL_INTERVAL {
            return Err(CoreError::Validation {
                field: "poll_interval".into(),
                reason: format!(
                    "must be between {}s and {}s, got {}s",
                    MIN_POLL_INTERVAL.as_secs(),
                    MAX_POLL_INTERVAL.as_secs(),
                    self.poll_interval.as_secs()
                ),
            });
        }
        if self.timeout.is_zero() {
            return Err(CoreError::Validation {
                field: "timeout".into(),
                reason: "timeout must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// `http://<host>[:<port>]/api/GetCurrentData`
    pub fn status_url(&self) -> Result<Url, CoreError> {
        Ok(PerlaClient::status_url_for(&self.host, self.port)?)
    }

    /// Identity of the appliance for de-duplicating configured entries.
    pub fn unique_id(&self) -> String {
        format!("{}:{}", self.host, self.port.unwrap_or(80))
    }

    /// Whether a password is present (for display; never reveals it).
    pub fn has_password(&self) -> bool {
        self.credentials
            .as_ref()
            .is_some_and(|c| !c.password.expose_secret().is_empty())
    }

    /// Build the fetcher for these parameters.
    pub fn build_client(&self) -> Result<PerlaClient, CoreError> {
        let url = self.status_url()?;
        let transport = TransportConfig::with_timeout(self.timeout);
        Ok(PerlaClient::new(url, self.basic_auth(), &transport)?)
    }

    fn basic_auth(&self) -> Option<BasicAuth> {
        self.credentials
            .as_ref()
            .map(|c| BasicAuth::new(c.username.clone(), c.password.clone()))
    }
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_owned()
}
