// ── Setup flow ──
//
// Validates user input for a new appliance entry, rejects duplicates, and
// probes the appliance once before anything is saved. Transport detail
// stays in the logs; the caller only sees stable error keys.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;
use tracing::{debug, info};

use perla_api::StatusPayload;

use crate::config::{
    ConnectionParams, DEFAULT_POLL_INTERVAL, DEFAULT_PORT, DEFAULT_TIMEOUT, MAX_POLL_INTERVAL,
    MIN_POLL_INTERVAL,
};
use crate::outcome::FetchError;

/// Form-level error key for a failed probe.
pub const ERROR_CANNOT_CONNECT: &str = "cannot_connect";
/// Field error key for a blank host.
pub const ERROR_INVALID_HOST: &str = "invalid_host";
/// Field error key for a poll interval outside the allowed range.
pub const ERROR_OUT_OF_RANGE: &str = "out_of_range";
/// Abort reason when the same host and port is already configured.
pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";

/// Key under which form-wide errors are reported.
pub const BASE_ERROR: &str = "base";

/// What the user typed into the setup form.
#[derive(Debug, Clone)]
pub struct SetupInput {
    pub host: String,
    /// `None` or `Some(0)` means the scheme default (80).
    pub port: Option<u16>,
    pub username: String,
    pub password: SecretString,
    pub poll_interval_secs: u64,
}

impl Default for SetupInput {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: Some(DEFAULT_PORT),
            username: String::new(),
            password: SecretString::from(String::new()),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl SetupInput {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    fn to_params(&self, timeout: Duration) -> ConnectionParams {
        let mut params = ConnectionParams::new(self.host.as_str())
            .with_credentials(self.username.as_str(), self.password.clone())
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs))
            .with_timeout(timeout);
        if let Some(port) = self.port.filter(|p| *p != 0) {
            params = params.with_port(port);
        }
        params
    }
}

/// Result of submitting the setup form.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SetupOutcome {
    /// Probe succeeded; the caller should persist the entry.
    CreateEntry {
        title: String,
        unique_id: String,
        #[serde(skip)]
        params: ConnectionParams,
    },
    /// Show the form again with these errors, keyed by field or `base`.
    ShowForm { errors: BTreeMap<String, String> },
    /// Stop the flow.
    Abort { reason: String },
}

/// One fetch against the appliance described by `params`.
pub async fn probe(params: &ConnectionParams) -> Result<StatusPayload, FetchError> {
    let client = params
        .build_client()
        .map_err(|e| FetchError::new(perla_api::FailureKind::Connection, e.to_string()))?;
    client.fetch_status().await.map_err(FetchError::from)
}

/// Drives the single-step setup form.
#[derive(Debug, Clone)]
pub struct SetupFlow {
    timeout: Duration,
}

impl Default for SetupFlow {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SetupFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline for the probe request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate, de-duplicate, and probe.
    ///
    /// `existing` holds the unique ids of entries that are already
    /// configured.
    pub async fn submit(&self, input: &SetupInput, existing: &HashSet<String>) -> SetupOutcome {
        let params = input.to_params(self.timeout);

        let errors = field_errors(&params);
        if !errors.is_empty() {
            return SetupOutcome::ShowForm { errors };
        }

        let unique_id = params.unique_id();
        if existing.contains(&unique_id) {
            info!(%unique_id, "appliance already configured");
            return SetupOutcome::Abort {
                reason: ABORT_ALREADY_CONFIGURED.to_owned(),
            };
        }

        match probe(&params).await {
            Ok(payload) => {
                info!(%unique_id, fields = payload.len(), "appliance reachable");
                SetupOutcome::CreateEntry {
                    title: format!("BWT Perla ({})", params.host),
                    unique_id,
                    params,
                }
            }
            Err(err) => {
                debug!(%unique_id, kind = %err.kind, error = %err.message, "setup probe failed");
                let mut errors = BTreeMap::new();
                errors.insert(BASE_ERROR.to_owned(), ERROR_CANNOT_CONNECT.to_owned());
                SetupOutcome::ShowForm { errors }
            }
        }
    }
}

fn field_errors(params: &ConnectionParams) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    if params.host.is_empty() {
        errors.insert("host".to_owned(), ERROR_INVALID_HOST.to_owned());
    }
    if !(MIN_POLL_INTERVAL..=MAX_POLL_INTERVAL).contains(&params.poll_interval) {
        errors.insert("poll_interval".to_owned(), ERROR_OUT_OF_RANGE.to_owned());
    }
    errors
}
