//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use perla_config::ConfigError;
use perla_core::{CoreError, FailureKind, FetchError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Appliance ────────────────────────────────────────────────────
    #[error("Could not reach the appliance at {url}")]
    #[diagnostic(
        code(perla::unreachable),
        help(
            "Check that the appliance is powered and on the same network.\n\
             Reason: {reason}"
        )
    )]
    Unreachable { url: String, reason: String },

    #[error("Appliance did not answer in time: {detail}")]
    #[diagnostic(
        code(perla::timeout),
        help("Increase the timeout with --timeout or check the appliance's network link.")
    )]
    Timeout { detail: String },

    #[error("Appliance rejected the request: {message}")]
    #[diagnostic(
        code(perla::auth_failed),
        help("Check the username and password for this entry. Run: perla setup")
    )]
    AuthFailed { message: String },

    #[error("Unexpected response from the appliance: {message}")]
    #[diagnostic(code(perla::protocol))]
    Protocol { message: String },

    // ── Setup ────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(perla::setup), help("{help}"))]
    SetupFailed { message: String, help: String },

    #[error("{message}")]
    #[diagnostic(
        code(perla::already_configured),
        help("Remove the existing entry with: perla config remove <name>")
    )]
    AlreadyConfigured { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Entry '{name}' not found in configuration")]
    #[diagnostic(
        code(perla::entry_not_found),
        help(
            "Available entries: {available}\n\
             Create one with: perla setup"
        )
    )]
    EntryNotFound { name: String, available: String },

    #[error("No appliance configured")]
    #[diagnostic(
        code(perla::no_config),
        help(
            "Create an entry with: perla setup\n\
             Or pass --host. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(perla::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(perla::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    #[diagnostic(code(perla::json))]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unreachable { .. } | Self::Protocol { .. } | Self::SetupFailed { .. } => {
                exit_code::CONNECTION
            }
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::EntryNotFound { .. } | Self::NoConfig { .. } => exit_code::NOT_FOUND,
            Self::AlreadyConfigured { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Translate a failed refresh cycle for `url`.
    pub fn from_fetch(err: &FetchError, url: &str) -> Self {
        match err.kind {
            FailureKind::Timeout => Self::Timeout {
                detail: format!("{url}: {}", err.message),
            },
            FailureKind::Protocol if err.status == Some(401) => Self::AuthFailed {
                message: err.message.clone(),
            },
            FailureKind::Protocol | FailureKind::Decode => Self::Protocol {
                message: err.message.clone(),
            },
            FailureKind::Connection => Self::Unreachable {
                url: url.to_owned(),
                reason: err.message.clone(),
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::Unreachable { url, reason },
            CoreError::Timeout { message } => Self::Timeout { detail: message },
            CoreError::Api {
                message,
                status: Some(401 | 403),
            } => Self::AuthFailed { message },
            CoreError::Api { message, .. } | CoreError::Decode { message } => {
                Self::Protocol { message }
            }
            CoreError::Validation { field, reason } => Self::Validation { field, reason },
            CoreError::Config { message } => Self::Validation {
                field: "configuration".into(),
                reason: message,
            },
        }
    }
}
