use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Top-level error type for the `perla-api` crate.
///
/// Every failure mode of a single status fetch lands here. Callers that
/// only care whether the appliance answered can ignore the variant and
/// use [`Error::kind`] or the `Display` message.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction failed (bad host or port).
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The HTTP client itself could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    // ── Protocol ────────────────────────────────────────────────────
    /// The appliance answered with something other than `200 OK`.
    /// `body` holds at most the first 200 characters of the response.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// The body was not valid JSON, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Valid JSON, but not a flat object.
    #[error("Unexpected payload: expected a JSON object, got {found}")]
    UnexpectedPayload { found: &'static str },
}

/// Coarse failure taxonomy for a status fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Unreachable, refused, DNS failure.
    Connection,
    /// Timeout exceeded.
    Timeout,
    /// Non-200 status.
    Protocol,
    /// Malformed or non-object body.
    Decode,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::Protocol => "protocol",
            Self::Decode => "decode",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Classify this error into the four-way [`FailureKind`] taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(e) => {
                if e.is_timeout() {
                    FailureKind::Timeout
                } else if e.is_status() {
                    FailureKind::Protocol
                } else if e.is_decode() {
                    FailureKind::Decode
                } else {
                    FailureKind::Connection
                }
            }
            Self::InvalidUrl(_) | Self::Client(_) => FailureKind::Connection,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Status { .. } => FailureKind::Protocol,
            Self::Deserialization { .. } | Self::UnexpectedPayload { .. } => FailureKind::Decode,
        }
    }

    /// Returns `true` if this is a transient error that the next poll
    /// cycle may well not hit again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status code, if the appliance answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_are_protocol_failures() {
        let err = Error::Status {
            status: 401,
            body: "Unauthorized".into(),
        };
        assert_eq!(err.kind(), FailureKind::Protocol);
        assert_eq!(err.status(), Some(401));
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "HTTP 401: Unauthorized");
    }

    #[test]
    fn payload_errors_are_decode_failures() {
        let err = Error::UnexpectedPayload { found: "array" };
        assert_eq!(err.kind(), FailureKind::Decode);

        let err = Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        };
        assert_eq!(err.kind(), FailureKind::Decode);
    }

    #[test]
    fn timeout_is_transient() {
        let err = Error::Timeout {
            timeout: Duration::from_secs(10),
        };
        assert_eq!(err.kind(), FailureKind::Timeout);
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "Request timed out after 10s");
    }

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Status {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_transient());
    }
}
