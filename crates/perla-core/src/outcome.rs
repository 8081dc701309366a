// ── Refresh outcomes ──
//
// What a single refresh cycle produced. Every caller that joined the
// cycle receives a clone of the same value.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use perla_api::FailureKind;

use crate::snapshot::Snapshot;

/// A failed fetch, collapsed to a kind and a diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{kind} failure: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
    /// HTTP status, when the appliance answered at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl FetchError {
    /// A failure that never reached an HTTP response.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }
}

impl From<&perla_api::Error> for FetchError {
    fn from(err: &perla_api::Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            status: err.status(),
        }
    }
}

impl From<perla_api::Error> for FetchError {
    fn from(err: perla_api::Error) -> Self {
        Self::from(&err)
    }
}

/// Result of one completed refresh cycle.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Success(Arc<Snapshot>),
    Failure(FetchError),
}

impl RefreshOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        match self {
            Self::Success(snapshot) => Some(snapshot),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(err) => Some(err),
        }
    }

    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<Arc<Snapshot>, FetchError> {
        match self {
            Self::Success(snapshot) => Ok(snapshot),
            Self::Failure(err) => Err(err),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn fetch_error_keeps_kind_and_message() {
        let err = FetchError::from(perla_api::Error::Timeout {
            timeout: Duration::from_secs(10),
        });
        assert_eq!(err.kind, FailureKind::Timeout);
        assert_eq!(err.message, "Request timed out after 10s");
        assert_eq!(err.to_string(), "timeout failure: Request timed out after 10s");
        assert_eq!(err.status, None);
    }

    #[test]
    fn fetch_error_keeps_http_status() {
        let err = FetchError::from(perla_api::Error::Status {
            status: 401,
            body: "Unauthorized".into(),
        });
        assert_eq!(err.kind, FailureKind::Protocol);
        assert_eq!(err.status, Some(401));
    }

    #[test]
    fn outcome_accessors() {
        let ok = RefreshOutcome::Success(Arc::new(Snapshot::default()));
        assert!(ok.is_success());
        assert!(ok.snapshot().is_some());
        assert!(ok.error().is_none());

        let failed = RefreshOutcome::Failure(FetchError::new(FailureKind::Protocol, "HTTP 500: "));
        assert!(!failed.is_success());
        assert!(failed.snapshot().is_none());
        assert_eq!(failed.into_result().unwrap_err().kind, FailureKind::Protocol);
    }
}
