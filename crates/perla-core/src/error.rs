// ── Core error types ──
//
// User-facing errors from perla-core. Consumers never see reqwest or
// serde_json errors directly: the `From<perla_api::Error>` impl folds
// transport-layer failures into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to appliance at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Appliance did not answer in time: {message}")]
    Timeout { message: String },

    // ── Appliance responses ──────────────────────────────────────────
    #[error("Appliance rejected the request: {message}")]
    Api {
        message: String,
        /// HTTP status code (if the appliance answered).
        status: Option<u16>,
    },

    #[error("Unexpected response from appliance: {message}")]
    Decode { message: String },

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<perla_api::Error> for CoreError {
    fn from(err: perla_api::Error) -> Self {
        match err {
            perla_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout {
                        message: e.to_string(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            perla_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            perla_api::Error::Client(message) => CoreError::Config { message },
            perla_api::Error::Timeout { timeout } => CoreError::Timeout {
                message: format!("no response after {timeout:?}"),
            },
            perla_api::Error::Status { status, body } => CoreError::Api {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {body}")
                },
                status: Some(status),
            },
            perla_api::Error::Deserialization { message, body: _ } => CoreError::Decode { message },
            perla_api::Error::UnexpectedPayload { found } => CoreError::Decode {
                message: format!("expected a JSON object, got {found}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_keeps_code() {
        let err = CoreError::from(perla_api::Error::Status {
            status: 401,
            body: String::new(),
        });
        match err {
            CoreError::Api { message, status } => {
                assert_eq!(status, Some(401));
                assert_eq!(message, "HTTP 401");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn non_object_payload_is_decode_error() {
        let err = CoreError::from(perla_api::Error::UnexpectedPayload { found: "array" });
        assert_eq!(
            err.to_string(),
            "Unexpected response from appliance: expected a JSON object, got array"
        );
    }
}
