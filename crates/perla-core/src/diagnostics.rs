//! Redacted diagnostics export.
//!
//! Bundles the connection settings and the latest snapshot into one
//! serializable report that is safe to paste into a bug report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ConnectionParams;
use crate::store::CoordinatorState;

/// Snapshot fields that identify the appliance or its owner.
pub const TO_REDACT: [&str; 2] = ["Serial", "ActiveErrorIDs"];

/// Replacement for every redacted value.
pub const REDACTED: &str = "**REDACTED**";

#[derive(Debug, Clone, Serialize)]
pub struct EntryDiagnostics {
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: &'static str,
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    pub entry: EntryDiagnostics,
    pub available: bool,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
    pub cycles: u64,
    /// Latest snapshot with sensitive fields replaced.
    pub data: Option<Value>,
}

/// Build the report for one appliance.
pub fn diagnostics(params: &ConnectionParams, state: &CoordinatorState) -> DiagnosticsReport {
    let entry = EntryDiagnostics {
        host: params.host.clone(),
        port: params.port,
        username: params.credentials.as_ref().map(|_| REDACTED.to_owned()),
        password: REDACTED,
        poll_interval_secs: params.poll_interval.as_secs(),
        timeout_secs: params.timeout.as_secs(),
    };

    DiagnosticsReport {
        entry,
        available: state.available,
        last_error: state.last_error.as_ref().map(ToString::to_string),
        last_success: state.last_success,
        cycles: state.cycles,
        data: state
            .snapshot
            .as_ref()
            .map(|s| redact(&Value::Object(s.fields().clone()), &TO_REDACT)),
    }
}

/// Replace the value of every `keys` entry at any depth.
pub fn redact(value: &Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if keys.contains(&k.as_str()) {
                        Value::String(REDACTED.to_owned())
                    } else {
                        redact(v, keys)
                    };
                    (k.clone(), v)
                })
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| redact(v, keys)).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::snapshot::Snapshot;

    #[test]
    fn redacts_at_any_depth() {
        let raw = json!({
            "Serial": "123456",
            "nested": [{"ActiveErrorIDs": "E1"}],
            "OutOfService": "0",
        });
        assert_eq!(
            redact(&raw, &TO_REDACT),
            json!({
                "Serial": REDACTED,
                "nested": [{"ActiveErrorIDs": REDACTED}],
                "OutOfService": "0",
            })
        );
    }

    #[test]
    fn report_never_leaks_credentials() {
        let params = ConnectionParams::new("10.0.0.9")
            .with_port(8080)
            .with_credentials("admin", "hunter2".to_string().into());
        let Value::Object(fields) = json!({"Serial": "S-1", "RegenerativLevel": "80"}) else {
            unreachable!()
        };
        let state = CoordinatorState {
            snapshot: Some(Arc::new(Snapshot::new(fields))),
            available: true,
            cycles: 1,
            ..CoordinatorState::default()
        };

        let report = diagnostics(&params, &state);
        let text = serde_json::to_string(&report).unwrap_or_default();

        assert!(!text.contains("hunter2"));
        assert!(!text.contains("admin"));
        assert!(!text.contains("S-1"));
        assert!(text.contains("\"RegenerativLevel\":\"80\""));
        assert_eq!(report.entry.host, "10.0.0.9");
    }

    #[test]
    fn password_is_redacted_even_without_credentials() {
        let report = diagnostics(&ConnectionParams::new("perla"), &CoordinatorState::default());
        assert_eq!(report.entry.password, REDACTED);
        assert!(report.entry.username.is_none());
        assert!(report.data.is_none());
    }
}
