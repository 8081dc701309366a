//! Shared helpers for command handlers.

use std::sync::Arc;

use perla_core::{Coordinator, Reading, ReadingValue, Snapshot};

use crate::error::CliError;

/// Run one refresh cycle and return its snapshot, or the translated failure.
pub async fn refresh_once(coordinator: &Coordinator) -> Result<Arc<Snapshot>, CliError> {
    coordinator
        .request_refresh()
        .await
        .into_result()
        .map_err(|err| CliError::from_fetch(&err, coordinator.status_url().as_str()))
}

/// Value for `key=value` output: no unit, empty when unknown.
pub fn plain_value(reading: &Reading) -> String {
    match &reading.value {
        ReadingValue::Numeric(Some(v)) => v.to_string(),
        ReadingValue::Timestamp(Some(t)) => t.to_rfc3339(),
        ReadingValue::Problem(on) => on.to_string(),
        ReadingValue::Numeric(None) | ReadingValue::Timestamp(None) => String::new(),
    }
}

/// Whether the appliance reported any of the fields behind `reading`.
pub fn is_reported(reading: &Reading, snapshot: &Snapshot) -> bool {
    match reading.value {
        ReadingValue::Problem(_) => true,
        _ => snapshot.contains(reading.key),
    }
}
