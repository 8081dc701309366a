//! Display strings, keyed the same way as the reading descriptors.
//!
//! The English table is embedded at compile time. Lookups fall back to the
//! key itself so a missing string degrades to an identifier, never a panic.

use std::sync::LazyLock;

use serde_json::Value;

static EN: LazyLock<Value> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../translations/en.json")).unwrap_or(Value::Null)
});

fn lookup<'a>(pointer: &str, fallback: &'a str) -> &'a str {
    EN.pointer(pointer).and_then(Value::as_str).unwrap_or(fallback)
}

/// Name of a sensor reading (numeric or timestamp).
pub fn sensor_name(translation_key: &str) -> &str {
    lookup(&format!("/entity/sensor/{translation_key}/name"), translation_key)
}

/// Name of a binary problem indicator.
pub fn binary_sensor_name(translation_key: &str) -> &str {
    lookup(
        &format!("/entity/binary_sensor/{translation_key}/name"),
        translation_key,
    )
}

/// Human message for a setup form error such as `cannot_connect`.
pub fn config_error(key: &str) -> &str {
    lookup(&format!("/config/error/{key}"), key)
}

/// Human message for a setup abort reason such as `already_configured`.
pub fn config_abort(reason: &str) -> &str {
    lookup(&format!("/config/abort/{reason}"), reason)
}

/// Label for a setup form field.
pub fn field_label(field: &str) -> &str {
    lookup(&format!("/config/step/user/data/{field}"), field)
}
