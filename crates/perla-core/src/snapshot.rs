// ── Appliance snapshot ──
//
// One decoded status document, frozen. Values are kept exactly as the
// appliance sent them: strings stay strings, numbers stay numbers.

use serde::Serialize;
use serde_json::Value;

use perla_api::StatusPayload;

/// The most recent successfully decoded status document.
///
/// Immutable once built; the coordinator shares it as `Arc<Snapshot>`
/// and swaps in a whole new one on the next successful cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    fields: StatusPayload,
}

impl Snapshot {
    pub fn new(fields: StatusPayload) -> Self {
        Self { fields }
    }

    /// Raw value of a field, exactly as received.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Raw value of a field if it is a JSON string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// All fields, keyed by name.
    pub fn fields(&self) -> &StatusPayload {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<StatusPayload> for Snapshot {
    fn from(fields: StatusPayload) -> Self {
        Self::new(fields)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> StatusPayload {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test payloads are objects"),
        }
    }

    #[test]
    fn raw_values_round_trip() {
        let snap = Snapshot::from(payload(json!({
            "OutOfService": "0",
            "RegenerativLevel": 87,
            "CurrentFlowrate_l_h": 12.5,
            "ActiveErrorIDs": null
        })));

        assert_eq!(snap.get("OutOfService"), Some(&json!("0")));
        assert_eq!(snap.get("RegenerativLevel"), Some(&json!(87)));
        assert_eq!(snap.get("CurrentFlowrate_l_h"), Some(&json!(12.5)));
        assert_eq!(snap.get("ActiveErrorIDs"), Some(&Value::Null));
        assert_eq!(snap.get_str("OutOfService"), Some("0"));
        assert_eq!(snap.get_str("RegenerativLevel"), None);
        assert!(snap.get("Missing").is_none());
    }

    #[test]
    fn serializes_as_flat_object() {
        let snap = Snapshot::from(payload(json!({"OutOfService": "0"})));
        assert_eq!(serde_json::to_value(&snap).unwrap(), json!({"OutOfService": "0"}));
    }
}
