// ── Typed readings ──
//
// Presentation layer over a raw snapshot. The coordinator never applies
// these; callers pick a snapshot and a time zone and get a typed list.

mod convert;
mod descriptors;

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::snapshot::Snapshot;
use crate::translations;

pub use convert::{TIMESTAMP_FORMAT, numeric_value, parse_timestamp};
pub use descriptors::{
    DeviceClass, NUMERIC_SENSORS, NumericDescriptor, PROBLEM_SENSORS, ProblemCondition,
    ProblemDescriptor, StateClass, TIMESTAMP_SENSORS, TimestampDescriptor, numeric_descriptor,
};

/// Static identity of the appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub manufacturer: &'static str,
    pub model: &'static str,
    pub name: &'static str,
}

pub const DEVICE_INFO: DeviceInfo = DeviceInfo {
    manufacturer: "BWT",
    model: "Perla",
    name: "BWT Perla",
};

/// Typed value of one reading. `None` inside a variant means the field
/// was absent or unusable in this snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ReadingValue {
    Numeric(Option<f64>),
    Timestamp(Option<DateTime<FixedOffset>>),
    Problem(bool),
}

/// One presentable reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// `<entry_id>_<key>`.
    pub unique_id: String,
    pub key: &'static str,
    pub translation_key: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    pub value: ReadingValue,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl Reading {
    /// Value rendered for display, with unit. Unknown values render as `-`.
    pub fn display_value(&self) -> String {
        match &self.value {
            ReadingValue::Numeric(Some(v)) => match self.unit {
                Some(unit) => format!("{v} {unit}"),
                None => v.to_string(),
            },
            ReadingValue::Timestamp(Some(t)) => t.format(TIMESTAMP_FORMAT).to_string(),
            ReadingValue::Problem(on) => (if *on { "on" } else { "off" }).to_owned(),
            ReadingValue::Numeric(None) | ReadingValue::Timestamp(None) => "-".to_owned(),
        }
    }
}

/// Evaluate a problem indicator against a snapshot.
pub fn problem_state(condition: ProblemCondition, snapshot: &Snapshot) -> bool {
    match condition {
        ProblemCondition::Error => {
            convert::flag_is_one(snapshot.get("ShowError"))
                || convert::is_non_blank(snapshot.get("ActiveErrorIDs"))
        }
        ProblemCondition::OutOfService => convert::flag_is_one(snapshot.get("OutOfService")),
    }
}

/// Produce every known reading for `snapshot`.
///
/// With no snapshot every value is unknown and problem indicators are off.
/// Timestamps are interpreted as wall-clock time in `tz`.
pub fn read_all<Tz: TimeZone>(
    entry_id: &str,
    snapshot: Option<&Snapshot>,
    tz: &Tz,
) -> Vec<Reading> {
    let empty = Snapshot::default();
    let snapshot = snapshot.unwrap_or(&empty);
    let mut readings =
        Vec::with_capacity(NUMERIC_SENSORS.len() + TIMESTAMP_SENSORS.len() + PROBLEM_SENSORS.len());

    for d in &NUMERIC_SENSORS {
        readings.push(Reading {
            unique_id: format!("{entry_id}_{}", d.key),
            key: d.key,
            translation_key: d.translation_key,
            name: translations::sensor_name(d.translation_key),
            unit: d.unit,
            device_class: d.device_class,
            state_class: Some(d.state_class),
            value: ReadingValue::Numeric(numeric_value(snapshot.get(d.key), d.factor, d.decimals)),
            attributes: Map::new(),
        });
    }

    for d in &TIMESTAMP_SENSORS {
        let value = parse_timestamp(snapshot.get(d.key), tz).map(|t| t.fixed_offset());
        readings.push(Reading {
            unique_id: format!("{entry_id}_{}", d.key),
            key: d.key,
            translation_key: d.translation_key,
            name: translations::sensor_name(d.translation_key),
            unit: None,
            device_class: Some(DeviceClass::Timestamp),
            state_class: None,
            value: ReadingValue::Timestamp(value),
            attributes: Map::new(),
        });
    }

    for d in &PROBLEM_SENSORS {
        let attributes = d
            .attributes
            .iter()
            .map(|field| {
                let raw = snapshot.get(field).cloned().unwrap_or(Value::Null);
                ((*field).to_owned(), raw)
            })
            .collect();
        readings.push(Reading {
            unique_id: format!("{entry_id}_{}", d.key),
            key: d.key,
            translation_key: d.translation_key,
            name: translations::binary_sensor_name(d.translation_key),
            unit: None,
            device_class: Some(DeviceClass::Problem),
            state_class: None,
            value: ReadingValue::Problem(problem_state(d.condition, snapshot)),
            attributes,
        });
    }

    readings
}
