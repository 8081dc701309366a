// ── Reading descriptors ──
//
// Static table of every field the CLI knows how to present, keyed by the
// raw field name the appliance uses. Display names are looked up through
// `translation_key`; nothing here carries English text.

use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};

/// Kind of quantity a reading represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceClass {
    Water,
    Timestamp,
    Problem,
}

/// How successive values of a numeric reading relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateClass {
    Measurement,
    Total,
    TotalIncreasing,
}

/// A scaled numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericDescriptor {
    pub key: &'static str,
    pub translation_key: &'static str,
    pub unit: Option<&'static str>,
    pub device_class: Option<DeviceClass>,
    pub state_class: StateClass,
    /// Multiplied into the raw value before rounding.
    pub factor: f64,
    pub decimals: Option<i32>,
}

/// A `YYYY-MM-DD HH:MM:SS` wall-clock field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimestampDescriptor {
    pub key: &'static str,
    pub translation_key: &'static str,
}

/// Rule deciding whether a problem indicator is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemCondition {
    /// `ShowError` equals 1, or `ActiveErrorIDs` is non-blank.
    Error,
    /// `OutOfService` equals 1.
    OutOfService,
}

/// A binary "problem" indicator derived from one or more raw fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProblemDescriptor {
    pub key: &'static str,
    pub translation_key: &'static str,
    pub condition: ProblemCondition,
    /// Raw fields exposed verbatim next to the computed state.
    pub attributes: &'static [&'static str],
}

const fn water(
    key: &'static str,
    translation_key: &'static str,
    state_class: StateClass,
) -> NumericDescriptor {
    NumericDescriptor {
        key,
        translation_key,
        unit: Some("m³"),
        device_class: Some(DeviceClass::Water),
        state_class,
        factor: 0.001,
        decimals: Some(3),
    }
}

const fn plain(
    key: &'static str,
    translation_key: &'static str,
    unit: Option<&'static str>,
    state_class: StateClass,
    decimals: Option<i32>,
) -> NumericDescriptor {
    NumericDescriptor {
        key,
        translation_key,
        unit,
        device_class: None,
        state_class,
        factor: 1.0,
        decimals,
    }
}

pub const NUMERIC_SENSORS: [NumericDescriptor; 17] = [
    water("WaterTreatedCurrentDay_l", "water_treated_today", StateClass::Total),
    water("WaterTreatedCurrentMonth_l", "water_treated_month", StateClass::Total),
    water("WaterTreatedCurrentYear_l", "water_treated_year", StateClass::Total),
    water("WaterSinceSetup_l", "water_since_setup", StateClass::TotalIncreasing),
    water(
        "BlendedWaterSinceSetup_l",
        "blended_water_since_setup",
        StateClass::TotalIncreasing,
    ),
    plain("CurrentFlowrate_l_h", "current_flow", Some("L/h"), StateClass::Measurement, Some(0)),
    plain("HardnessIN_dH", "hardness_in", Some("°dH"), StateClass::Measurement, None),
    plain("HardnessIN_CaCO3", "hardness_in_caco3", Some("mg/L"), StateClass::Measurement, None),
    plain("HardnessOUT_dH", "hardness_out", Some("°dH"), StateClass::Measurement, None),
    plain("HardnessOUT_CaCO3", "hardness_out_caco3", Some("mg/L"), StateClass::Measurement, None),
    plain("RegenerationCountSinceSetup", "regens_total", None, StateClass::TotalIncreasing, None),
    plain("RegenerationCounterColumn1", "regens_col1", None, StateClass::TotalIncreasing, None),
    plain("RegenerationCounterColumn2", "regens_col2", None, StateClass::TotalIncreasing, None),
    plain(
        "RegenerativSinceSetup_g",
        "salt_used_since_setup",
        Some("g"),
        StateClass::TotalIncreasing,
        None,
    ),
    plain("RegenerativLevel", "salt_level", Some("%"), StateClass::Measurement, Some(0)),
    plain(
        "RegenerativRemainingDays",
        "salt_remaining_days",
        Some("days"),
        StateClass::Measurement,
        Some(0),
    ),
    plain("DosingSinceSetup_ml", "dosing_since_setup", Some("mL"), StateClass::TotalIncreasing, None),
];

pub const TIMESTAMP_SENSORS: [TimestampDescriptor; 4] = [
    TimestampDescriptor {
        key: "LastRegenerationColumn1",
        translation_key: "last_regen_col1",
    },
    TimestampDescriptor {
        key: "LastRegenerationColumn2",
        translation_key: "last_regen_col2",
    },
    TimestampDescriptor {
        key: "LastServiceCustomer",
        translation_key: "last_service_customer",
    },
    // Sic: the firmware misspells "Technician".
    TimestampDescriptor {
        key: "LastServiceTechnican",
        translation_key: "last_service_technician",
    },
];

pub const PROBLEM_SENSORS: [ProblemDescriptor; 2] = [
    ProblemDescriptor {
        key: "error",
        translation_key: "error",
        condition: ProblemCondition::Error,
        attributes: &["ShowError", "ActiveErrorIDs"],
    },
    ProblemDescriptor {
        key: "out_of_service",
        translation_key: "out_of_service",
        condition: ProblemCondition::OutOfService,
        attributes: &["OutOfService"],
    },
];

/// Look up a numeric descriptor by raw field name.
pub fn numeric_descriptor(key: &str) -> Option<&'static NumericDescriptor> {
    NUMERIC_SENSORS.iter().find(|d| d.key == key)
}
