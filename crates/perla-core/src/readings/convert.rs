// ── Raw value conversion ──
//
// The appliance reports most numbers as strings and dates as local
// wall-clock text. These helpers turn raw JSON values into typed values,
// returning `None` for anything absent, blank, or unparseable.

use chrono::{DateTime, NaiveDateTime, TimeZone};
use serde_json::Value;

/// Wall-clock format used by every timestamp field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Scale a raw numeric value and optionally round it.
///
/// Numbers and numeric-looking strings are accepted; `null`, missing and
/// empty strings yield `None`, as does anything that does not parse.
/// Rounding sends exact halves to the even neighbour (`66.5` -> `66`).
pub fn numeric_value(raw: Option<&Value>, factor: f64, decimals: Option<i32>) -> Option<f64> {
    let base = match raw? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if s.is_empty() => return None,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };

    let scaled = base * factor;
    let value = match decimals {
        Some(places) => {
            let scale = 10f64.powi(places);
            (scaled * scale).round_ties_even() / scale
        }
        None => scaled,
    };

    value.is_finite().then_some(value)
}

/// Interpret a raw `YYYY-MM-DD HH:MM:SS` string as wall-clock time in `tz`.
///
/// Blank values and the appliance's `-` placeholders yield `None`, as do
/// malformed text and local times skipped by a DST transition. A time
/// repeated by a DST fold resolves to the earlier instant.
pub fn parse_timestamp<Tz: TimeZone>(raw: Option<&Value>, tz: &Tz) -> Option<DateTime<Tz>> {
    let text = raw?.as_str()?;
    if text.is_empty() || text.starts_with('-') {
        return None;
    }

    let naive = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).ok()?;
    tz.from_local_datetime(&naive).earliest()
}

/// `true` when a raw flag equals 1, as a number or numeric string.
pub(crate) fn flag_is_one(raw: Option<&Value>) -> bool {
    match raw {
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok() == Some(1),
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

/// `true` when a raw value has non-whitespace content.
pub(crate) fn is_non_blank(raw: Option<&Value>) -> bool {
    match raw {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Number(n)) => n.as_i64() != Some(0),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, Utc};
    use serde_json::json;

    use super::*;

    #[test]
    fn scales_and_rounds_string_values() {
        assert_eq!(numeric_value(Some(&json!("1234")), 0.001, Some(3)), Some(1.234));
        assert_eq!(numeric_value(Some(&json!(" 42 ")), 1.0, None), Some(42.0));
        assert_eq!(numeric_value(Some(&json!(12.6)), 1.0, Some(0)), Some(13.0));
    }

    #[test]
    fn halves_round_to_even() {
        assert_eq!(numeric_value(Some(&json!("66.5")), 1.0, Some(0)), Some(66.0));
        assert_eq!(numeric_value(Some(&json!("12.5")), 1.0, Some(0)), Some(12.0));
        assert_eq!(numeric_value(Some(&json!(13.5)), 1.0, Some(0)), Some(14.0));
        assert_eq!(numeric_value(Some(&json!("-2.5")), 1.0, Some(0)), Some(-2.0));
    }

    #[test]
    fn blank_or_absent_values_are_none() {
        assert_eq!(numeric_value(None, 1.0, None), None);
        assert_eq!(numeric_value(Some(&json!("")), 1.0, None), None);
        assert_eq!(numeric_value(Some(&Value::Null), 1.0, None), None);
        assert_eq!(numeric_value(Some(&json!("n/a")), 1.0, None), None);
    }

    #[test]
    fn parses_wall_clock_in_given_zone() {
        let tz = FixedOffset::east_opt(3600).unwrap_or_else(|| unreachable!());
        let parsed = parse_timestamp(Some(&json!("2024-01-15 09:30:00")), &tz);

        let expected_naive = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap_or_else(|| unreachable!());
        assert_eq!(parsed.map(|t| t.naive_local()), Some(expected_naive));
        assert_eq!(parsed.map(|t| *t.offset()), Some(tz));
    }

    #[test]
    fn placeholders_and_garbage_are_none() {
        for raw in [json!("-"), json!("--"), json!(""), json!("15.01.2024"), json!(20240115)] {
            assert!(parse_timestamp(Some(&raw), &Utc).is_none(), "{raw}");
        }
        assert!(parse_timestamp(None, &Utc).is_none());
    }

    #[test]
    fn flags() {
        assert!(flag_is_one(Some(&json!("1"))));
        assert!(flag_is_one(Some(&json!(1))));
        assert!(!flag_is_one(Some(&json!("0"))));
        assert!(!flag_is_one(None));

        assert!(is_non_blank(Some(&json!("E12"))));
        assert!(!is_non_blank(Some(&json!("   "))));
        assert!(!is_non_blank(Some(&Value::Null)));
    }
}
