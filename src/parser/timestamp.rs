//! Timestamp normalization for both wire formats.
//!
//! - Observation exports carry ISO-8601 strings. `Z` or a numeric offset gives an
//!   aware timestamp; no offset leaves it naive.
//! - OTLP exports carry nanoseconds since the Unix epoch, as a JSON integer
//!   or a numeric string. These are always UTC.

use crate::model::Timestamp;
use crate::utils::error::ParseError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

const NANOS_PER_SEC: i128 = 1_000_000_000;

// Tried after RFC 3339, which covers the common `Z` / `+hh:mm` forms
const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp string
///
/// **Public** - used by the observation parser
///
/// # Errors
/// * `ParseError::InvalidTimestamp` - the string matches no accepted layout
pub fn parse_iso_timestamp(value: &str) -> Result<Timestamp, ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ParseError::timestamp("\"\"", "empty string"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Timestamp::Aware(dt));
    }

    if let Some(utc) = trimmed.strip_suffix(['Z', 'z']) {
        // RFC 3339 rejects some layouts (no seconds) that still carry a Z
        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(utc, fmt) {
                return Ok(Timestamp::from_utc(naive.and_utc()));
            }
        }
    }

    for fmt in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return Ok(Timestamp::Aware(dt));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(Timestamp::Naive(naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(Timestamp::Naive(date.and_time(NaiveTime::MIN)));
    }

    Err(ParseError::timestamp(
        format!("{:?}", value),
        "not an ISO-8601 timestamp",
    ))
}

/// Parse nanoseconds since the Unix epoch from a JSON integer or numeric string
///
/// **Public** - used by the OTLP span parser
///
/// # Errors
/// * `ParseError::InvalidTimestamp` - not numeric, or outside the representable range
pub fn parse_unix_nanos(value: &Value) -> Result<Timestamp, ParseError> {
    let nanos = match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                i128::from(u)
            } else if let Some(i) = n.as_i64() {
                i128::from(i)
            } else {
                float_nanos(n.as_f64(), value)?
            }
        }
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i128>() {
                Ok(n) => n,
                Err(_) => float_nanos(s.parse::<f64>().ok(), value)?,
            }
        }
        other => {
            return Err(ParseError::timestamp(
                other,
                "expected integer or numeric string nanoseconds",
            ))
        }
    };

    nanos_to_timestamp(nanos).ok_or_else(|| ParseError::timestamp(value, "out of range"))
}

fn float_nanos(parsed: Option<f64>, raw: &Value) -> Result<i128, ParseError> {
    match parsed {
        Some(f) if f.is_finite() => Ok(f.round() as i128),
        _ => Err(ParseError::timestamp(raw, "not a number")),
    }
}

/// Exact conversion; no float division involved
fn nanos_to_timestamp(nanos: i128) -> Option<Timestamp> {
    let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SEC)).ok()?;
    let subsec = u32::try_from(nanos.rem_euclid(NANOS_PER_SEC)).ok()?;
    DateTime::<Utc>::from_timestamp(secs, subsec).map(Timestamp::from_utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use serde_json::json;

    #[test]
    fn test_nanos_integer() {
        let ts = parse_unix_nanos(&json!(1609459200000000000u64)).unwrap();
        assert_eq!(ts.instant(), Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
        assert!(!ts.is_naive());
    }

    #[test]
    fn test_nanos_string_keeps_precision() {
        let ts = parse_unix_nanos(&json!("1609459200123456789")).unwrap();
        assert_eq!(ts.instant().nanosecond(), 123_456_789);
    }

    #[test]
    fn test_nanos_rejects_garbage() {
        assert!(parse_unix_nanos(&json!("soon")).is_err());
        assert!(parse_unix_nanos(&json!(true)).is_err());
        assert!(parse_unix_nanos(&json!(null)).is_err());
    }

    #[test]
    fn test_iso_with_z_is_utc() {
        let ts = parse_iso_timestamp("2025-01-15T10:00:00Z").unwrap();
        assert!(!ts.is_naive());
        assert_eq!(ts.instant(), Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_iso_with_fraction_and_z() {
        let ts = parse_iso_timestamp("2024-03-01T12:30:45.250Z").unwrap();
        assert_eq!(ts.instant().nanosecond(), 250_000_000);
    }

    #[test]
    fn test_iso_with_offset() {
        let ts = parse_iso_timestamp("2025-01-15T12:00:00+02:00").unwrap();
        assert_eq!(ts.instant(), Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_iso_without_offset_stays_naive() {
        let ts = parse_iso_timestamp("2025-01-15T10:00:00").unwrap();
        assert!(ts.is_naive());
        assert_eq!(ts.to_iso(), "2025-01-15T10:00:00");

        let spaced = parse_iso_timestamp("2025-01-15 10:00:00.5").unwrap();
        assert!(spaced.is_naive());
    }

    #[test]
    fn test_iso_date_only() {
        let ts = parse_iso_timestamp("2024-02-29").unwrap();
        assert!(ts.is_naive());
        assert_eq!(ts.to_iso(), "2024-02-29T00:00:00");
    }

    #[test]
    fn test_iso_malformed() {
        assert!(parse_iso_timestamp("").is_err());
        assert!(parse_iso_timestamp("yesterday").is_err());
        assert!(parse_iso_timestamp("2024-13-45T00:00:00Z").is_err());
    }
}
