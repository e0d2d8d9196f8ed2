//! Lenient timestamp parsing
//!
//! The backend is not consistent about timestamp encoding, so message
//! timestamps accept several shapes and degrade to `None` instead of
//! failing the whole response.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Naive layouts tried after RFC 3339, all interpreted as UTC
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Deserialize an optional timestamp, mapping anything unrecognised to `None`
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_value))
}

/// Parse a JSON value into a UTC timestamp
///
/// Accepts RFC 3339 strings, naive ISO-8601 strings, epoch milliseconds,
/// and `[year, month, day, hour, minute, second, nanos]` arrays.
pub fn parse_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_str(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Value::Array(parts) => parse_parts(parts),
        _ => None,
    }
}

fn parse_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_parts(parts: &[Value]) -> Option<DateTime<Utc>> {
    let nums = parts
        .iter()
        .map(Value::as_i64)
        .collect::<Option<Vec<i64>>>()?;
    let get = |i: usize| nums.get(i).copied().unwrap_or(0);
    if nums.len() < 3 {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(
        i32::try_from(get(0)).ok()?,
        u32::try_from(get(1)).ok()?,
        u32::try_from(get(2)).ok()?,
    )?;
    let time = date.and_hms_nano_opt(
        u32::try_from(get(3)).ok()?,
        u32::try_from(get(4)).ok()?,
        u32::try_from(get(5)).ok()?,
        u32::try_from(get(6)).ok()?,
    )?;
    Some(time.and_utc())
}
