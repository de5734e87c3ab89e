//! Waypoint normalization.
//!
//! Turns raw upstream records into an ordered list of valid [`Waypoint`]s:
//!
//! 1. Timestamps are parsed; anything unparsable becomes `None`.
//! 2. Records with out-of-range or non-finite coordinates are dropped.
//! 3. If at least two records carry a timestamp the whole set is sorted by
//!    time, with untimed records placed after all timed ones in their original
//!    relative order. With fewer than two timestamps input order is kept.
//!
//! Nothing here fails. Dropped records and unparsable fields are logged at
//! `warn` level and the remaining data flows on.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Result;
use crate::{RawTimestamp, RawWaypoint, Waypoint};

/// Naive layouts accepted for textual timestamps, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    // EXIF DateTime / DateTimeOriginal
    "%Y:%m:%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Parse a raw timestamp into a UTC instant.
///
/// Accepts RFC 3339 / ISO 8601 (with or without offset), RFC 2822, the EXIF
/// `YYYY:MM:DD HH:MM:SS` layout, bare dates and Unix epoch milliseconds.
/// Values without an offset are taken as UTC. Returns `None` on failure.
///
/// ```rust
/// use photo_route::{parse_timestamp, RawTimestamp};
///
/// let ts = parse_timestamp(&RawTimestamp::Text("2023:07:14 09:30:00".into()));
/// assert_eq!(ts.unwrap().to_rfc3339(), "2023-07-14T09:30:00+00:00");
///
/// assert!(parse_timestamp(&RawTimestamp::Text("yesterday".into())).is_none());
/// ```
pub fn parse_timestamp(raw: &RawTimestamp) -> Option<DateTime<Utc>> {
    match raw {
        RawTimestamp::Instant(ts) => Some(*ts),
        RawTimestamp::UnixMillis(ms) => DateTime::from_timestamp_millis(*ms),
        RawTimestamp::Text(text) => parse_timestamp_text(text),
    }
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// =============================================================================
// Lenient deserialization
// =============================================================================

/// Numbers and numeric strings; anything else is unusable.
fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub(crate) fn missing_coordinate() -> f64 {
    f64::NAN
}

pub(crate) fn lenient_name<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Unusable coordinates become NaN so [`clean_waypoints`] drops the record.
pub(crate) fn lenient_coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value).unwrap_or_else(|| {
        warn!("[Normalize] unusable coordinate {}, record will be dropped", value);
        f64::NAN
    }))
}

pub(crate) fn lenient_altitude<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    let altitude = value_to_f64(&value);
    if altitude.is_none() {
        warn!("[Normalize] non-numeric altitude {}, treating as absent", value);
    }
    Ok(altitude)
}

pub(crate) fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<RawTimestamp>, D::Error> {
    Ok(raw_timestamp_from_value(Value::deserialize(deserializer)?))
}

fn raw_timestamp_from_value(value: Value) -> Option<RawTimestamp> {
    match value {
        Value::Null => None,
        Value::Number(n) => match n.as_i64() {
            Some(ms) => Some(RawTimestamp::UnixMillis(ms)),
            None => n
                .as_f64()
                .filter(|ms| ms.is_finite())
                .map(|ms| RawTimestamp::UnixMillis(ms.round() as i64)),
        },
        Value::String(s) => Some(match DateTime::parse_from_rfc3339(&s) {
            Ok(ts) => RawTimestamp::Instant(ts.with_timezone(&Utc)),
            Err(_) => RawTimestamp::Text(s),
        }),
        other => {
            warn!("[Normalize] unusable timestamp {}, treating as absent", other);
            None
        }
    }
}

/// Parse a JSON array of raw waypoint records.
///
/// Only a document that is not a JSON array fails. Entries that are not
/// records at all are logged and skipped; bad field values inside a record
/// degrade as described on [`RawWaypoint`].
///
/// ```rust
/// use photo_route::{normalize_waypoints, raw_waypoints_from_json};
///
/// let raw = raw_waypoints_from_json(r#"[
///     {"name": "a.jpg", "latitude": 1.0, "longitude": 1.0, "altitude": "n/a"},
///     42,
///     {"name": "b.jpg", "latitude": null, "longitude": 1.0}
/// ]"#).unwrap();
/// assert_eq!(raw.len(), 2);
/// assert_eq!(normalize_waypoints(&raw).len(), 1);
/// ```
pub fn raw_waypoints_from_json(json: &str) -> Result<Vec<RawWaypoint>> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    let total = values.len();

    let raw: Vec<RawWaypoint> = values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("[Normalize] skipping entry {}: {}", i, e);
                None
            }
        })
        .collect();

    debug!("[Normalize] read {} of {} JSON entries", raw.len(), total);
    Ok(raw)
}

/// Convert one raw record into a waypoint, parsing its timestamp.
///
/// No validation happens here; see [`clean_waypoints`].
pub fn to_waypoint(raw: &RawWaypoint) -> Waypoint {
    let timestamp = raw.timestamp.as_ref().and_then(|ts| {
        let parsed = parse_timestamp(ts);
        if parsed.is_none() {
            warn!("[Normalize] '{}': unparsable timestamp {:?}, treating as absent", raw.name, ts);
        }
        parsed
    });

    Waypoint {
        name: raw.name.clone(),
        latitude: raw.latitude,
        longitude: raw.longitude,
        altitude: raw.altitude,
        timestamp,
    }
}

/// Normalize raw records into valid, time-ordered waypoints.
///
/// The result may be empty or hold a single waypoint; route-level statistics
/// need at least two.
///
/// ```rust
/// use photo_route::{normalize_waypoints, RawWaypoint};
///
/// let raw = vec![
///     RawWaypoint::new("late", 1.0, 1.0).with_timestamp_text("2024-01-01T12:00:00Z"),
///     RawWaypoint::new("broken", 120.0, 1.0),
///     RawWaypoint::new("early", 1.0, 1.0).with_timestamp_text("2024-01-01T08:00:00Z"),
/// ];
/// let names: Vec<_> = normalize_waypoints(&raw).into_iter().map(|w| w.name).collect();
/// assert_eq!(names, vec!["early", "late"]);
/// ```
pub fn normalize_waypoints(raw: &[RawWaypoint]) -> Vec<Waypoint> {
    clean_waypoints(raw.iter().map(to_waypoint).collect())
}

/// Apply the validity filter and time ordering to already-built waypoints.
pub fn clean_waypoints(waypoints: Vec<Waypoint>) -> Vec<Waypoint> {
    let total = waypoints.len();

    let mut valid: Vec<Waypoint> = waypoints
        .into_iter()
        .filter_map(|mut wp| {
            if !wp.is_valid() {
                warn!(
                    "[Normalize] dropping '{}': invalid coordinates ({}, {})",
                    wp.name, wp.latitude, wp.longitude
                );
                return None;
            }
            if matches!(wp.altitude, Some(alt) if !alt.is_finite()) {
                warn!("[Normalize] '{}': non-finite altitude, treating as absent", wp.name);
                wp.altitude = None;
            }
            Some(wp)
        })
        .collect();

    let sorted = order_by_timestamp(&mut valid);

    debug!(
        "[Normalize] kept {} of {} waypoints ({})",
        valid.len(),
        total,
        if sorted { "time ordered" } else { "input order" }
    );
    valid
}

/// Sort waypoints by timestamp when at least two carry one.
///
/// Sorting is all-or-nothing: with fewer than two timestamps the slice is left
/// untouched. Otherwise untimed waypoints move behind the timed ones, keeping
/// their relative order. Returns whether a sort happened.
pub fn order_by_timestamp(waypoints: &mut [Waypoint]) -> bool {
    let timed = waypoints.iter().filter(|w| w.timestamp.is_some()).count();
    if timed < 2 {
        return false;
    }
    waypoints.sort_by_key(|w| (w.timestamp.is_none(), w.timestamp));
    true
}
