//! Dynamic record helpers
//!
//! RIDB returns wide, sparse objects whose shape varies between facilities.
//! Records are kept as JSON objects instead of fixed structs; these helpers
//! cover the handful of fields the pipeline interprets.

use serde_json::{Map, Value};

/// A single upstream record (facility, campsite, address, ...)
pub type Record = Map<String, Value>;

/// Primary key of a facility record
pub const FACILITY_ID: &str = "FacilityID";

/// Primary key of a campsite record
pub const CAMPSITE_ID: &str = "CampsiteID";

/// Return the identifier stored under `key` if it is usable.
///
/// Missing keys, `null` and empty strings are not identifiers.
pub fn valid_id<'a>(record: &'a Record, key: &str) -> Option<&'a Value> {
    match record.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        other => Some(other),
    }
}

/// Render an identifier as plain text, e.g. for a URL path segment.
///
/// Strings are returned without quotes; numbers use their JSON form.
/// Nested values are never identifiers.
pub fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// True for objects and arrays
pub fn is_nested(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// Iterate the object elements of the array stored under `key`.
///
/// Absent keys, `null`, non-array values and non-object elements are skipped.
pub fn child_records<'a>(record: &'a Record, key: &str) -> impl Iterator<Item = &'a Record> {
    record
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

/// Read a numeric field, accepting numeric strings
pub fn number_field(record: &Record, key: &str) -> Option<f64> {
    match record.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
