//! Facility field interpretation

use lord_common::record::number_field;
use lord_common::Record;
use serde_json::Value;

pub const LATITUDE: &str = "FacilityLatitude";
pub const LONGITUDE: &str = "FacilityLongitude";
pub const ADA_ACCESS: &str = "FacilityAdaAccess";
pub const GEOJSON: &str = "GEOJSON";

/// Marker inside `FacilityAdaAccess` meaning accessible
const ADA_MARKER: char = 'Y';

/// True when both coordinates are present and not the `(0, 0)` sentinel
pub fn has_known_location(facility: &Record) -> bool {
    match (
        number_field(facility, LATITUDE),
        number_field(facility, LONGITUDE),
    ) {
        (Some(lat), Some(lon)) => !(lat == 0.0 && lon == 0.0),
        _ => false,
    }
}

pub fn is_ada_accessible(facility: &Record) -> bool {
    facility
        .get(ADA_ACCESS)
        .and_then(Value::as_str)
        .is_some_and(|code| code.contains(ADA_MARKER))
}

/// Re-encode a geo-shape payload as a compact JSON string cell.
///
/// Objects are serialized as-is. Strings must decode strictly to an object;
/// anything else, including a decode failure, becomes null.
pub fn encode_geojson(value: &Value) -> Value {
    match value {
        Value::Object(_) => Value::String(value.to_string()),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(shape @ Value::Object(_)) => Value::String(shape.to_string()),
            _ => Value::Null,
        },
        _ => Value::Null,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facility(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_zero_zero_is_unknown_location() {
        assert!(!has_known_location(&facility(json!({
            "FacilityLatitude": 0, "FacilityLongitude": 0.0
        }))));
        assert!(!has_known_location(&facility(json!({"FacilityLatitude": 33.4}))));
        assert!(has_known_location(&facility(json!({
            "FacilityLatitude": 33.4, "FacilityLongitude": 0
        }))));
        assert!(has_known_location(&facility(json!({
            "FacilityLatitude": "33.4", "FacilityLongitude": "-111.5"
        }))));
    }

    #[test]
    fn test_ada_marker() {
        assert!(is_ada_accessible(&facility(json!({"FacilityAdaAccess": "Y"}))));
        assert!(is_ada_accessible(&facility(json!({"FacilityAdaAccess": "Yes, partial"}))));
        assert!(!is_ada_accessible(&facility(json!({"FacilityAdaAccess": "N"}))));
        assert!(!is_ada_accessible(&facility(json!({"FacilityAdaAccess": ""}))));
        assert!(!is_ada_accessible(&facility(json!({}))));
    }

    #[test]
    fn test_geojson_object_becomes_compact_string() {
        let shape = json!({"TYPE": "Point", "COORDINATES": [-111.48, 33.46]});
        assert_eq!(
            encode_geojson(&shape),
            json!(r#"{"TYPE":"Point","COORDINATES":[-111.48,33.46]}"#)
        );
    }

    #[test]
    fn test_geojson_string_is_parsed_strictly() {
        let valid = json!(r#"{"TYPE": "Point", "COORDINATES": [1, 2]}"#);
        assert_eq!(
            encode_geojson(&valid),
            json!(r#"{"TYPE":"Point","COORDINATES":[1,2]}"#)
        );

        assert_eq!(encode_geojson(&json!("{'TYPE': 'Point'}")), Value::Null);
        assert_eq!(encode_geojson(&json!("null")), Value::Null);
        assert_eq!(encode_geojson(&json!("")), Value::Null);
        assert_eq!(encode_geojson(&json!("[1, 2]")), Value::Null);
        assert_eq!(encode_geojson(&json!(42)), Value::Null);
    }
}
