use std::time::Duration;

use serde_json::{Map, Value};
use tracing::trace;

const LAST_SESSION_UID_KEY: &str = "lastSessionUid";
const IS_MEASURING_KEY: &str = "isMeasuring";
const INTERVAL_KEY: &str = "interval";

/// Shape of the document being decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Query result wrapping the device record under its generated key.
    Lookup,

    /// The device record itself, fetched from its own path.
    Record,
}

/// Type tag of a single top-level document entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    Object(&'a Map<String, Value>),
    String(&'a str),
    Bool(bool),
    Int(i64),
    Other,
}

impl<'a> From<&'a Value> for Field<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => Field::Object(map),
            Value::String(s) => Field::String(s),
            Value::Bool(b) => Field::Bool(*b),
            Value::Number(n) => n.as_i64().map_or(Field::Other, Field::Int),
            Value::Null | Value::Array(_) => Field::Other,
        }
    }
}

/// Mirror fields extracted from one document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MirrorUpdate {
    pub device_uid: Option<String>,
    pub last_session_uid: Option<String>,
    pub is_measuring: Option<bool>,
    pub interval: Option<Duration>,
}

impl MirrorUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn record(&mut self, key: &str, field: Field<'_>) {
        match (key, field) {
            (LAST_SESSION_UID_KEY, Field::String(uid)) => {
                self.last_session_uid = Some(uid.to_string())
            }
            (IS_MEASURING_KEY, Field::Bool(flag)) => self.is_measuring = Some(flag),
            // consoles that write the flag as text only enable it with a literal "true"
            (IS_MEASURING_KEY, Field::String(text)) => self.is_measuring = Some(text == "true"),
            (INTERVAL_KEY, Field::Int(ms)) if ms >= 0 => {
                self.interval = Some(Duration::from_millis(ms as u64))
            }
            (key, field) => trace!(key, ?field, "ignoring device field"),
        }
    }
}

/// Extracts the whitelisted mirror fields from a device document.
///
/// Returns `None` when the document is not a JSON object. Fields missing from
/// the document, or carrying an unexpected type, are left out of the update.
pub fn decode(document: &Value, layout: Layout) -> Option<MirrorUpdate> {
    let entries = document.as_object()?;
    let mut update = MirrorUpdate::default();

    for (key, value) in entries {
        match (layout, Field::from(value)) {
            (Layout::Lookup, Field::Object(record)) => {
                update.device_uid = Some(key.clone());
                for (key, value) in record {
                    update.record(key, Field::from(value));
                }
            }
            (_, field) => update.record(key, field),
        }
    }

    Some(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_record_fields() {
        let document = json!({
            "name": "n1",
            "mac": "AA:BB",
            "ownerId": "o1",
            "isMeasuring": true,
            "interval": 30000,
            "lastSessionUid": "S1"
        });

        let update = decode(&document, Layout::Record).unwrap();

        assert_eq!(
            update,
            MirrorUpdate {
                device_uid: None,
                last_session_uid: Some("S1".to_string()),
                is_measuring: Some(true),
                interval: Some(Duration::from_millis(30000)),
            }
        );
    }

    #[test]
    fn missing_interval_is_not_reported() {
        let document = json!({"isMeasuring": false});

        let update = decode(&document, Layout::Record).unwrap();

        assert_eq!(update.interval, None);
        assert_eq!(update.is_measuring, Some(false));
    }

    #[test]
    fn textual_flag_is_compared_literally() {
        let on = decode(&json!({"isMeasuring": "true"}), Layout::Record).unwrap();
        let off = decode(&json!({"isMeasuring": "false"}), Layout::Record).unwrap();
        let other = decode(&json!({"isMeasuring": "TRUE"}), Layout::Record).unwrap();

        assert_eq!(on.is_measuring, Some(true));
        assert_eq!(off.is_measuring, Some(false));
        assert_eq!(other.is_measuring, Some(false));
    }

    #[test]
    fn mistyped_fields_are_skipped() {
        let document = json!({
            "interval": "30000",
            "lastSessionUid": 7,
            "isMeasuring": 1
        });

        let update = decode(&document, Layout::Record).unwrap();

        assert!(update.is_empty());
    }

    #[test]
    fn fractional_and_negative_intervals_are_skipped() {
        let fractional = decode(&json!({"interval": 1500.5}), Layout::Record).unwrap();
        let negative = decode(&json!({"interval": -1}), Layout::Record).unwrap();

        assert_eq!(fractional.interval, None);
        assert_eq!(negative.interval, None);
    }

    #[test]
    fn lookup_takes_uid_from_wrapping_key() {
        let document = json!({
            "-Nx1": {
                "name": "n1",
                "mac": "AA:BB",
                "ownerId": "o1",
                "isMeasuring": false,
                "lastSessionUid": "S9"
            }
        });

        let update = decode(&document, Layout::Lookup).unwrap();

        assert_eq!(update.device_uid.as_deref(), Some("-Nx1"));
        assert_eq!(update.is_measuring, Some(false));
        assert_eq!(update.last_session_uid.as_deref(), Some("S9"));
        assert_eq!(update.interval, None);
    }

    #[test]
    fn record_layout_ignores_nested_objects() {
        let document = json!({"isMeasuring": true, "-Nx1": {"isMeasuring": false}});

        let update = decode(&document, Layout::Record).unwrap();

        assert_eq!(update.device_uid, None);
        assert_eq!(update.is_measuring, Some(true));
    }

    #[test]
    fn non_objects_decode_to_nothing() {
        assert_eq!(decode(&Value::Null, Layout::Record), None);
        assert_eq!(decode(&json!("null"), Layout::Lookup), None);
        assert_eq!(decode(&json!([1, 2]), Layout::Record), None);
    }
}
