//! Turning raw payloads into validated readings.

use serde_json::{Map, Value};

use sensorwatch_types::Reading;

use crate::error::MessageError;

/// Field holding the reading's timestamp.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Parses inbound payloads into [`Reading`]s.
///
/// A payload must be a JSON object carrying a numeric tracked field and a
/// `timestamp` (string or number). When a key field is configured it must be
/// present too, as a string or number. Other fields are ignored.
#[derive(Debug, Clone)]
pub struct ReadingDecoder {
    field: String,
    key_field: Option<String>,
}

impl ReadingDecoder {
    /// Decode readings whose value lives in `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            key_field: None,
        }
    }

    /// Also extract a key from `key_field`.
    pub fn with_key_field(mut self, key_field: impl Into<String>) -> Self {
        self.key_field = Some(key_field.into());
        self
    }

    /// Name of the tracked field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Decode one payload.
    pub fn decode(&self, payload: &[u8]) -> Result<Reading, MessageError> {
        let value: Value = serde_json::from_slice(payload)?;
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(MessageError::malformed(format!(
                    "expected a JSON object, got {}",
                    json_type(&other)
                )))
            }
        };

        let reading_value = match object.get(&self.field) {
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
                MessageError::malformed(format!("field '{}' is out of range", self.field))
            })?,
            Some(other) => {
                return Err(MessageError::malformed(format!(
                    "field '{}' must be a number, got {}",
                    self.field,
                    json_type(other)
                )))
            }
            None => {
                return Err(MessageError::malformed(format!(
                    "missing field '{}'",
                    self.field
                )))
            }
        };

        let timestamp = scalar_text(&object, TIMESTAMP_FIELD)?;
        let mut reading = Reading::new(timestamp, reading_value);

        if let Some(key_field) = &self.key_field {
            reading.key = Some(scalar_text(&object, key_field)?);
        }

        Ok(reading)
    }
}

/// Read a string or number field as text.
fn scalar_text(object: &Map<String, Value>, field: &str) -> Result<String, MessageError> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(MessageError::malformed(format!(
            "field '{}' must be a string or number, got {}",
            field,
            json_type(other)
        ))),
        None => Err(MessageError::malformed(format!("missing field '{}'", field))),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> ReadingDecoder {
        ReadingDecoder::new("temperature")
    }

    #[test]
    fn test_decodes_valid_payload() {
        let reading = decoder()
            .decode(br#"{"timestamp": "2025-01-11T18:15:00Z", "temperature": 225.0}"#)
            .unwrap();
        assert_eq!(reading.timestamp, "2025-01-11T18:15:00Z");
        assert_eq!(reading.value, 225.0);
        assert_eq!(reading.key, None);
    }

    #[test]
    fn test_ignores_extra_fields() {
        let reading = decoder()
            .decode(br#"{"timestamp": "t", "temperature": 70, "humidity": 40, "note": "x"}"#)
            .unwrap();
        assert_eq!(reading.value, 70.0);
    }

    #[test]
    fn test_numeric_timestamp_is_kept_as_text() {
        let reading = decoder()
            .decode(br#"{"timestamp": 1736619300, "temperature": 1.0}"#)
            .unwrap();
        assert_eq!(reading.timestamp, "1736619300");
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        let err = decoder().decode(b"{not json").unwrap_err();
        assert!(matches!(err, MessageError::Decode(_)));
    }

    #[test]
    fn test_missing_value_is_malformed() {
        let err = decoder().decode(br#"{"timestamp": "t"}"#).unwrap_err();
        assert!(matches!(err, MessageError::Malformed(ref m) if m.contains("temperature")));
    }

    #[test]
    fn test_missing_timestamp_is_malformed() {
        let err = decoder().decode(br#"{"temperature": 1.0}"#).unwrap_err();
        assert!(matches!(err, MessageError::Malformed(ref m) if m.contains("timestamp")));
    }

    #[test]
    fn test_non_numeric_value_is_malformed() {
        for payload in [
            &br#"{"timestamp": "t", "temperature": "225.0"}"#[..],
            br#"{"timestamp": "t", "temperature": null}"#,
            br#"{"timestamp": "t", "temperature": [1]}"#,
        ] {
            let err = decoder().decode(payload).unwrap_err();
            assert!(matches!(err, MessageError::Malformed(_)));
        }
    }

    #[test]
    fn test_null_timestamp_is_malformed() {
        let err = decoder()
            .decode(br#"{"timestamp": null, "temperature": 1.0}"#)
            .unwrap_err();
        assert!(matches!(err, MessageError::Malformed(_)));
    }

    #[test]
    fn test_non_object_is_malformed() {
        let err = decoder().decode(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, MessageError::Malformed(ref m) if m.contains("array")));
    }

    #[test]
    fn test_key_field() {
        let decoder = decoder().with_key_field("sensor_id");

        let reading = decoder
            .decode(br#"{"sensor_id": 3, "timestamp": "t", "temperature": 1.0}"#)
            .unwrap();
        assert_eq!(reading.key(), Some("3"));

        let err = decoder
            .decode(br#"{"timestamp": "t", "temperature": 1.0}"#)
            .unwrap_err();
        assert!(matches!(err, MessageError::Malformed(ref m) if m.contains("sensor_id")));
    }
}
