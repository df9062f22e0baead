//! Reading - one decoded sensor observation.

/// A single validated observation taken from an inbound message.
///
/// The timestamp is kept as the producer sent it. Ordering between readings
/// is never checked; the consumer treats arrival order as the only order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Opaque timestamp as sent by the producer.
    pub timestamp: String,

    /// The tracked numeric field (e.g. a temperature).
    pub value: f64,

    /// Value of the configured key field, used to pick a per-sensor window.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub key: Option<String>,
}

impl Reading {
    /// Create a reading without a key.
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
            key: None,
        }
    }

    /// Attach a key to this reading.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// The reading's key, if any.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_builder() {
        let reading = Reading::new("t0", 1.5).with_key("a");
        assert_eq!(reading.timestamp, "t0");
        assert_eq!(reading.value, 1.5);
        assert_eq!(reading.key(), Some("a"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_key_omitted_when_absent() {
        let json = serde_json::to_value(Reading::new("t0", 2.0)).unwrap();
        assert!(json.get("key").is_none());
        assert_eq!(json["value"], 2.0);
    }
}
