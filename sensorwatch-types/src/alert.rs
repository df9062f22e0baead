//! Alert - what the consumer reports when a window trips.

use std::fmt;

use crate::Reading;

/// An alert raised after a reading completed a window whose range stayed
/// within the threshold.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alert {
    /// Timestamp of the reading that triggered the alert.
    pub timestamp: String,

    /// The triggering value.
    pub value: f64,

    /// Key of the window that tripped, if readings are keyed.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub key: Option<String>,

    /// Observed max - min over the window.
    pub range: f64,

    /// Configured threshold the range was compared against.
    pub threshold: f64,

    /// Number of values in the window.
    pub window_len: usize,
}

impl Alert {
    /// Build an alert for the given triggering reading.
    pub fn from_reading(reading: &Reading, range: f64, threshold: f64, window_len: usize) -> Self {
        Self {
            timestamp: reading.timestamp.clone(),
            value: reading.value,
            key: reading.key.clone(),
            range,
            threshold,
            window_len,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ALERT at {}: ", self.timestamp)?;
        if let Some(key) = &self.key {
            write!(f, "[{}] ", key)?;
        }
        write!(
            f,
            "value stable at {} (range {:.3} <= {} over {} readings)",
            self.value, self.range, self.threshold, self.window_len
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_display() {
        let reading = Reading::new("2025-01-11T18:15:00Z", 225.0);
        let alert = Alert::from_reading(&reading, 0.12, 0.2, 5);
        assert_eq!(
            alert.to_string(),
            "ALERT at 2025-01-11T18:15:00Z: value stable at 225 (range 0.120 <= 0.2 over 5 readings)"
        );
    }

    #[test]
    fn test_alert_display_with_key() {
        let reading = Reading::new("t", 1.0).with_key("s-1");
        let alert = Alert::from_reading(&reading, 0.0, 0.2, 3);
        assert!(alert.to_string().contains("[s-1]"));
    }
}
