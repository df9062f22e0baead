//! Per-message processing for the consumer: decode, window, evaluate.

use std::num::NonZeroUsize;

use sensorwatch_types::{Alert, Reading};

use crate::decode::ReadingDecoder;
use crate::error::MessageError;
use crate::window::{RangeAlert, WindowSet};

/// What happened to one inbound payload.
#[derive(Debug)]
pub enum Outcome {
    /// The reading was pushed; its window did not trip.
    Accepted(Reading),
    /// The reading was pushed and its window tripped.
    Alert(Alert),
    /// The payload was rejected; no window changed.
    Rejected(MessageError),
}

/// Counters for a consumer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub received: u64,
    pub accepted: u64,
    pub alerts: u64,
    pub decode_errors: u64,
    pub malformed: u64,
    pub transport_errors: u64,
}

impl MonitorStats {
    /// Messages rejected by the decoder, of either kind.
    pub fn rejected(&self) -> u64 {
        self.decode_errors + self.malformed
    }
}

/// Feeds payloads through the decoder into keyed sliding windows.
///
/// The monitor never logs; the receive loop reports each [`Outcome`].
#[derive(Debug, Clone)]
pub struct StreamMonitor {
    decoder: ReadingDecoder,
    windows: WindowSet,
    alert: RangeAlert,
    stats: MonitorStats,
}

impl StreamMonitor {
    /// Create a monitor with windows of `capacity` and the given threshold.
    pub fn new(decoder: ReadingDecoder, capacity: NonZeroUsize, threshold: f64) -> Self {
        Self {
            decoder,
            windows: WindowSet::new(capacity),
            alert: RangeAlert::new(threshold),
            stats: MonitorStats::default(),
        }
    }

    /// Process one raw payload.
    pub fn process(&mut self, payload: &[u8]) -> Outcome {
        self.stats.received += 1;

        let reading = match self.decoder.decode(payload) {
            Ok(reading) => reading,
            Err(e) => {
                match e {
                    MessageError::Decode(_) => self.stats.decode_errors += 1,
                    MessageError::Malformed(_) => self.stats.malformed += 1,
                }
                return Outcome::Rejected(e);
            }
        };

        self.stats.accepted += 1;
        let window = self.windows.push(reading.key(), reading.value);

        if self.alert.check(window) {
            self.stats.alerts += 1;
            let range = window.range().unwrap_or_default();
            Outcome::Alert(Alert::from_reading(
                &reading,
                range,
                self.alert.threshold(),
                window.len(),
            ))
        } else {
            Outcome::Accepted(reading)
        }
    }

    /// Record a transport failure that never produced a payload.
    pub fn record_transport_error(&mut self) {
        self.stats.transport_errors += 1;
    }

    /// Counters so far.
    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// The keyed windows.
    pub fn windows(&self) -> &WindowSet {
        &self.windows
    }

    /// Name of the tracked field.
    pub fn field(&self) -> &str {
        self.decoder.field()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(capacity: usize) -> StreamMonitor {
        StreamMonitor::new(
            ReadingDecoder::new("temperature"),
            NonZeroUsize::new(capacity).unwrap(),
            0.2,
        )
    }

    fn payload(temperature: f64) -> Vec<u8> {
        format!(
            r#"{{"timestamp": "2025-01-11T18:15:00Z", "temperature": {}}}"#,
            temperature
        )
        .into_bytes()
    }

    #[test]
    fn test_alert_on_fifth_stable_reading() {
        let mut monitor = monitor(5);
        let values = [225.0, 225.05, 224.98, 225.1, 225.02];

        for &v in &values[..4] {
            assert!(matches!(monitor.process(&payload(v)), Outcome::Accepted(_)));
        }
        match monitor.process(&payload(values[4])) {
            Outcome::Alert(alert) => {
                assert_eq!(alert.value, 225.02);
                assert_eq!(alert.window_len, 5);
                assert!(alert.range <= 0.2);
            }
            other => panic!("expected alert, got {:?}", other),
        }
        assert_eq!(monitor.stats().alerts, 1);
    }

    #[test]
    fn test_missing_field_leaves_window_untouched() {
        let mut monitor = monitor(5);
        monitor.process(&payload(1.0));

        let outcome = monitor.process(br#"{"timestamp": "t"}"#);

        assert!(matches!(outcome, Outcome::Rejected(MessageError::Malformed(_))));
        assert_eq!(monitor.windows().get(None).unwrap().len(), 1);
        assert_eq!(monitor.stats().malformed, 1);
    }

    #[test]
    fn test_decode_error_counted() {
        let mut monitor = monitor(5);
        let outcome = monitor.process(b"\x00garbage");

        assert!(matches!(outcome, Outcome::Rejected(MessageError::Decode(_))));
        assert_eq!(monitor.stats().decode_errors, 1);
        assert_eq!(monitor.stats().rejected(), 1);
        assert!(monitor.windows().get(None).is_none());
    }

    #[test]
    fn test_keyed_windows_alert_independently() {
        let mut monitor = StreamMonitor::new(
            ReadingDecoder::new("temperature").with_key_field("sensor_id"),
            NonZeroUsize::new(2).unwrap(),
            0.2,
        );

        let reading = |id: &str, t: f64| {
            format!(r#"{{"sensor_id": "{}", "timestamp": "t", "temperature": {}}}"#, id, t)
        };

        assert!(matches!(monitor.process(reading("a", 1.0).as_bytes()), Outcome::Accepted(_)));
        assert!(matches!(monitor.process(reading("b", 50.0).as_bytes()), Outcome::Accepted(_)));
        match monitor.process(reading("a", 1.1).as_bytes()) {
            Outcome::Alert(alert) => assert_eq!(alert.key.as_deref(), Some("a")),
            other => panic!("expected alert, got {:?}", other),
        }
        assert!(matches!(monitor.process(reading("b", 60.0).as_bytes()), Outcome::Accepted(_)));
    }

    #[test]
    fn test_transport_errors_counted() {
        let mut monitor = monitor(1);
        monitor.record_transport_error();
        assert_eq!(monitor.stats().transport_errors, 1);
        assert_eq!(monitor.stats().received, 0);
    }
}
