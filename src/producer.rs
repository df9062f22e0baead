//! The producer send loop.

use std::future::Future;
use std::time::Duration;

use sensorwatch_adapters::Publisher;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::settings::Settings;
use crate::sources::Records;

/// Which file a producer reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Json,
}

impl SourceKind {
    /// Whether this source cycles when `repeat` is not configured.
    ///
    /// JSON sources cycle forever, CSV sources are sent once.
    pub fn repeats_by_default(self) -> bool {
        matches!(self, SourceKind::Json)
    }
}

/// Settings the send loop needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerSettings {
    pub topic: String,
    /// Pause after each send.
    pub interval: Duration,
    /// Record field whose value becomes the message key.
    pub key_field: Option<String>,
    pub repeat: bool,
}

impl ProducerSettings {
    /// Pick the producer's share of the run settings for `kind`.
    pub fn from_settings(settings: &Settings, kind: SourceKind) -> Self {
        Self {
            topic: settings.topic.clone(),
            interval: settings.interval,
            key_field: settings.key_field.clone(),
            repeat: settings.repeat.unwrap_or_else(|| kind.repeats_by_default()),
        }
    }
}

/// Counters for a producer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    pub sent: u64,
    /// Whether the run stopped on a shutdown request.
    pub interrupted: bool,
}

/// A publisher together with the settings for one producer run.
///
/// [`ProducerContext::run`] owns the publisher and flushes and closes it
/// before returning, on success, error and shutdown alike.
#[derive(Debug)]
pub struct ProducerContext<P> {
    publisher: P,
    settings: ProducerSettings,
}

impl<P: Publisher> ProducerContext<P> {
    pub fn new(publisher: P, settings: ProducerSettings) -> Self {
        Self {
            publisher,
            settings,
        }
    }

    /// Publish `records` in order, pausing `interval` after each send.
    ///
    /// With `repeat` set the records are cycled until `shutdown` resolves;
    /// otherwise the run stops after the last record. A failed publish also
    /// ends the run.
    pub async fn run<F>(
        self,
        records: &Records,
        shutdown: F,
    ) -> Result<ProducerStats, PipelineError>
    where
        F: Future<Output = ()>,
    {
        let Self {
            mut publisher,
            settings,
        } = self;

        info!(
            sink = publisher.description(),
            repeat = settings.repeat,
            "Sending messages to topic '{}'...",
            settings.topic
        );
        let walk = records.walk(settings.repeat);
        let result = send_loop(&mut publisher, &settings, walk, shutdown).await;

        if let Err(e) = publisher.close().await {
            warn!(error = %e, "Failed to flush publisher");
        }
        info!("Producer closed.");

        if let Ok(stats) = &result {
            info!(sent = stats.sent, interrupted = stats.interrupted, "Producer summary");
        }
        result
    }
}

async fn send_loop<'a, P, I, F>(
    publisher: &mut P,
    settings: &ProducerSettings,
    records: I,
    shutdown: F,
) -> Result<ProducerStats, PipelineError>
where
    P: Publisher + ?Sized,
    I: IntoIterator<Item = &'a Value>,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut stats = ProducerStats::default();

    for record in records {
        let payload = serde_json::to_vec(record)?;
        let key = settings
            .key_field
            .as_deref()
            .and_then(|field| message_key(record, field));

        let sent = tokio::select! {
            biased;
            () = &mut shutdown => {
                stats.interrupted = true;
                break;
            }
            sent = publisher.publish(&settings.topic, key.as_deref(), &payload) => sent,
        };
        sent.map_err(|source| PipelineError::Publish {
            topic: settings.topic.clone(),
            source,
        })?;
        stats.sent += 1;
        info!("Sent message: {}", record);

        tokio::select! {
            biased;
            () = &mut shutdown => {
                stats.interrupted = true;
                break;
            }
            () = tokio::time::sleep(settings.interval) => {}
        }
    }

    if stats.interrupted {
        warn!("Producer interrupted.");
    }
    Ok(stats)
}

/// The record's `field` as a message key, if it is a string or number.
pub fn message_key(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensorwatch_adapters::{channel, LinePublisher, Subscriber};
    use serde_json::json;

    fn settings(interval_ms: u64, repeat: bool) -> ProducerSettings {
        ProducerSettings {
            topic: "smoker".to_string(),
            interval: Duration::from_millis(interval_ms),
            key_field: None,
            repeat,
        }
    }

    fn readings() -> Records {
        Records::new(vec![
            json!({"timestamp": "t1", "temperature": 225.0}),
            json!({"timestamp": "t2", "temperature": 225.05}),
            json!({"timestamp": "t3", "temperature": 224.98}),
        ])
    }

    #[tokio::test]
    async fn test_publishes_records_in_order() {
        let records = readings();
        let (publisher, mut subscriber) = channel("test", 8);

        let stats = ProducerContext::new(publisher, settings(0, false))
            .run(&records, std::future::pending())
            .await
            .unwrap();
        assert_eq!(stats.sent, 3);
        assert!(!stats.interrupted);

        for expected in records.once() {
            let delivery = subscriber.recv().await.unwrap().unwrap();
            assert_eq!(delivery.topic, "smoker");
            let got: Value = serde_json::from_slice(&delivery.payload).unwrap();
            assert_eq!(&got, expected);
        }
        // The publisher was closed, so the stream ends.
        assert!(subscriber.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_interval_after_each_send() {
        let records = readings();
        let (publisher, _subscriber) = channel("test", 8);
        let start = tokio::time::Instant::now();

        ProducerContext::new(publisher, settings(1000, false))
            .run(&records, std::future::pending())
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_cycling() {
        let records = readings();
        let (publisher, _subscriber) = channel("test", 16);

        let stats = ProducerContext::new(publisher, settings(1000, true))
            .run(&records, tokio::time::sleep(Duration::from_millis(2500)))
            .await
            .unwrap();

        assert_eq!(stats.sent, 3);
        assert!(stats.interrupted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_cycles_past_the_last_record() {
        let records = Records::new(vec![json!({"a": 1}), json!({"a": 2})]);
        let (publisher, mut subscriber) = channel("test", 16);

        let stats = ProducerContext::new(publisher, settings(1000, true))
            .run(&records, tokio::time::sleep(Duration::from_millis(9_500)))
            .await
            .unwrap();

        assert!(stats.interrupted);
        assert_eq!(stats.sent, 10);

        let mut seen = Vec::new();
        while let Some(delivery) = subscriber.recv().await {
            let value: Value = serde_json::from_slice(&delivery.unwrap().payload).unwrap();
            seen.push(value["a"].as_i64().unwrap());
        }
        assert_eq!(seen, vec![1, 2, 1, 2, 1, 2, 1, 2, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_repeat_sends_once() {
        let records = Records::new(vec![json!({"a": 1}), json!({"a": 2})]);
        let (publisher, _subscriber) = channel("test", 16);

        let stats = ProducerContext::new(publisher, settings(1000, false))
            .run(&records, tokio::time::sleep(Duration::from_secs(10)))
            .await
            .unwrap();

        assert!(!stats.interrupted);
        assert_eq!(stats.sent, 2);
    }

    #[tokio::test]
    async fn test_publish_failure_is_runtime_error() {
        let records = readings();
        let (publisher, subscriber) = channel("test", 1);
        drop(subscriber);

        let err = ProducerContext::new(publisher, settings(0, false))
            .run(&records, std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Publish { ref topic, .. } if topic == "smoker"));
        assert_eq!(err.exit_code(), crate::error::EXIT_RUNTIME);
    }

    #[tokio::test]
    async fn test_writes_lines() {
        let records = readings();
        let publisher = LinePublisher::new(Vec::new(), "buffer");
        let mut context = ProducerContext::new(publisher, settings(0, false));
        context.settings.key_field = Some("timestamp".to_string());

        let stats = context.run(&records, std::future::pending()).await.unwrap();
        assert_eq!(stats.sent, 3);
    }

    #[test]
    fn test_message_key() {
        let record = json!({"sensor_id": 7, "name": "thermocouple", "ok": true});
        assert_eq!(message_key(&record, "sensor_id").as_deref(), Some("7"));
        assert_eq!(message_key(&record, "name").as_deref(), Some("thermocouple"));
        assert_eq!(message_key(&record, "ok"), None);
        assert_eq!(message_key(&record, "missing"), None);
    }

    #[test]
    fn test_repeat_defaults_per_source() {
        let config = config::Config::builder().build().unwrap();
        let mut run = Settings::from_config(&config).unwrap();

        assert!(ProducerSettings::from_settings(&run, SourceKind::Json).repeat);
        assert!(!ProducerSettings::from_settings(&run, SourceKind::Csv).repeat);

        run.repeat = Some(true);
        assert!(ProducerSettings::from_settings(&run, SourceKind::Csv).repeat);
    }
}
