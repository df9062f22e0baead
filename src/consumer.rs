//! The consumer receive loop.

use std::future::Future;
use std::num::NonZeroUsize;

use sensorwatch_adapters::{Delivery, Subscriber};
use tracing::{debug, error, info, warn};

use crate::decode::ReadingDecoder;
use crate::monitor::{MonitorStats, Outcome, StreamMonitor};
use crate::settings::Settings;

/// Settings the receive loop needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerSettings {
    pub topic: String,
    pub window_size: NonZeroUsize,
    pub alert_threshold: f64,
    pub field: String,
    pub key_field: Option<String>,
}

impl ConsumerSettings {
    /// Pick the consumer's share of the run settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            topic: settings.topic.clone(),
            window_size: settings.window_size,
            alert_threshold: settings.alert_threshold,
            field: settings.field.clone(),
            key_field: settings.key_field.clone(),
        }
    }

    /// Build a fresh monitor for one run.
    pub fn monitor(&self) -> StreamMonitor {
        let mut decoder = ReadingDecoder::new(self.field.clone());
        if let Some(key_field) = &self.key_field {
            decoder = decoder.with_key_field(key_field.clone());
        }
        StreamMonitor::new(decoder, self.window_size, self.alert_threshold)
    }
}

/// A subscriber together with the settings for one consumer run.
///
/// [`ConsumerContext::run`] owns the subscriber and closes it before
/// returning, whether the stream ended or shutdown was requested.
#[derive(Debug)]
pub struct ConsumerContext<S> {
    subscriber: S,
    settings: ConsumerSettings,
}

impl<S: Subscriber> ConsumerContext<S> {
    pub fn new(subscriber: S, settings: ConsumerSettings) -> Self {
        Self {
            subscriber,
            settings,
        }
    }

    /// Receive and evaluate messages until the stream ends or `shutdown`
    /// resolves.
    pub async fn run<F>(self, shutdown: F) -> MonitorStats
    where
        F: Future<Output = ()>,
    {
        let Self {
            mut subscriber,
            settings,
        } = self;
        let mut monitor = settings.monitor();

        info!(
            source = subscriber.description(),
            window_size = settings.window_size.get(),
            "Polling messages from topic '{}'...",
            settings.topic
        );
        receive_loop(&mut subscriber, &mut monitor, shutdown).await;

        if let Err(e) = subscriber.close().await {
            warn!(error = %e, "Failed to close subscriber cleanly");
        }
        info!("Consumer closed.");

        let stats = monitor.stats();
        info!(
            received = stats.received,
            accepted = stats.accepted,
            alerts = stats.alerts,
            rejected = stats.rejected(),
            transport_errors = stats.transport_errors,
            "Consumer summary"
        );
        stats
    }
}

async fn receive_loop<S, F>(subscriber: &mut S, monitor: &mut StreamMonitor, shutdown: F)
where
    S: Subscriber + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let next = tokio::select! {
            biased;
            () = &mut shutdown => {
                warn!("Consumer interrupted.");
                return;
            }
            next = subscriber.recv() => next,
        };

        match next {
            None => {
                info!("Subscription ended.");
                return;
            }
            Some(Err(e)) => {
                monitor.record_transport_error();
                error!(error = %e, "Error receiving message");
            }
            Some(Ok(delivery)) => {
                let outcome = monitor.process(&delivery.payload);
                report(&delivery, &outcome, monitor.field());
            }
        }
    }
}

fn report(delivery: &Delivery, outcome: &Outcome, field: &str) {
    debug!(
        topic = %delivery.topic,
        partition = delivery.partition,
        offset = delivery.offset,
        "Received message: {}",
        String::from_utf8_lossy(&delivery.payload)
    );

    match outcome {
        Outcome::Accepted(reading) => {
            debug!(timestamp = %reading.timestamp, value = reading.value, "Reading accepted");
        }
        Outcome::Alert(alert) => {
            warn!(field, "{}", alert);
        }
        Outcome::Rejected(e) => {
            error!("{}: {}", e, String::from_utf8_lossy(&delivery.payload));
        }
    }
}
