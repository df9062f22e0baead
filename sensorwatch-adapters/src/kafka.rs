//! Kafka transport.
//!
//! Publishes and consumes sensor messages using the rdkafka library
//! (librdkafka bindings).
//!
//! ## Example
//!
//! ```rust,no_run
//! use sensorwatch_adapters::kafka::KafkaTransport;
//! use sensorwatch_adapters::Publisher;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut publisher = KafkaTransport::builder()
//!         .brokers("localhost:9092")
//!         .build_publisher()?;
//!
//!     publisher.verify()?;
//!     publisher.ensure_topic("smoker", 1, 1).await?;
//!     publisher.publish("smoker", None, br#"{"temperature":225.0}"#).await?;
//!     publisher.close().await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::types::RDKafkaErrorCode;
use tracing::{debug, info};

use crate::{AdapterError, Delivery, Publisher, Subscriber};

/// Entry point for building Kafka publishers and subscribers.
#[derive(Debug)]
pub struct KafkaTransport;

impl KafkaTransport {
    /// Create a new builder for configuring a Kafka client.
    pub fn builder() -> KafkaTransportBuilder {
        KafkaTransportBuilder::default()
    }
}

/// Builder for Kafka publishers and subscribers.
#[derive(Debug, Default)]
pub struct KafkaTransportBuilder {
    brokers: Option<String>,
    group_id: Option<String>,
    client_id: Option<String>,
    offset_reset: Option<String>,
    timeout: Option<Duration>,
}

impl KafkaTransportBuilder {
    /// Set the Kafka broker addresses (comma-separated).
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the consumer group ID (subscribers only).
    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Set the client ID reported to the broker.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Where a new consumer group starts reading ("earliest" or "latest").
    pub fn auto_offset_reset(mut self, reset: impl Into<String>) -> Self {
        self.offset_reset = Some(reset.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn brokers_or_default(&self) -> String {
        self.brokers.clone().unwrap_or_else(|| "localhost:9092".to_string())
    }

    fn timeout_or_default(&self) -> Duration {
        self.timeout.unwrap_or(Duration::from_secs(10))
    }

    fn base_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", self.brokers_or_default());
        config.set(
            "client.id",
            self.client_id.as_deref().unwrap_or("sensorwatch"),
        );
        config
    }

    /// Build a publisher. Nothing is sent to the broker until the first
    /// request, so call [`KafkaPublisher::verify`] to check connectivity.
    pub fn build_publisher(self) -> Result<KafkaPublisher, AdapterError> {
        let timeout = self.timeout_or_default();
        let mut config = self.base_config();
        config.set("message.timeout.ms", timeout.as_millis().to_string());

        let producer: FutureProducer = config
            .create()
            .map_err(|e| AdapterError::Connection(e.to_string()))?;
        let admin: AdminClient<DefaultClientContext> = config
            .create()
            .map_err(|e| AdapterError::Connection(e.to_string()))?;

        Ok(KafkaPublisher {
            producer,
            admin,
            timeout,
            description: format!("kafka: {}", self.brokers_or_default()),
        })
    }

    /// Build a subscriber for `topics`.
    pub fn build_subscriber(self, topics: &[&str]) -> Result<KafkaSubscriber, AdapterError> {
        let timeout = self.timeout_or_default();
        let group_id = self
            .group_id
            .clone()
            .unwrap_or_else(|| "default_group".to_string());

        let mut config = self.base_config();
        config
            .set("group.id", &group_id)
            .set("enable.partition.eof", "false")
            .set("enable.auto.commit", "true")
            .set(
                "auto.offset.reset",
                self.offset_reset.as_deref().unwrap_or("earliest"),
            );

        let consumer: StreamConsumer = config
            .create()
            .map_err(|e| AdapterError::Connection(e.to_string()))?;
        consumer
            .subscribe(topics)
            .map_err(|e| AdapterError::Connection(e.to_string()))?;

        Ok(KafkaSubscriber {
            consumer,
            timeout,
            description: format!(
                "kafka: {} group={} topics={}",
                self.brokers_or_default(),
                group_id,
                topics.join(",")
            ),
        })
    }
}

/// Kafka publisher.
pub struct KafkaPublisher {
    producer: FutureProducer,
    admin: AdminClient<DefaultClientContext>,
    timeout: Duration,
    description: String,
}

impl KafkaPublisher {
    /// Check that the brokers answer a metadata request.
    pub fn verify(&self) -> Result<(), AdapterError> {
        let metadata = self
            .producer
            .client()
            .fetch_metadata(None, self.timeout)
            .map_err(|e| AdapterError::Connection(e.to_string()))?;
        info!(
            brokers = metadata.brokers().len(),
            topics = metadata.topics().len(),
            "Kafka is reachable"
        );
        Ok(())
    }

    /// Create `topic` unless it already exists.
    pub async fn ensure_topic(
        &self,
        topic: &str,
        partitions: i32,
        replication: i32,
    ) -> Result<(), AdapterError> {
        let new_topic = NewTopic::new(topic, partitions, TopicReplication::Fixed(replication));
        let options = AdminOptions::new().operation_timeout(Some(self.timeout));

        let results = self.admin.create_topics([&new_topic], &options).await?;
        for result in results {
            match result {
                Ok(name) => info!(topic = %name, "Created Kafka topic"),
                Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    debug!(topic = %name, "Kafka topic already exists")
                }
                Err((name, code)) => {
                    return Err(AdapterError::Admin(format!("{}: {}", name, code)));
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for KafkaPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaPublisher")
            .field("description", &self.description)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl Publisher for KafkaPublisher {
    async fn publish(
        &mut self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<(), AdapterError> {
        let mut record: FutureRecord<'_, str, [u8]> = FutureRecord::to(topic).payload(payload);
        if let Some(key) = key {
            record = record.key(key);
        }

        self.producer
            .send(record, self.timeout)
            .await
            .map_err(|(err, _)| AdapterError::Publish(err.to_string()))?;
        debug!(topic, "Delivered message");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), AdapterError> {
        self.producer
            .flush(self.timeout)
            .map_err(|e| AdapterError::Publish(e.to_string()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Kafka subscriber.
pub struct KafkaSubscriber {
    consumer: StreamConsumer,
    timeout: Duration,
    description: String,
}

impl KafkaSubscriber {
    /// Check that the brokers answer a metadata request.
    pub fn verify(&self) -> Result<(), AdapterError> {
        self.consumer
            .fetch_metadata(None, self.timeout)
            .map(|_| ())
            .map_err(|e| AdapterError::Connection(e.to_string()))
    }
}

impl std::fmt::Debug for KafkaSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaSubscriber")
            .field("description", &self.description)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl Subscriber for KafkaSubscriber {
    async fn recv(&mut self) -> Option<Result<Delivery, AdapterError>> {
        let result = match self.consumer.recv().await {
            Ok(message) => Ok(Delivery {
                topic: message.topic().to_string(),
                key: message.key().map(<[u8]>::to_vec),
                payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
                partition: Some(message.partition()),
                offset: Some(message.offset()),
            }),
            Err(e) => Err(AdapterError::from(e)),
        };
        Some(result)
    }

    async fn close(&mut self) -> Result<(), AdapterError> {
        self.consumer.unsubscribe();
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}
