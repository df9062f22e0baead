//! Building transports from settings.
//!
//! Any failure here happens before the first message moves and is reported
//! as [`PipelineError::Connection`].

use sensorwatch_adapters::{AdapterError, LinePublisher, LineSubscriber, Publisher, Subscriber};
use tracing::info;

use crate::error::PipelineError;
use crate::settings::{Settings, Transport};

/// Open the publisher selected by `settings.transport`.
///
/// For Kafka this verifies the broker and creates the topic if needed.
pub async fn connect_publisher(settings: &Settings) -> Result<Box<dyn Publisher>, PipelineError> {
    let publisher: Box<dyn Publisher> = match settings.transport {
        Transport::Stdio => Box::new(LinePublisher::new(tokio::io::stdout(), "stdout")),
        Transport::Kafka => kafka_publisher(settings)
            .await
            .map_err(PipelineError::Connection)?,
    };
    info!(sink = publisher.description(), "Publisher ready");
    Ok(publisher)
}

/// Open the subscriber selected by `settings.transport`.
pub async fn connect_subscriber(
    settings: &Settings,
) -> Result<Box<dyn Subscriber>, PipelineError> {
    let subscriber: Box<dyn Subscriber> = match settings.transport {
        Transport::Stdio => Box::new(LineSubscriber::new(
            tokio::io::stdin(),
            &settings.topic,
            "stdin",
        )),
        Transport::Kafka => kafka_subscriber(settings).map_err(PipelineError::Connection)?,
    };
    info!(source = subscriber.description(), "Subscriber ready");
    Ok(subscriber)
}

#[cfg(feature = "kafka")]
async fn kafka_publisher(settings: &Settings) -> Result<Box<dyn Publisher>, AdapterError> {
    use sensorwatch_adapters::kafka::KafkaTransport;

    let publisher = KafkaTransport::builder()
        .brokers(&settings.brokers)
        .client_id("sensorwatch-producer")
        .build_publisher()?;
    publisher.verify()?;
    publisher.ensure_topic(&settings.topic, 1, 1).await?;
    Ok(Box::new(publisher))
}

#[cfg(feature = "kafka")]
fn kafka_subscriber(settings: &Settings) -> Result<Box<dyn Subscriber>, AdapterError> {
    use sensorwatch_adapters::kafka::KafkaTransport;

    let subscriber = KafkaTransport::builder()
        .brokers(&settings.brokers)
        .group_id(&settings.group_id)
        .client_id("sensorwatch-consumer")
        .build_subscriber(&[settings.topic.as_str()])?;
    subscriber.verify()?;
    Ok(Box::new(subscriber))
}

#[cfg(not(feature = "kafka"))]
async fn kafka_publisher(_settings: &Settings) -> Result<Box<dyn Publisher>, AdapterError> {
    Err(kafka_unavailable())
}

#[cfg(not(feature = "kafka"))]
fn kafka_subscriber(_settings: &Settings) -> Result<Box<dyn Subscriber>, AdapterError> {
    Err(kafka_unavailable())
}

#[cfg(not(feature = "kafka"))]
fn kafka_unavailable() -> AdapterError {
    AdapterError::Connection(
        "built without the `kafka` feature; rebuild with it or use --transport stdio".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(transport: Transport) -> Settings {
        let config = config::Config::builder().build().unwrap();
        let mut settings = Settings::from_config(&config).unwrap();
        settings.transport = transport;
        settings
    }

    #[tokio::test]
    async fn test_stdio_publisher() {
        let publisher = connect_publisher(&settings(Transport::Stdio)).await.unwrap();
        assert_eq!(publisher.description(), "stream: stdout");
    }

    #[tokio::test]
    async fn test_stdio_subscriber() {
        let subscriber = connect_subscriber(&settings(Transport::Stdio)).await.unwrap();
        assert_eq!(subscriber.description(), "stream: stdin");
    }

    #[cfg(not(feature = "kafka"))]
    #[tokio::test]
    async fn test_kafka_without_feature_is_connection_error() {
        let err = connect_subscriber(&settings(Transport::Kafka))
            .await
            .err()
            .unwrap();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONNECTION);
    }
}
