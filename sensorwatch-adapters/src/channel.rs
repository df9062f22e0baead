//! In-process channel transport.
//!
//! A bounded tokio mpsc channel standing in for a broker. Useful when the
//! producer and consumer live in the same process, and for driving the
//! consumer loop in tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{AdapterError, Delivery, Publisher, Subscriber};

/// Create a connected publisher/subscriber pair.
///
/// `description` names the pair in logs (e.g. "memory://readings").
pub fn channel(description: &str, capacity: usize) -> (ChannelPublisher, ChannelSubscriber) {
    let (tx, rx) = mpsc::channel(capacity);
    let publisher = ChannelPublisher {
        sender: Some(tx),
        description: format!("channel: {}", description),
    };
    let subscriber = ChannelSubscriber {
        receiver: rx,
        description: format!("channel: {}", description),
    };
    (publisher, subscriber)
}

/// Sending half of an in-process channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: Option<mpsc::Sender<Delivery>>,
    description: String,
}

#[async_trait]
impl Publisher for ChannelPublisher {
    async fn publish(
        &mut self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<(), AdapterError> {
        let sender = self.sender.as_ref().ok_or(AdapterError::Closed)?;
        let mut delivery = Delivery::new(topic, payload.to_vec());
        delivery.key = key.map(|k| k.as_bytes().to_vec());
        sender.send(delivery).await.map_err(|_| AdapterError::Closed)
    }

    async fn close(&mut self) -> Result<(), AdapterError> {
        // Dropping the sender lets the subscriber see end-of-stream.
        self.sender.take();
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Receiving half of an in-process channel.
#[derive(Debug)]
pub struct ChannelSubscriber {
    receiver: mpsc::Receiver<Delivery>,
    description: String,
}

#[async_trait]
impl Subscriber for ChannelSubscriber {
    async fn recv(&mut self) -> Option<Result<Delivery, AdapterError>> {
        self.receiver.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), AdapterError> {
        self.receiver.close();
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_round_trip() {
        let (mut publisher, mut subscriber) = channel("test", 4);

        publisher.publish("readings", Some("s-1"), b"{}").await.unwrap();

        let delivery = subscriber.recv().await.unwrap().unwrap();
        assert_eq!(delivery.topic, "readings");
        assert_eq!(delivery.key.as_deref(), Some(&b"s-1"[..]));
        assert_eq!(delivery.payload, b"{}");
    }

    #[tokio::test]
    async fn test_publisher_close_ends_stream() {
        let (mut publisher, mut subscriber) = channel("test", 4);

        publisher.publish("t", None, b"1").await.unwrap();
        publisher.close().await.unwrap();

        assert!(subscriber.recv().await.is_some());
        assert!(subscriber.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_publish_after_close_fails() {
        let (mut publisher, _subscriber) = channel("test", 4);
        publisher.close().await.unwrap();

        let err = publisher.publish("t", None, b"1").await.unwrap_err();
        assert!(matches!(err, AdapterError::Closed));
    }

    #[tokio::test]
    async fn test_publish_to_closed_subscriber_fails() {
        let (mut publisher, mut subscriber) = channel("test", 4);
        subscriber.close().await.unwrap();

        assert!(publisher.publish("t", None, b"1").await.is_err());
    }

    #[test]
    fn test_description() {
        let (publisher, subscriber) = channel("memory://readings", 1);
        assert_eq!(publisher.description(), "channel: memory://readings");
        assert_eq!(subscriber.description(), "channel: memory://readings");
    }
}
