//! Transport traits shared by every adapter.

use async_trait::async_trait;

use crate::AdapterError;

/// A message taken off a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Topic the message arrived on.
    pub topic: String,
    /// Message key, if the producer set one.
    pub key: Option<Vec<u8>>,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
    /// Broker partition, when the transport has partitions.
    pub partition: Option<i32>,
    /// Broker offset, when the transport has offsets.
    pub offset: Option<i64>,
}

impl Delivery {
    /// Create a delivery with only a topic and payload.
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            key: None,
            payload,
            partition: None,
            offset: None,
        }
    }
}

/// Sending side of a transport.
///
/// Implementations own the underlying connection. Callers must invoke
/// [`Publisher::close`] once they are done, on every exit path, so buffered
/// messages are flushed before the connection goes away.
#[async_trait]
pub trait Publisher: Send {
    /// Publish one payload to `topic`, optionally keyed.
    async fn publish(
        &mut self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<(), AdapterError>;

    /// Flush pending messages and release the connection.
    async fn close(&mut self) -> Result<(), AdapterError>;

    /// Human-readable description of where messages go.
    fn description(&self) -> &str;
}

/// Receiving side of a transport.
#[async_trait]
pub trait Subscriber: Send {
    /// Wait for the next message.
    ///
    /// Returns `None` once the transport is exhausted (end of stream or all
    /// senders gone). An `Err` reports a transport-level failure for one
    /// receive attempt; callers may keep receiving afterwards.
    async fn recv(&mut self) -> Option<Result<Delivery, AdapterError>>;

    /// Stop receiving and release the connection.
    async fn close(&mut self) -> Result<(), AdapterError>;

    /// Human-readable description of where messages come from.
    fn description(&self) -> &str;
}

#[async_trait]
impl<P: Publisher + ?Sized> Publisher for Box<P> {
    async fn publish(
        &mut self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<(), AdapterError> {
        (**self).publish(topic, key, payload).await
    }

    async fn close(&mut self) -> Result<(), AdapterError> {
        (**self).close().await
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}

#[async_trait]
impl<S: Subscriber + ?Sized> Subscriber for Box<S> {
    async fn recv(&mut self) -> Option<Result<Delivery, AdapterError>> {
        (**self).recv().await
    }

    async fn close(&mut self) -> Result<(), AdapterError> {
        (**self).close().await
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}
