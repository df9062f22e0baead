//! # sensorwatch-adapters
//!
//! Transports that move serialized sensor messages between a producer and a
//! consumer. Every transport implements [`Publisher`] and/or [`Subscriber`],
//! so the producer and consumer loops never know which broker they talk to.
//!
//! ## Supported Transports
//!
//! - **Kafka** (`kafka` feature) - [`kafka::KafkaPublisher`] and
//!   [`kafka::KafkaSubscriber`] on top of librdkafka
//! - **Byte streams** - [`LinePublisher`] / [`LineSubscriber`] speak
//!   newline-delimited payloads over any tokio reader or writer (stdin,
//!   stdout, TCP)
//! - **Channels** - [`channel()`] gives an in-process pair, handy for
//!   embedding and tests
//!
//! ## Quick Start (channel)
//!
//! ```rust
//! use sensorwatch_adapters::{channel, Publisher, Subscriber};
//!
//! # tokio_test::block_on(async {
//! let (mut publisher, mut subscriber) = channel("readings", 16);
//!
//! publisher.publish("readings", None, br#"{"temperature":225.0}"#).await.unwrap();
//!
//! let delivery = subscriber.recv().await.unwrap().unwrap();
//! assert_eq!(delivery.topic, "readings");
//! # });
//! ```

pub mod error;

mod channel;
mod stream;
mod transport;

#[cfg(feature = "kafka")]
pub mod kafka;

pub use channel::{channel, ChannelPublisher, ChannelSubscriber};
pub use error::AdapterError;
pub use stream::{LinePublisher, LineSubscriber};
pub use transport::{Delivery, Publisher, Subscriber};
