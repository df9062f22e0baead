//! # sensorwatch
//!
//! Streams JSON sensor readings through a publish/subscribe broker and raises
//! an alert when a tracked value holds steady over a sliding window.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐                ┌──────────────────────────────┐
//! │         Producer         │                │           Consumer           │
//! │  ┌─────────┐             │   Publisher    │             ┌─────────────┐  │
//! │  │ sources │── Records ──┼──▶ (kafka,  ───┼──▶ decode ─▶│   monitor   │  │
//! │  │csv, json│             │   stdio, chan) │             │ (windows +  │  │
//! │  └─────────┘             │   Subscriber   │             │  evaluate)  │  │
//! │                          │                │             └─────────────┘  │
//! └──────────────────────────┘                └──────────────────────────────┘
//! ```
//!
//! - **[`sources`]**: load a CSV or JSON file into [`Records`] that can be
//!   walked once or cycled
//! - **[`producer`]**: the send loop, pacing records onto a topic
//! - **[`decode`]**: payload validation into [`Reading`]s
//! - **[`window`]**: [`SlidingWindow`] and the [`evaluate`] predicate
//! - **[`monitor`]**: per-message decode, window and alert step
//! - **[`consumer`]**: the receive loop around the monitor
//! - **[`settings`]**: layered configuration
//! - **[`error`]**: error types and process exit codes
//!
//! Transports live in `sensorwatch-adapters`, data types in
//! `sensorwatch-types`.
//!
//! ## Alert rule
//!
//! Once a window holds `window_size` readings, an alert fires when
//! `max - min <= alert_threshold`, i.e. when the readings have stopped
//! moving. A partial window never alerts.
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Publish readings to Kafka, one per second
//! sensorwatch --topic smoker produce-json --file data/readings.json
//!
//! # Watch the topic for stable readings
//! sensorwatch --topic smoker consume --window-size 5
//!
//! # No broker: pipe the producer into the consumer
//! sensorwatch --transport stdio produce-csv | sensorwatch --transport stdio consume
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::num::NonZeroUsize;
//! use sensorwatch::{Outcome, ReadingDecoder, StreamMonitor};
//!
//! let capacity = NonZeroUsize::new(3).unwrap();
//! let mut monitor = StreamMonitor::new(ReadingDecoder::new("temperature"), capacity, 0.2);
//!
//! for t in [225.0, 225.05, 224.98] {
//!     let payload = format!(r#"{{"timestamp": "2025-01-11T18:15:00Z", "temperature": {}}}"#, t);
//!     if let Outcome::Alert(alert) = monitor.process(payload.as_bytes()) {
//!         println!("{}", alert);
//!     }
//! }
//! assert_eq!(monitor.stats().alerts, 1);
//! ```
//!
//! ### Driving the consumer loop
//!
//! ```
//! use std::num::NonZeroUsize;
//! use sensorwatch::{ConsumerContext, ConsumerSettings};
//! use sensorwatch_adapters::{channel, Publisher};
//!
//! # tokio_test::block_on(async {
//! let (mut publisher, subscriber) = channel("readings", 16);
//! publisher
//!     .publish("smoker", None, br#"{"timestamp": "t", "temperature": 225.0}"#)
//!     .await
//!     .unwrap();
//! publisher.close().await.unwrap();
//!
//! let settings = ConsumerSettings {
//!     topic: "smoker".to_string(),
//!     window_size: NonZeroUsize::new(5).unwrap(),
//!     alert_threshold: 0.2,
//!     field: "temperature".to_string(),
//!     key_field: None,
//! };
//! let stats = ConsumerContext::new(subscriber, settings)
//!     .run(std::future::pending())
//!     .await;
//! assert_eq!(stats.accepted, 1);
//! # });
//! ```

pub mod connect;
pub mod consumer;
pub mod decode;
pub mod error;
pub mod monitor;
pub mod producer;
pub mod settings;
pub mod shutdown;
pub mod sources;
pub mod window;

pub use consumer::{ConsumerContext, ConsumerSettings};
pub use decode::ReadingDecoder;
pub use error::{ConfigurationError, MessageError, PipelineError};
pub use monitor::{MonitorStats, Outcome, StreamMonitor};
pub use producer::{ProducerContext, ProducerSettings, ProducerStats, SourceKind};
pub use sensorwatch_types::{Alert, Reading, SensorRecord};
pub use settings::{Settings, Transport};
pub use sources::{load_csv, load_json, Records};
pub use window::{evaluate, RangeAlert, SlidingWindow, WindowSet};
