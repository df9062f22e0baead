//! # sensorwatch-types
//!
//! Core types shared by the sensorwatch producer and consumer. Nothing in
//! here knows about brokers or files; the types describe what travels on a
//! topic and what the consumer derives from it.
//!
//! ## Features
//!
//! - `serde`: JSON (or any serde format) encoding for all types
//!
//! ## Example
//!
//! ```rust
//! use sensorwatch_types::{Alert, Reading};
//!
//! let reading = Reading::new("2025-01-11T18:15:00Z", 225.0).with_key("smoker-1");
//! let alert = Alert::from_reading(&reading, 0.12, 0.2, 5);
//!
//! assert_eq!(alert.key.as_deref(), Some("smoker-1"));
//! assert!(alert.to_string().contains("225"));
//! ```

mod alert;
mod reading;
mod record;

pub use alert::*;
pub use reading::*;
pub use record::*;
