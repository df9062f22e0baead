//! Finite record sources for the producer.
//!
//! A source file is read once, up front, into [`Records`]. The producer then
//! walks the records either once or in an endless cycle; both walks are
//! plain iterators, so nothing here touches a transport.
//!
//! ```
//! use sensorwatch::Records;
//! use serde_json::json;
//!
//! let records = Records::new(vec![json!({"n": 1}), json!({"n": 2})]);
//! let sent: Vec<_> = records.cycle().take(5).map(|r| r["n"].as_i64().unwrap()).collect();
//! assert_eq!(sent, vec![1, 2, 1, 2, 1]);
//! ```

mod csv;
mod json;

pub use self::csv::load_csv;
pub use self::json::load_json;

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use crate::error::ConfigurationError;

/// Records loaded from a source file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Records {
    records: Vec<Value>,
}

impl Records {
    /// Wrap already loaded records.
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Walk the records once.
    pub fn once(&self) -> impl Iterator<Item = &Value> + '_ {
        self.records.iter()
    }

    /// Walk the records forever, restarting after the last one.
    ///
    /// Ends immediately when there are no records.
    pub fn cycle(&self) -> impl Iterator<Item = &Value> + '_ {
        self.records.iter().cycle()
    }

    /// Walk once or forever.
    pub fn walk(&self, repeat: bool) -> Box<dyn Iterator<Item = &Value> + Send + '_> {
        if repeat {
            Box::new(self.cycle())
        } else {
            Box::new(self.once())
        }
    }
}

/// Read a whole source file, mapping a missing file to its own error.
fn read_source(path: &Path) -> Result<String, ConfigurationError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConfigurationError::SourceMissing {
            path: path.to_path_buf(),
        },
        _ => ConfigurationError::SourceInvalid {
            path: path.to_path_buf(),
            reason: format!("Read error: {}", e),
        },
    })
}
