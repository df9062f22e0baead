//! JSON array source.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use super::{read_source, Records};
use crate::decode::json_type;
use crate::error::ConfigurationError;

/// Load a file holding a JSON array; each element becomes one record.
///
/// Elements are kept verbatim, whatever their shape.
pub fn load_json(path: &Path) -> Result<Records, ConfigurationError> {
    info!(path = %path.display(), "Opening JSON data file");
    let content = read_source(path)?;

    let value: Value =
        serde_json::from_str(&content).map_err(|e| ConfigurationError::SourceInvalid {
            path: path.to_path_buf(),
            reason: format!("Parse error: {}", e),
        })?;

    match value {
        Value::Array(records) => {
            debug!(count = records.len(), "Loaded JSON records");
            Ok(Records::new(records))
        }
        other => Err(ConfigurationError::NotAnArray {
            path: path.to_path_buf(),
            found: json_type(&other),
        }),
    }
}
