//! CSV source with required sensor columns.

use std::path::Path;

use sensorwatch_types::{SensorRecord, REQUIRED_COLUMNS};
use serde::Deserialize;
use tracing::{debug, info};

use super::{read_source, Records};
use crate::error::ConfigurationError;

/// The required columns of one row, as raw text. Other columns are skipped.
#[derive(Debug, Deserialize)]
struct RawRow {
    sensor_id: String,
    temperature: String,
    humidity: String,
    timestamp: String,
}

/// Load a sensor CSV file.
///
/// The header must name every column in [`REQUIRED_COLUMNS`]; otherwise the
/// whole file is rejected before any record is produced. Each row keeps only
/// the required columns, with cell types inferred from their text.
pub fn load_csv(path: &Path) -> Result<Records, ConfigurationError> {
    info!(path = %path.display(), "Opening CSV data file");
    let content = read_source(path)?;
    let invalid = |reason: String| ConfigurationError::SourceInvalid {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| invalid(format!("Header error: {}", e)))?
        .clone();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ConfigurationError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<RawRow>().enumerate() {
        let row = row.map_err(|e| invalid(format!("Row {}: {}", index + 1, e)))?;
        let record = SensorRecord::from_raw(
            &row.sensor_id,
            &row.temperature,
            &row.humidity,
            &row.timestamp,
        );
        let value = serde_json::to_value(&record)
            .map_err(|e| invalid(format!("Row {}: {}", index + 1, e)))?;
        records.push(value);
    }

    debug!(count = records.len(), "Loaded CSV records");
    Ok(Records::new(records))
}
