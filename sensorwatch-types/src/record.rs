//! Source records published by the CSV producer.

/// Columns a CSV source must provide.
pub const REQUIRED_COLUMNS: [&str; 4] = ["sensor_id", "temperature", "humidity", "timestamp"];

/// A scalar cell read from a tabular source.
///
/// The type is inferred from the cell text: integers stay integers, other
/// finite numbers become floats, empty cells become null and everything else
/// is kept as text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Cell {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Cell {
    /// Infer a cell from its raw text.
    pub fn infer(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Cell::Null;
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Cell::Integer(i);
        }
        match raw.parse::<f64>() {
            Ok(f) if f.is_finite() => Cell::Float(f),
            _ => Cell::Text(raw.to_string()),
        }
    }
}

/// One row of a sensor CSV file, restricted to the required columns.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorRecord {
    pub sensor_id: Cell,
    pub temperature: Cell,
    pub humidity: Cell,
    pub timestamp: Cell,
}

impl SensorRecord {
    /// Build a record from raw cell text, inferring each cell's type.
    pub fn from_raw(sensor_id: &str, temperature: &str, humidity: &str, timestamp: &str) -> Self {
        Self {
            sensor_id: Cell::infer(sensor_id),
            temperature: Cell::infer(temperature),
            humidity: Cell::infer(humidity),
            timestamp: Cell::infer(timestamp),
        }
    }
}
