//! Error taxonomy and process exit codes.

use std::path::PathBuf;

use sensorwatch_adapters::AdapterError;
use thiserror::Error;

/// Exit status for a source file that does not exist.
pub const EXIT_SOURCE_MISSING: u8 = 1;
/// Exit status for a source file whose content is unusable.
pub const EXIT_SOURCE_INVALID: u8 = 2;
/// Exit status for an unexpected failure while running.
pub const EXIT_RUNTIME: u8 = 3;
/// Exit status when the broker client cannot be built or verified.
pub const EXIT_CONNECTION: u8 = 4;
/// Exit status for an invalid configuration value.
pub const EXIT_INVALID_SETTING: u8 = 5;

/// Why a single inbound message was rejected.
///
/// Both kinds are recovered by the receive loop: the message is logged and
/// skipped.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The payload is not valid JSON.
    #[error("JSON decoding error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The payload parsed but lacks a required field or has the wrong type.
    #[error("Invalid message format: {0}")]
    Malformed(String),
}

impl MessageError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        MessageError::Malformed(reason.into())
    }
}

/// Startup problems with settings or source files.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Source file not found: {}", .path.display())]
    SourceMissing { path: PathBuf },

    #[error("Invalid content in {}: {reason}", .path.display())]
    SourceInvalid { path: PathBuf, reason: String },

    #[error("Expected a list of JSON objects in {}, got {found}", .path.display())]
    NotAnArray { path: PathBuf, found: &'static str },

    #[error("CSV file {} must contain columns {missing:?}", .path.display())]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

impl ConfigurationError {
    /// Exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigurationError::SourceMissing { .. } => EXIT_SOURCE_MISSING,
            ConfigurationError::SourceInvalid { .. }
            | ConfigurationError::NotAnArray { .. }
            | ConfigurationError::MissingColumns { .. } => EXIT_SOURCE_INVALID,
            ConfigurationError::InvalidSetting { .. } | ConfigurationError::Load(_) => {
                EXIT_INVALID_SETTING
            }
        }
    }
}

/// Errors that end a producer or consumer run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The broker client could not be built, verified or prepared.
    #[error("Broker connection failed: {0}")]
    Connection(#[source] AdapterError),

    #[error("Failed to publish to topic '{topic}': {source}")]
    Publish {
        topic: String,
        #[source]
        source: AdapterError,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Configuration(e) => e.exit_code(),
            PipelineError::Connection(_) => EXIT_CONNECTION,
            PipelineError::Publish { .. } | PipelineError::Serialize(_) | PipelineError::Io(_) => {
                EXIT_RUNTIME
            }
        }
    }
}
