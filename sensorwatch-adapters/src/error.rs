//! Error types for transports.

use thiserror::Error;

/// Errors raised by a transport.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The client could not be created or the broker could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Broker rejected an administrative request (e.g. topic creation).
    #[error("Admin request failed: {0}")]
    Admin(String),

    /// Publishing a message failed.
    #[error("Publish failed: {0}")]
    Publish(String),

    /// Receiving a message failed.
    #[error("Receive failed: {0}")]
    Receive(String),

    /// The other end of the transport is gone.
    #[error("Transport closed")]
    Closed,

    /// Underlying byte stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "kafka")]
impl From<rdkafka::error::KafkaError> for AdapterError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        use rdkafka::error::KafkaError;

        match err {
            KafkaError::ClientCreation(msg) => AdapterError::Connection(msg),
            KafkaError::MetadataFetch(code) => AdapterError::Connection(code.to_string()),
            KafkaError::AdminOp(code) => AdapterError::Admin(code.to_string()),
            KafkaError::AdminOpCreation(msg) => AdapterError::Admin(msg),
            KafkaError::MessageProduction(code) => AdapterError::Publish(code.to_string()),
            KafkaError::MessageConsumption(code) => AdapterError::Receive(code.to_string()),
            other => AdapterError::Connection(other.to_string()),
        }
    }
}
