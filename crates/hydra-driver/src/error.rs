/// Errors raised by a storage driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend cannot serve requests right now.
    #[error("driver {driver} unavailable: {reason}")]
    Unavailable { driver: String, reason: String },

    /// Backend-specific failure that fits no other variant.
    #[error("driver error: {0}")]
    Other(String),
}

/// Result alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

impl From<serde_json::Error> for DriverError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for DriverError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
