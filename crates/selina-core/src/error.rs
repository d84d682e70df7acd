use thiserror::Error;

/// Top-level error type for Selina.
#[derive(Debug, Error)]
pub enum SelinaError {
    /// Error from a WhatsApp connection (transport, pairing, send).
    #[error("connection error: {0}")]
    Connection(String),

    /// Error from an external service adapter.
    #[error("service error: {0}")]
    Service(String),

    /// Record store error (unreadable or corrupt collection, failed write).
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Rejected input.
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
