//! Error types for BhumiStation

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// BhumiStation error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error (socket bind, send, file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration value rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Telemetry frame could not be decoded
    #[error(transparent)]
    Parse(#[from] crate::io::frame::ParseError),

    /// Malformed network address
    #[error("Invalid address {addr:?}: {reason}")]
    InvalidAddress {
        /// The address string as configured
        addr: String,
        /// Why it was rejected
        reason: String,
    },

    /// CSV telemetry log error
    #[error("Telemetry log error: {0}")]
    TelemetryLog(#[from] csv::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
