//! # Error Types
//!
//! Custom error types for Blueberry Link using `thiserror`.
//!
//! The transcoder and receiver core are infallible: insufficient data,
//! sync loss and CRC mismatches are reported as a `false` return and
//! recovered by resynchronization. These errors cover the surfaces around
//! the core (packet encoding, configuration, serial I/O, frame capture).

use thiserror::Error;

/// Main error type for Blueberry Link
#[derive(Debug, Error)]
pub enum LinkError {
    /// Packet format errors
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// Frame capture serialization errors
    #[error("Capture error: {0}")]
    Capture(#[from] serde_json::Error),
}

/// Result type alias for Blueberry Link
pub type Result<T> = std::result::Result<T, LinkError>;
