//! Error types for endpoint handling

use thiserror::Error;

/// Errors that can occur while resolving a reader endpoint
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The reader URI could not be parsed
    #[error("invalid reader uri '{uri}': {reason}")]
    InvalidUri {
        /// The offending URI
        uri: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Failed to enumerate serial ports
    #[error("failed to enumerate ports: {0}")]
    EnumerationFailed(String),

    /// Serial port error
    #[error("serial port error: {0}")]
    SerialPort(#[from] serialport::Error),
}
