//! Session error taxonomy
//!
//! One enum per failure domain, rolled up into [`SessionError`] for the
//! top-level caller. Connection timeouts are the only class recovered
//! locally (by baud probing, exactly once); everything else surfaces as
//! a terminal failure for the run.

use tag_protocol::op::fault_message;
use tag_protocol::DriverError;
use thiserror::Error;

fn fault_text(code: &u16) -> &'static str {
    fault_message(*code)
}

/// Errors establishing the reader connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The handshake timed out and the transport cannot be probed
    #[error("timed out connecting to the reader")]
    Timeout,

    /// Every candidate baud rate timed out
    #[error("no candidate baud rate answered")]
    ProbeExhausted,

    /// Non-timeout driver failure; never probed around
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Errors resolving the operating region
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    /// The device has no region configured and supports none
    #[error("reader doesn't support any regions")]
    NoSupportedRegions,
}

/// Errors from single-tag operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperationError {
    /// Single-tag operations need a tag-op antenna configured first
    #[error("no tag-op antenna configured")]
    NoAntenna,

    /// The device reported the operation failed
    #[error("tag operation failed: fault 0x{code:04X} ({})", fault_text(.code))]
    TagOperationFailed {
        /// Device fault code
        code: u16,
    },
}

/// Errors collecting statistics
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    /// The current model does not provide this telemetry
    #[error("{0} is not available on this model")]
    Unsupported(&'static str),
}

/// Umbrella error the orchestration surfaces to its caller
#[derive(Debug, Error)]
pub enum SessionError {
    /// Connection establishment failed
    #[error("connection failed: {0}")]
    Connection(#[from] ConnectionError),

    /// Region resolution failed
    #[error("region setup failed: {0}")]
    Region(#[from] RegionError),

    /// A single-tag operation failed
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// Statistics collection failed
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// The driver reported a fault outside the classes above
    #[error("reader fault: {0}")]
    Driver(#[from] DriverError),

    /// A call arrived in the wrong read-session state
    #[error("read session state error: {0}")]
    State(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_names_the_fault() {
        let err = OperationError::TagOperationFailed { code: 0x0424 };
        let text = err.to_string();
        assert!(text.contains("0x0424"));
        assert!(text.contains("Gen2 memory locked"));
    }

    #[test]
    fn test_umbrella_conversions() {
        let err: SessionError = RegionError::NoSupportedRegions.into();
        assert!(matches!(err, SessionError::Region(_)));

        let err: SessionError = DriverError::Timeout.into();
        assert!(matches!(err, SessionError::Driver(_)));
    }
}
