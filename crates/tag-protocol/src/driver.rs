//! The reader driver contract
//!
//! Everything below the orchestration layer - transport, wire framing,
//! firmware commands - lives behind [`ReaderDriver`]. The orchestration
//! consumes a small closed set of typed parameters rather than an
//! open-ended string-keyed namespace; model-specific behavior is decided
//! once from [`crate::ReaderModelDb`], not inside the driver calls.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::filter::TagFilter;
use crate::op::{fault_message, TagOp};
use crate::plan::ReadPlan;
use crate::record::TagReadRecord;
use crate::stats::{ReaderStats, StatsFlags};
use crate::types::{Gen2Session, Region};

/// Serial rate every connect attempt starts from
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

fn fault_text(code: &u16) -> &'static str {
    fault_message(*code)
}

/// Errors a driver reports to the orchestration layer
#[derive(Debug, Error)]
pub enum DriverError {
    /// The device did not answer within the transport timeout
    #[error("timed out waiting for the reader")]
    Timeout,

    /// Transport-level failure (port gone, link reset, framing garbage)
    #[error("transport failure: {0}")]
    Transport(String),

    /// The device reported a tag operation failure
    #[error("device fault 0x{code:04X} ({})", fault_text(.code))]
    TagOpFailed {
        /// Big-endian fault code from the device
        code: u16,
    },

    /// The current model does not implement the requested feature
    #[error("not supported on this reader: {0}")]
    Unsupported(&'static str),

    /// A session call was issued before `open` succeeded
    #[error("reader is not connected")]
    NotConnected,
}

impl DriverError {
    /// True for the timeout class, the only failure connect probing
    /// recovers from
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout)
    }
}

/// Transport class of a reader endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransportKind {
    /// Serial-attached module; link rate can be probed
    Serial,
    /// Network-attached reader; no link-rate negotiation
    Network,
}

impl TransportKind {
    /// Whether baud-rate probing applies to this transport
    pub fn is_probe_capable(&self) -> bool {
        matches!(self, TransportKind::Serial)
    }
}

/// Direction of a traced transport frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host to reader
    Tx,
    /// Reader to host
    Rx,
}

/// One raw transport frame, delivered to a diagnostics tap
#[derive(Debug, Clone)]
pub struct TransportFrame {
    /// Frame direction
    pub direction: Direction,
    /// Raw frame bytes
    pub bytes: Vec<u8>,
}

/// Diagnostics tap for raw transport frames
///
/// Unbounded so a slow consumer can never stall the driver; the driver
/// drops the tap when the receiver goes away.
pub type TransportTap = mpsc::UnboundedSender<TransportFrame>;

/// Options for one connect attempt
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Serial link rate for this attempt (ignored by network transports)
    pub baud_rate: u32,
    /// How long to wait for the handshake before reporting a timeout
    pub timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: Duration::from_millis(1000),
        }
    }
}

/// Session-scoped radio parameters for single-tag operations
///
/// These persist on the device across operations until changed; they are
/// deliberately not part of [`TagOp`] values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RadioConfig {
    /// Antenna used for single-tag operations; required before any
    /// operation executes
    pub tagop_antenna: Option<u16>,
    /// Gen2 inventory session flag
    pub session: Gen2Session,
    /// Read RF power in centi-dBm, None leaves the device value
    pub read_power_cdbm: Option<u16>,
    /// Write RF power in centi-dBm, None leaves the device value
    pub write_power_cdbm: Option<u16>,
}

/// Contract every reader transport implements
///
/// Implementations handle their own locking: methods take `&self` and
/// must be safe to call from the one controlling task plus the single
/// background read task. None of the calls are re-entrant on the same
/// device; the orchestration layer serializes session-mutating calls.
#[async_trait]
pub trait ReaderDriver: Send + Sync {
    /// Open the device at the given link options and perform the
    /// firmware handshake
    async fn open(&self, opts: &ConnectOptions) -> Result<(), DriverError>;

    /// Close the device; safe to call on an already-closed driver
    async fn close(&self);

    /// Transport class of this endpoint
    fn transport(&self) -> TransportKind;

    /// Install or remove the raw-frame diagnostics tap
    fn set_transport_tap(&self, tap: Option<TransportTap>);

    /// Firmware-reported model name
    async fn model_name(&self) -> Result<String, DriverError>;

    /// Current serial link rate
    async fn baud_rate(&self) -> Result<u32, DriverError>;

    /// Persist a serial link rate for subsequent traffic
    async fn set_baud_rate(&self, baud: u32) -> Result<(), DriverError>;

    /// Current operating region ([`Region::Unspecified`] when unset)
    async fn region(&self) -> Result<Region, DriverError>;

    /// Commit an operating region
    async fn set_region(&self, region: Region) -> Result<(), DriverError>;

    /// Regions this device is certified for
    async fn supported_regions(&self) -> Result<Vec<Region>, DriverError>;

    /// Maximum RF power in centi-dBm, None for models without a UHF radio
    async fn max_power_cdbm(&self) -> Result<Option<u16>, DriverError>;

    /// Apply session-scoped radio parameters
    async fn set_radio_config(&self, config: &RadioConfig) -> Result<(), DriverError>;

    /// Replace the active read plan wholesale
    async fn set_read_plan(&self, plan: &ReadPlan) -> Result<(), DriverError>;

    /// Search for tags under the active plan for up to `timeout`
    async fn read(&self, timeout: Duration) -> Result<Vec<TagReadRecord>, DriverError>;

    /// Execute a one-shot operation against a single addressed tag
    async fn execute_op(
        &self,
        op: &TagOp,
        filter: Option<&TagFilter>,
    ) -> Result<Vec<TagReadRecord>, DriverError>;

    /// Request statistics categories for subsequent reads
    async fn enable_stats(&self, flags: StatsFlags) -> Result<(), DriverError>;

    /// Categories the device actually has enabled (a superset of the
    /// request; see [`StatsFlags::ALWAYS_ON`])
    async fn enabled_stats(&self) -> Result<StatsFlags, DriverError>;

    /// Fetch the statistics snapshot
    async fn stats(&self) -> Result<ReaderStats, DriverError>;

    /// Per-antenna return loss in centi-dB; outside the stats snapshot
    /// and unsupported on the contactless-card family
    async fn antenna_return_loss(&self) -> Result<Vec<(u16, i16)>, DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        assert!(DriverError::Timeout.is_timeout());
        assert!(!DriverError::NotConnected.is_timeout());
        assert!(!DriverError::TagOpFailed { code: 0x0424 }.is_timeout());
    }

    #[test]
    fn test_fault_display_names_the_fault() {
        let err = DriverError::TagOpFailed { code: 0x0424 };
        let text = err.to_string();
        assert!(text.contains("0x0424"));
        assert!(text.contains("Gen2 memory locked"));
    }

    #[test]
    fn test_probe_capability() {
        assert!(TransportKind::Serial.is_probe_capable());
        assert!(!TransportKind::Network.is_probe_capable());
    }

    #[test]
    fn test_default_connect_options() {
        let opts = ConnectOptions::default();
        assert_eq!(opts.baud_rate, DEFAULT_BAUD_RATE);
    }
}
