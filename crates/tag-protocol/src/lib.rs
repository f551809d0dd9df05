//! RFID Tag Data Model Library
//!
//! This crate provides the shared data model for orchestrating RFID
//! reader sessions:
//!
//! - **Air-interface types**: protocols, regulatory regions, Gen2 banks
//!   and inventory sessions
//! - **Read plans**: immutable descriptions of one read invocation
//!   (antennas, protocol, filter, embedded operation, timeout)
//! - **Tag operations**: a closed sum type over memory-bank reads,
//!   select-filter application, and QT mode transitions
//! - **Tag read records**: one observation per tag, including embedded
//!   operation results and device fault codes
//! - **Reader statistics**: the telemetry snapshot a reader reports
//!   after a read cycle
//! - **The driver contract**: the [`ReaderDriver`] trait every transport
//!   implementation (hardware or simulated) provides
//!
//! # Example
//!
//! ```rust
//! use tag_protocol::{Gen2Bank, ReadPlan, TagFilter, TagOp, TagProtocol};
//!
//! let filter = TagFilter::select(false, Gen2Bank::Tid, 0, 32, vec![0xE2, 0x80, 0x11, 0x05]);
//! let plan = ReadPlan::new(vec![1, 2], TagProtocol::Gen2)
//!     .with_filter(filter)
//!     .with_op(TagOp::ReadData {
//!         bank: Gen2Bank::Tid,
//!         word_address: 0,
//!         word_count: 0,
//!     });
//!
//! assert_eq!(plan.antennas(), [1, 2]);
//! ```

pub mod driver;
pub mod filter;
pub mod models;
pub mod op;
pub mod plan;
pub mod record;
pub mod stats;
pub mod types;

pub use driver::{
    ConnectOptions, Direction, DriverError, RadioConfig, ReaderDriver, TransportFrame,
    TransportKind, TransportTap, DEFAULT_BAUD_RATE,
};
pub use filter::TagFilter;
pub use models::{ReaderCapabilities, ReaderFamily, ReaderModel, ReaderModelDb};
pub use op::{fault_message, QtControl, QtPayload, TagOp};
pub use plan::ReadPlan;
pub use record::{EmbeddedResult, TagReadRecord, EMBEDDED_ERROR_FLAG};
pub use stats::{ReaderStats, StatsFlags};
pub use types::{bytes_to_hex, parse_hex, Gen2Bank, Gen2Session, HexError, Region, TagProtocol};
