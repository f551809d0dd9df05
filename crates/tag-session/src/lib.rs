//! RFID Reader Session Orchestration
//!
//! This crate owns the recurring sequence every reader client runs:
//! establish a connection under uncertain link parameters, resolve an
//! operating region, apply a read plan, execute synchronous or
//! background tag reads, run single-tag operations, and collect device
//! statistics - all against one shared [`ReaderSession`].
//!
//! # Architecture
//!
//! The session wraps an `Arc<dyn ReaderDriver>` and serializes every
//! session-mutating call on the one controlling task. Background reading
//! is a single spawned task feeding a bounded channel; stopping closes
//! the channel and joins the task, so no delivery can leak into a later
//! operation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tag_protocol::{ReadPlan, TagProtocol};
//! use tag_session::{ReaderSession, SessionOptions};
//! use tag_sim::SimReader;
//!
//! # async fn run() -> Result<(), tag_session::SessionError> {
//! let driver = Arc::new(SimReader::new(Default::default()).unwrap());
//! let mut session = ReaderSession::connect(driver, SessionOptions::default()).await?;
//! session.ensure_region().await?;
//! session.apply_plan(&ReadPlan::new(vec![1], TagProtocol::Gen2)).await?;
//!
//! let records = session.read_for(std::time::Duration::from_millis(500)).await?;
//! println!("{} tag(s)", records.len());
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod ops;
pub mod runner;
pub mod session;
pub mod stats;
pub mod track;

pub use error::{ConnectionError, OperationError, RegionError, SessionError, StatsError};
pub use runner::{ReadState, ReadStream};
pub use session::{ReaderSession, SessionOptions};
pub use track::TagTracker;
