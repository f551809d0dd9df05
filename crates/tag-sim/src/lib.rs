//! RFID Reader Simulation Library
//!
//! This crate provides a simulated reader for exercising session
//! orchestration without physical hardware. It includes:
//!
//! - **SimReader**: a full [`tag_protocol::ReaderDriver`] implementation
//!   with a configurable tag population, link-rate emulation (opening at
//!   the wrong serial rate times out, as a real module would), and
//!   synthetic transport frames for the diagnostics tap
//! - **SimTag**: one simulated tag with memory banks, an access
//!   password, and QT state
//!
//! # Example
//!
//! ```rust
//! use tag_connect::ReaderUri;
//! use tag_sim::SimReader;
//!
//! let uri = ReaderUri::parse("sim://m6e?tags=4").unwrap();
//! let reader = SimReader::from_uri(&uri).unwrap();
//! assert_eq!(reader.tags().len(), 4);
//! ```

pub mod reader;
pub mod tag;

pub use reader::{SimReader, SimReaderConfig, SimUriError};
pub use tag::SimTag;
