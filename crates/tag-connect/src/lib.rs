//! Reader Endpoint Library
//!
//! This crate provides reader endpoint addressing and link-rate
//! discovery for serial-attached RFID modules:
//!
//! - [`ReaderUri`] parses the scheme-qualified endpoint addresses the
//!   sample clients accept
//! - [`probe_baud_rate`] walks the candidate serial rates after a
//!   timed-out connect
//! - [`PortScanner`] enumerates serial ports for diagnostics
//!
//! # Example
//!
//! ```rust
//! use tag_connect::{ReaderUri, UriScheme};
//!
//! let uri = ReaderUri::parse("tmr:///dev/ttyUSB0").unwrap();
//! assert_eq!(uri.scheme(), UriScheme::Serial);
//! assert_eq!(uri.target(), "/dev/ttyUSB0");
//! ```

pub mod error;
pub mod probe;
pub mod scanner;
pub mod uri;

pub use error::ConnectError;
pub use probe::{probe_baud_rate, PROBE_BAUD_RATES};
pub use scanner::{PortScanner, SerialPortInfo};
pub use uri::{ReaderUri, UriScheme};
