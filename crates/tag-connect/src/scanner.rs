//! Serial port scanner
//!
//! This module provides serial port enumeration, used by the sample
//! clients to suggest candidate ports when a serial endpoint fails to
//! open.

use serialport::{available_ports, SerialPortType};
use tracing::info;

use crate::error::ConnectError;

/// Information about a serial port
#[derive(Debug, Clone)]
pub struct SerialPortInfo {
    /// Port name (e.g., /dev/ttyUSB0, COM3)
    pub port: String,
    /// USB Vendor ID (if USB)
    pub vid: Option<u16>,
    /// USB Product ID (if USB)
    pub pid: Option<u16>,
    /// USB product string
    pub product: Option<String>,
}

impl SerialPortInfo {
    /// Create from serialport crate's port info
    fn from_serialport(name: String, port_type: &SerialPortType) -> Self {
        match port_type {
            SerialPortType::UsbPort(usb) => Self {
                port: name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                product: usb.product.clone(),
            },
            _ => Self {
                port: name,
                vid: None,
                pid: None,
                product: None,
            },
        }
    }
}

/// Serial port scanner
pub struct PortScanner {
    skip_patterns: Vec<String>,
}

impl PortScanner {
    /// Create a new scanner with default configuration
    pub fn new() -> Self {
        Self {
            skip_patterns: vec![
                // Bluetooth ports on macOS
                "Bluetooth".to_string(),
                // Debug/logging ports
                "debug".to_string(),
            ],
        }
    }

    /// Enumerate all available serial ports
    pub fn enumerate_ports(&self) -> Result<Vec<SerialPortInfo>, ConnectError> {
        let ports = available_ports().map_err(|e| ConnectError::EnumerationFailed(e.to_string()))?;

        let result: Vec<_> = ports
            .into_iter()
            .map(|p| SerialPortInfo::from_serialport(p.port_name, &p.port_type))
            .filter(|p| !self.should_skip_port(p))
            .collect();

        info!("found {} serial port(s)", result.len());
        Ok(result)
    }

    fn should_skip_port(&self, port: &SerialPortInfo) -> bool {
        self.skip_patterns.iter().any(|p| port.port.contains(p))
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}
