//! Tag read records
//!
//! One record per tag observation, immutable once produced. Embedded
//! operation results (data or a device fault) ride along with the
//! record; a fault never aborts the rest of the batch it arrived in.

use crate::op::fault_message;
use crate::types::{bytes_to_hex, TagProtocol};

/// Wire flag marking an embedded-operation result as a fault word
///
/// Readers report embedded results with a bit length; this value in the
/// length field means "the payload is a big-endian u16 fault code".
pub const EMBEDDED_ERROR_FLAG: u16 = 0x8000;

/// Result of an embedded tag operation, decoded from the wire
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmbeddedResult {
    /// No operation was embedded, or it produced nothing
    #[default]
    None,
    /// Operation data payload
    Data(Vec<u8>),
    /// Device fault code (big-endian u16 on the wire)
    Error(u16),
}

impl EmbeddedResult {
    /// Decode an embedded result from its wire form: a bit length and
    /// the raw payload bytes
    pub fn from_wire(bit_length: u16, payload: &[u8]) -> Self {
        if bit_length == EMBEDDED_ERROR_FLAG {
            let code = match payload {
                [hi, lo, ..] => u16::from_be_bytes([*hi, *lo]),
                _ => 0,
            };
            EmbeddedResult::Error(code)
        } else if bit_length == 0 {
            EmbeddedResult::None
        } else {
            let byte_len = usize::from(bit_length / 8).min(payload.len());
            EmbeddedResult::Data(payload[..byte_len].to_vec())
        }
    }

    /// True when this result carries a device fault
    pub fn is_error(&self) -> bool {
        matches!(self, EmbeddedResult::Error(_))
    }
}

/// One tag observation
#[derive(Debug, Clone, PartialEq)]
pub struct TagReadRecord {
    /// EPC bytes identifying the tag
    pub epc: Vec<u8>,
    /// Protocol the tag was read under
    pub protocol: TagProtocol,
    /// Antenna index the observation arrived on
    pub antenna: u16,
    /// Received signal strength in dBm
    pub rssi_dbm: i32,
    /// Gen2 backscatter phase (raw units)
    pub phase: u32,
    /// Carrier frequency during the read, in kHz
    pub frequency_khz: u32,
    /// How many times the tag was seen in this search cycle
    pub read_count: u32,
    /// Observation timestamp, milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    /// Embedded operation result, if the active plan carried one
    pub data: EmbeddedResult,
}

impl TagReadRecord {
    /// EPC rendered as uppercase hex
    pub fn epc_hex(&self) -> String {
        bytes_to_hex(&self.epc)
    }

    /// True when the embedded-operation slot carries a device fault
    pub fn is_error_data(&self) -> bool {
        self.data.is_error()
    }

    /// One-line rendering of the record for sample output
    pub fn summary(&self) -> String {
        let mut line = format!(
            "EPC:{} ant:{} readCount:{} rssi:{}",
            self.epc_hex(),
            self.antenna,
            self.read_count,
            self.rssi_dbm
        );
        match &self.data {
            EmbeddedResult::None => {}
            EmbeddedResult::Data(bytes) => {
                line.push_str(&format!(" data({}): {}", bytes.len(), bytes_to_hex(bytes)));
            }
            EmbeddedResult::Error(code) => {
                line.push_str(&format!(
                    " embedded op failed: 0x{:04X} ({})",
                    code,
                    fault_message(*code)
                ));
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::fault;

    fn record(data: EmbeddedResult) -> TagReadRecord {
        TagReadRecord {
            epc: vec![0x30, 0x00, 0x11, 0x22],
            protocol: TagProtocol::Gen2,
            antenna: 1,
            rssi_dbm: -52,
            phase: 0,
            frequency_khz: 915_250,
            read_count: 1,
            timestamp_ms: 0,
            data,
        }
    }

    #[test]
    fn test_from_wire_data() {
        let result = EmbeddedResult::from_wire(32, &[0xE2, 0x80, 0x11, 0x05]);
        assert_eq!(result, EmbeddedResult::Data(vec![0xE2, 0x80, 0x11, 0x05]));
    }

    #[test]
    fn test_from_wire_error_is_big_endian() {
        let result = EmbeddedResult::from_wire(EMBEDDED_ERROR_FLAG, &[0x04, 0x24]);
        assert_eq!(result, EmbeddedResult::Error(fault::GEN2_MEMORY_LOCKED));
    }

    #[test]
    fn test_from_wire_empty() {
        assert_eq!(EmbeddedResult::from_wire(0, &[]), EmbeddedResult::None);
    }

    #[test]
    fn test_error_summary_decodes_fault() {
        let rec = record(EmbeddedResult::Error(fault::GEN2_MEMORY_LOCKED));
        assert!(rec.is_error_data());
        let summary = rec.summary();
        assert!(summary.contains("0x0424"));
        assert!(summary.contains("Gen2 memory locked"));
    }

    #[test]
    fn test_data_summary() {
        let rec = record(EmbeddedResult::Data(vec![0xAB, 0xCD]));
        assert!(!rec.is_error_data());
        assert!(rec.summary().contains("data(2): ABCD"));
    }

    #[test]
    fn test_epc_hex() {
        let rec = record(EmbeddedResult::None);
        assert_eq!(rec.epc_hex(), "30001122");
    }
}
