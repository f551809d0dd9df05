//! Tag operations
//!
//! A tag operation runs against exactly one addressed tag, either
//! standalone through the operation executor or embedded in a read plan
//! (in which case its result rides along in each tag read record).

use crate::filter::TagFilter;
use crate::types::Gen2Bank;

/// QT payload bits: the state being written to (or read from) the tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QtPayload {
    /// True exposes the public memory map, false the private one
    pub public_map: bool,
    /// True reduces backscatter range
    pub short_range: bool,
}

/// QT control bits: how the payload is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QtControl {
    /// True writes the payload, false only reads the current QT state
    pub read_write: bool,
    /// True persists the change across tag power-cycles
    pub persistence: bool,
}

/// One-shot operation against a single addressed tag
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagOp {
    /// Read `word_count` words from `bank` starting at `word_address`
    ///
    /// A `word_count` of zero asks for the bank's full variable-length
    /// content; readers honor that for identifier banks only, elsewhere
    /// the result is model-dependent and treated as opaque.
    ReadData {
        /// Bank to read
        bank: Gen2Bank,
        /// Word (16-bit) offset into the bank
        word_address: u32,
        /// Number of words to read, 0 = full bank where supported
        word_count: u8,
    },

    /// Apply a Select filter as a standalone operation
    Select {
        /// Filter to apply
        filter: TagFilter,
    },

    /// QT mode transition (vendor feature on Monza-class tags)
    ///
    /// Gated by the tag's access password (0 = none). Password
    /// correctness is never checked locally; a wrong password comes back
    /// as a device fault.
    QtReadWrite {
        /// Tag access password, 0 when the tag has none
        access_password: u32,
        /// Target QT state
        payload: QtPayload,
        /// Write/read and persistence control
        control: QtControl,
    },
}

/// Device fault codes surfaced by tag operations
///
/// These are the two-byte big-endian codes the reader embeds in failed
/// operation results.
pub mod fault {
    /// No tags matched the operation's filter
    pub const NO_TAGS_FOUND: u16 = 0x0400;
    /// Protocol completed but returned no data
    pub const NO_DATA_READ: u16 = 0x0402;
    /// Unclassified tag error
    pub const GENERAL_TAG_ERROR: u16 = 0x0408;
    /// Gen2 error outside the specific classes below
    pub const GEN2_OTHER_ERROR: u16 = 0x0420;
    /// Read or write past the end of a bank
    pub const GEN2_MEMORY_OVERRUN: u16 = 0x0423;
    /// Bank locked against this access (bad or missing access password)
    pub const GEN2_MEMORY_LOCKED: u16 = 0x0424;
    /// Tag had insufficient power for the operation
    pub const GEN2_INSUFFICIENT_POWER: u16 = 0x0425;
    /// Tag reported an unspecific Gen2 failure
    pub const GEN2_NONSPECIFIC: u16 = 0x0426;
}

/// Human-readable message for a device fault code
pub fn fault_message(code: u16) -> &'static str {
    match code {
        fault::NO_TAGS_FOUND => "no tags found",
        fault::NO_DATA_READ => "protocol returned no data",
        fault::GENERAL_TAG_ERROR => "general tag error",
        fault::GEN2_OTHER_ERROR => "Gen2 protocol error",
        fault::GEN2_MEMORY_OVERRUN => "Gen2 memory overrun or bad PC",
        fault::GEN2_MEMORY_LOCKED => "Gen2 memory locked",
        fault::GEN2_INSUFFICIENT_POWER => "Gen2 tag had insufficient power",
        fault::GEN2_NONSPECIFIC => "Gen2 nonspecific tag error",
        _ => "unrecognized device fault",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_messages() {
        assert_eq!(fault_message(fault::NO_TAGS_FOUND), "no tags found");
        assert_eq!(fault_message(fault::GEN2_MEMORY_LOCKED), "Gen2 memory locked");
        assert_eq!(fault_message(0xBEEF), "unrecognized device fault");
    }

    #[test]
    fn test_qt_defaults_are_private_long_range() {
        let payload = QtPayload::default();
        assert!(!payload.public_map);
        assert!(!payload.short_range);

        let control = QtControl::default();
        assert!(!control.read_write);
        assert!(!control.persistence);
    }
}
