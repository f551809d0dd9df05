//! Simulated tags
//!
//! Each simulated tag carries the four Gen2 memory banks, an access
//! password, and QT state. Bank visibility follows the QT rule the
//! orchestration cares about: the serialized TID is only exposed while
//! the tag presents its private memory map.

use serde::{Deserialize, Serialize};
use tag_protocol::{Gen2Bank, QtPayload, TagFilter};

/// One simulated tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimTag {
    /// EPC bank content (the tag identity)
    pub epc: Vec<u8>,
    /// TID bank content
    pub tid: Vec<u8>,
    /// User memory bank content
    pub user: Vec<u8>,
    /// Access password, 0 = none
    pub access_password: u32,
    /// Current QT state
    pub qt: QtPayload,
}

impl SimTag {
    /// Create a tag with the given EPC and a derived Monza-class TID
    pub fn new(epc: Vec<u8>) -> Self {
        // Class/vendor TID header, then a serial taken from the EPC tail
        let mut tid = vec![0xE2, 0x80, 0x11, 0x05, 0x20, 0x01, 0xB0, 0x00];
        let tail = epc.len().saturating_sub(4);
        tid.extend_from_slice(&epc[tail..]);

        Self {
            epc,
            tid,
            user: Vec::new(),
            access_password: 0,
            qt: QtPayload::default(),
        }
    }

    /// Create the `index`-th tag of a generated population
    pub fn numbered(index: u8) -> Self {
        Self::new(vec![
            0x30, 0x08, 0x33, 0xB2, 0xDD, 0xD9, 0x01, 0x40, 0x00, 0x00, 0x00, index,
        ])
    }

    /// Set the access password
    pub fn with_access_password(mut self, password: u32) -> Self {
        self.access_password = password;
        self
    }

    /// Set the user memory content
    pub fn with_user_data(mut self, data: Vec<u8>) -> Self {
        self.user = data;
        self
    }

    /// Set the QT state
    pub fn with_qt(mut self, qt: QtPayload) -> Self {
        self.qt = qt;
        self
    }

    /// Raw content of one memory bank
    pub fn bank_data(&self, bank: Gen2Bank) -> Vec<u8> {
        match bank {
            Gen2Bank::Reserved => {
                let mut data = vec![0, 0, 0, 0];
                data.extend_from_slice(&self.access_password.to_be_bytes());
                data
            }
            Gen2Bank::Epc => self.epc.clone(),
            Gen2Bank::Tid => self.tid.clone(),
            Gen2Bank::User => self.user.clone(),
        }
    }

    /// Bank content as currently exposed over the air
    ///
    /// The serialized TID is hidden while the public memory map is
    /// selected; everything else is always visible.
    pub fn visible_bank(&self, bank: Gen2Bank) -> Option<Vec<u8>> {
        if bank == Gen2Bank::Tid && self.qt.public_map {
            return None;
        }
        Some(self.bank_data(bank))
    }

    /// Evaluate a filter against this tag's visible memory
    pub fn matches(&self, filter: &TagFilter) -> bool {
        filter.matches(&self.visible_bank(filter.bank).unwrap_or_default())
    }

    /// Current QT state as the 16-bit word reported to a QT read
    pub fn qt_word(&self) -> u16 {
        (u16::from(self.qt.public_map) << 15) | (u16::from(self.qt.short_range) << 14)
    }
}
