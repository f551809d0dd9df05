//! Shared air-interface types
//!
//! The enums here mirror what reader firmware exposes through its
//! parameter surface: air protocols, regulatory regions, and the Gen2
//! bank/session values used by filters and tag operations.

use std::fmt::Write as _;

use thiserror::Error;

/// Air protocol a read plan searches under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagProtocol {
    /// Gen2 UHF long-range tags
    Gen2,
    /// ISO 14443A contactless cards
    Iso14443A,
    /// ISO 15693 vicinity cards
    Iso15693,
}

impl TagProtocol {
    /// Returns a human-readable name for the protocol
    pub fn name(&self) -> &'static str {
        match self {
            TagProtocol::Gen2 => "GEN2",
            TagProtocol::Iso14443A => "ISO14443A",
            TagProtocol::Iso15693 => "ISO15693",
        }
    }
}

/// Regulatory operating region
///
/// A freshly provisioned reader reports [`Region::Unspecified`] until a
/// region has been committed; no RF operation is permitted in that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Region {
    /// No region configured (sentinel, never a valid operating region)
    Unspecified,
    /// North America
    Na,
    /// European Union
    Eu,
    /// Korea
    Kr,
    /// India
    In,
    /// Japan
    Jp,
    /// People's Republic of China
    Prc,
    /// Australia
    Au,
    /// New Zealand
    Nz,
    /// Unrestricted (test/open region)
    Open,
}

impl Region {
    /// Returns a human-readable name for the region
    pub fn name(&self) -> &'static str {
        match self {
            Region::Unspecified => "UNSPEC",
            Region::Na => "NA",
            Region::Eu => "EU",
            Region::Kr => "KR",
            Region::In => "IN",
            Region::Jp => "JP",
            Region::Prc => "PRC",
            Region::Au => "AU",
            Region::Nz => "NZ",
            Region::Open => "OPEN",
        }
    }
}

/// Gen2 tag memory bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gen2Bank {
    /// Reserved bank (kill/access passwords)
    Reserved,
    /// EPC bank
    Epc,
    /// TID bank (tag identifier, factory programmed)
    Tid,
    /// User memory bank
    User,
}

impl Gen2Bank {
    /// Bank number as sent over the air interface
    pub fn number(&self) -> u8 {
        match self {
            Gen2Bank::Reserved => 0,
            Gen2Bank::Epc => 1,
            Gen2Bank::Tid => 2,
            Gen2Bank::User => 3,
        }
    }
}

/// Gen2 inventory session flag (S0-S3)
///
/// Controls which tags respond to an inventory round. Distinct from the
/// device connection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gen2Session {
    /// Session 0 (tags respond to every round)
    #[default]
    S0,
    /// Session 1
    S1,
    /// Session 2 (tags stay quiet after being read)
    S2,
    /// Session 3
    S3,
}

/// Error from [`parse_hex`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HexError {
    /// Hex strings encode whole bytes, two digits each
    #[error("hex string has odd length {0}")]
    OddLength(usize),

    /// Character outside [0-9a-fA-F]
    #[error("invalid hex digit '{0}'")]
    InvalidDigit(char),
}

/// Format bytes as uppercase hex, the conventional EPC rendering
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02X}", b);
    }
    out
}

/// Parse an unseparated hex string into bytes
pub fn parse_hex(s: &str) -> Result<Vec<u8>, HexError> {
    if s.len() % 2 != 0 {
        return Err(HexError::OddLength(s.len()));
    }

    let mut out = Vec::with_capacity(s.len() / 2);
    for pair in s.as_bytes().chunks(2) {
        let hi = hex_digit(pair[0])?;
        let lo = hex_digit(pair[1])?;
        out.push(hi << 4 | lo);
    }
    Ok(out)
}

fn hex_digit(c: u8) -> Result<u8, HexError> {
    (c as char)
        .to_digit(16)
        .map(|d| d as u8)
        .ok_or(HexError::InvalidDigit(c as char))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bytes_to_hex() {
        assert_eq!(bytes_to_hex(&[0xE2, 0x80, 0x11, 0x05]), "E2801105");
        assert_eq!(bytes_to_hex(&[]), "");
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("E2801105").unwrap(), vec![0xE2, 0x80, 0x11, 0x05]);
        assert_eq!(parse_hex("e2801105").unwrap(), vec![0xE2, 0x80, 0x11, 0x05]);
    }

    #[test]
    fn test_parse_hex_odd_length() {
        assert_eq!(parse_hex("E28").unwrap_err(), HexError::OddLength(3));
    }

    #[test]
    fn test_parse_hex_invalid_digit() {
        assert_eq!(parse_hex("E2G1").unwrap_err(), HexError::InvalidDigit('G'));
    }

    #[test]
    fn test_bank_numbers() {
        assert_eq!(Gen2Bank::Reserved.number(), 0);
        assert_eq!(Gen2Bank::Epc.number(), 1);
        assert_eq!(Gen2Bank::Tid.number(), 2);
        assert_eq!(Gen2Bank::User.number(), 3);
    }

    proptest! {
        #[test]
        fn hex_roundtrip(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let hex = bytes_to_hex(&bytes);
            prop_assert_eq!(parse_hex(&hex).unwrap(), bytes);
        }
    }
}
