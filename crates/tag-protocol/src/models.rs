//! Reader model database
//!
//! Model-specific behavior is resolved once from the device's reported
//! model name into a capability record, instead of scattering model
//! string comparisons through the orchestration code.

use crate::types::TagProtocol;

/// Device family, the coarse capability split between reader classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReaderFamily {
    /// UHF readers searching long-range Gen2 tags
    LongRangeUhf,
    /// HF/LF readers searching contactless cards
    ContactlessHfLf,
}

/// Capabilities of a specific reader model (static version for database)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderCapabilitiesStatic {
    /// Device family
    pub family: ReaderFamily,
    /// Number of antenna ports on the module
    pub max_antennas: u8,
    /// Whether the per-antenna return-loss query is available
    pub supports_return_loss: bool,
    /// Whether a zero-length identifier-bank read returns the full bank
    pub supports_full_bank_read: bool,
    /// Maximum RF power in centi-dBm, None for models without a UHF radio
    pub max_power_cdbm: Option<u16>,
}

/// Capabilities of a specific reader model (owned version)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReaderCapabilities {
    /// Device family
    pub family: ReaderFamily,
    /// Number of antenna ports on the module
    pub max_antennas: u8,
    /// Whether the per-antenna return-loss query is available
    pub supports_return_loss: bool,
    /// Whether a zero-length identifier-bank read returns the full bank
    pub supports_full_bank_read: bool,
    /// Maximum RF power in centi-dBm, None for models without a UHF radio
    pub max_power_cdbm: Option<u16>,
}

impl From<ReaderCapabilitiesStatic> for ReaderCapabilities {
    fn from(s: ReaderCapabilitiesStatic) -> Self {
        Self {
            family: s.family,
            max_antennas: s.max_antennas,
            supports_return_loss: s.supports_return_loss,
            supports_full_bank_read: s.supports_full_bank_read,
            max_power_cdbm: s.max_power_cdbm,
        }
    }
}

/// Information about a specific reader model (static version)
#[derive(Debug, Clone, Copy)]
pub struct ReaderModelStatic {
    /// Manufacturer name
    pub manufacturer: &'static str,
    /// Model name as reported by the firmware
    pub model: &'static str,
    /// Protocol this model searches by default
    pub default_protocol: TagProtocol,
    /// Model capabilities
    pub capabilities: ReaderCapabilitiesStatic,
}

/// Information about a specific reader model (owned version)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReaderModel {
    /// Manufacturer name
    pub manufacturer: String,
    /// Model name as reported by the firmware
    pub model: String,
    /// Protocol this model searches by default
    pub default_protocol: TagProtocol,
    /// Model capabilities
    pub capabilities: ReaderCapabilities,
}

impl From<&ReaderModelStatic> for ReaderModel {
    fn from(s: &ReaderModelStatic) -> Self {
        Self {
            manufacturer: s.manufacturer.to_string(),
            model: s.model.to_string(),
            default_protocol: s.default_protocol,
            capabilities: s.capabilities.into(),
        }
    }
}

impl ReaderModel {
    /// Shorthand for the family capability
    pub fn family(&self) -> ReaderFamily {
        self.capabilities.family
    }
}

/// Database of known reader models
pub struct ReaderModelDb;

impl ReaderModelDb {
    /// Look up a reader model by its firmware-reported name
    /// (case-insensitive, as firmware casing varies between releases)
    pub fn by_name(name: &str) -> Option<ReaderModel> {
        READER_MODELS
            .iter()
            .find(|m| m.model.eq_ignore_ascii_case(name))
            .map(ReaderModel::from)
    }

    /// Get all known reader models
    pub fn models() -> impl Iterator<Item = ReaderModel> {
        READER_MODELS.iter().map(ReaderModel::from)
    }

    /// Get all models in a given family
    pub fn models_for_family(family: ReaderFamily) -> Vec<ReaderModel> {
        Self::models()
            .filter(|m| m.capabilities.family == family)
            .collect()
    }
}

// Capability profiles shared across the UHF module line
const CAPS_UHF_4PORT: ReaderCapabilitiesStatic = ReaderCapabilitiesStatic {
    family: ReaderFamily::LongRangeUhf,
    max_antennas: 4,
    supports_return_loss: true,
    supports_full_bank_read: true,
    max_power_cdbm: Some(3150),
};

const CAPS_UHF_2PORT: ReaderCapabilitiesStatic = ReaderCapabilitiesStatic {
    family: ReaderFamily::LongRangeUhf,
    max_antennas: 2,
    supports_return_loss: true,
    supports_full_bank_read: true,
    max_power_cdbm: Some(3000),
};

static READER_MODELS: &[ReaderModelStatic] = &[
    ReaderModelStatic {
        manufacturer: "ThingMagic",
        model: "M6e",
        default_protocol: TagProtocol::Gen2,
        capabilities: CAPS_UHF_4PORT,
    },
    ReaderModelStatic {
        manufacturer: "ThingMagic",
        model: "M6e Micro",
        default_protocol: TagProtocol::Gen2,
        capabilities: CAPS_UHF_2PORT,
    },
    ReaderModelStatic {
        manufacturer: "ThingMagic",
        model: "M6e Nano",
        default_protocol: TagProtocol::Gen2,
        capabilities: ReaderCapabilitiesStatic {
            family: ReaderFamily::LongRangeUhf,
            max_antennas: 1,
            supports_return_loss: true,
            // Single-port economy module: zero-length bank reads are not
            // expanded, callers must size TID reads explicitly
            supports_full_bank_read: false,
            max_power_cdbm: Some(2700),
        },
    },
    ReaderModelStatic {
        manufacturer: "ThingMagic",
        model: "Sargas",
        default_protocol: TagProtocol::Gen2,
        capabilities: CAPS_UHF_2PORT,
    },
    ReaderModelStatic {
        manufacturer: "ThingMagic",
        model: "Izar",
        default_protocol: TagProtocol::Gen2,
        capabilities: CAPS_UHF_4PORT,
    },
    ReaderModelStatic {
        manufacturer: "ThingMagic",
        model: "Astra-EX",
        default_protocol: TagProtocol::Gen2,
        capabilities: CAPS_UHF_4PORT,
    },
    ReaderModelStatic {
        manufacturer: "ThingMagic",
        model: "M3e",
        default_protocol: TagProtocol::Iso14443A,
        capabilities: ReaderCapabilitiesStatic {
            family: ReaderFamily::ContactlessHfLf,
            max_antennas: 1,
            // HF/LF module: no UHF radio, no return-loss table
            supports_return_loss: false,
            supports_full_bank_read: false,
            max_power_cdbm: None,
        },
    },
];
