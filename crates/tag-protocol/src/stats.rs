//! Reader statistics
//!
//! The telemetry snapshot a reader reports after a read cycle. Any field
//! the device or model does not report is left at its absent sentinel
//! (zero/empty/None); absence is never an error, and rendering omits
//! absent fields instead of printing literal zeros.

use std::fmt::Write as _;
use std::ops::{BitOr, BitOrAssign};

use crate::types::TagProtocol;

/// Statistics categories a caller can request before a read
///
/// Readers force [`StatsFlags::TEMPERATURE`] and
/// [`StatsFlags::CONNECTED_ANTENNA_PORTS`] on regardless of the request,
/// so the enabled set read back from the device is a superset of what
/// was asked for. Comparing the two is a diagnostic, not a feature
/// check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatsFlags(u16);

impl StatsFlags {
    /// Request nothing
    pub const NONE: StatsFlags = StatsFlags(0);
    /// Per-antenna RF-on time
    pub const RF_ON_TIME: StatsFlags = StatsFlags(1 << 0);
    /// Per-antenna noise floor with TX on
    pub const NOISE_FLOOR_TX_ON: StatsFlags = StatsFlags(1 << 1);
    /// Current carrier frequency
    pub const FREQUENCY: StatsFlags = StatsFlags(1 << 2);
    /// Module temperature (always returned by the device)
    pub const TEMPERATURE: StatsFlags = StatsFlags(1 << 3);
    /// Current antenna port
    pub const ANTENNA: StatsFlags = StatsFlags(1 << 4);
    /// Current air protocol
    pub const PROTOCOL: StatsFlags = StatsFlags(1 << 5);
    /// Per-antenna connection status (always returned by the device)
    pub const CONNECTED_ANTENNA_PORTS: StatsFlags = StatsFlags(1 << 6);
    /// Every category
    pub const ALL: StatsFlags = StatsFlags(0x007F);

    /// Categories the device includes whether or not they were requested
    pub const ALWAYS_ON: StatsFlags =
        StatsFlags(Self::TEMPERATURE.0 | Self::CONNECTED_ANTENNA_PORTS.0);

    /// Raw bit representation
    pub fn bits(self) -> u16 {
        self.0
    }

    /// True when every category in `other` is present in `self`
    pub fn contains(self, other: StatsFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when no category is set
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for StatsFlags {
    type Output = StatsFlags;

    fn bitor(self, rhs: StatsFlags) -> StatsFlags {
        StatsFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for StatsFlags {
    fn bitor_assign(&mut self, rhs: StatsFlags) {
        self.0 |= rhs.0;
    }
}

/// Snapshot of reader telemetry after a read cycle
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReaderStats {
    /// (antenna, connected) pairs; empty when not reported
    pub connected_antennas: Vec<(u16, bool)>,
    /// (antenna, dB) noise floor with TX on; empty when not reported
    pub noise_floor_tx_on: Vec<(u16, i8)>,
    /// (antenna, milliseconds) RF-on time; empty when not reported
    pub rf_on_time: Vec<(u16, u32)>,
    /// Carrier frequency in kHz, 0 when not reported
    pub frequency_khz: u32,
    /// Module temperature in degrees C, 0 when not reported
    pub temperature_c: i8,
    /// Protocol of the last search, None when not reported
    pub protocol: Option<TagProtocol>,
    /// Current antenna port, 0 when not reported
    pub antenna: u16,
}

impl ReaderStats {
    /// Multi-line rendering that omits absent fields entirely
    pub fn render(&self) -> String {
        let mut out = String::new();

        if !self.connected_antennas.is_empty() {
            out.push_str("Antenna connection status\n");
            for (antenna, connected) in &self.connected_antennas {
                let status = if *connected { "Connected" } else { "Disconnected" };
                let _ = writeln!(out, "  Antenna {} | {}", antenna, status);
            }
        }

        for (antenna, db) in &self.noise_floor_tx_on {
            let _ = writeln!(out, "Noise floor (TX on) for antenna [{}]: {} dB", antenna, db);
        }

        for (antenna, ms) in &self.rf_on_time {
            let _ = writeln!(out, "RF on-time for antenna [{}]: {} ms", antenna, ms);
        }

        if self.frequency_khz != 0 {
            let _ = writeln!(out, "Frequency   : {} kHz", self.frequency_khz);
        }
        if self.temperature_c != 0 {
            let _ = writeln!(out, "Temperature : {} C", self.temperature_c);
        }
        if let Some(protocol) = self.protocol {
            let _ = writeln!(out, "Protocol    : {}", protocol.name());
        }
        if self.antenna != 0 {
            let _ = writeln!(out, "Current antenna port : {}", self.antenna);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_algebra() {
        let flags = StatsFlags::TEMPERATURE | StatsFlags::FREQUENCY;
        assert!(flags.contains(StatsFlags::TEMPERATURE));
        assert!(!flags.contains(StatsFlags::RF_ON_TIME));
        assert!(StatsFlags::ALL.contains(flags));
        assert!(StatsFlags::ALL.contains(StatsFlags::ALWAYS_ON));
        assert!(StatsFlags::NONE.is_empty());
    }

    #[test]
    fn test_render_omits_absent_fields() {
        let stats = ReaderStats {
            temperature_c: 0,
            frequency_khz: 0,
            ..Default::default()
        };
        let rendered = stats.render();
        assert!(rendered.is_empty());
    }

    #[test]
    fn test_render_present_fields() {
        let stats = ReaderStats {
            connected_antennas: vec![(1, true), (2, false)],
            noise_floor_tx_on: vec![(1, -70)],
            rf_on_time: vec![(1, 250)],
            frequency_khz: 915_250,
            temperature_c: 32,
            protocol: Some(TagProtocol::Gen2),
            antenna: 1,
        };
        let rendered = stats.render();
        assert!(rendered.contains("Antenna 1 | Connected"));
        assert!(rendered.contains("Antenna 2 | Disconnected"));
        assert!(rendered.contains("-70 dB"));
        assert!(rendered.contains("250 ms"));
        assert!(rendered.contains("915250 kHz"));
        assert!(rendered.contains("32 C"));
        assert!(rendered.contains("GEN2"));
    }
}
