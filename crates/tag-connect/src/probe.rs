//! Serial link-rate probing
//!
//! Modules remember their configured baud rate across power cycles, so a
//! connect at the default rate can time out against a perfectly healthy
//! device. Probing walks the candidate rate set, attempting the firmware
//! handshake at each, and reports the first rate that answers.

use std::time::Duration;

use tag_protocol::{ConnectOptions, DriverError, ReaderDriver};
use tracing::{debug, info};

/// Candidate serial rates, in probe order
///
/// The common field rates come first; the default rate appears again so
/// a transient timeout on the initial connect does not exclude it.
pub const PROBE_BAUD_RATES: &[u32] = &[
    9_600, 115_200, 921_600, 19_200, 38_400, 57_600, 230_400, 460_800,
];

/// Walk the candidate rates until one completes the handshake
///
/// On success the driver is left open at the discovered rate, which is
/// returned so the caller can persist it. Non-timeout failures abort the
/// walk immediately; only the timeout class means "wrong rate, keep
/// going". Worst case this blocks for the sum of per-rate timeouts.
pub async fn probe_baud_rate(
    driver: &dyn ReaderDriver,
    per_rate_timeout: Duration,
) -> Result<u32, DriverError> {
    for &baud_rate in PROBE_BAUD_RATES {
        debug!("probing handshake at {} baud", baud_rate);
        let opts = ConnectOptions {
            baud_rate,
            timeout: per_rate_timeout,
        };
        match driver.open(&opts).await {
            Ok(()) => {
                info!("reader answered at {} baud", baud_rate);
                return Ok(baud_rate);
            }
            Err(DriverError::Timeout) => continue,
            Err(e) => return Err(e),
        }
    }

    debug!("no candidate rate answered");
    Err(DriverError::Timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_set_covers_module_rates() {
        assert!(PROBE_BAUD_RATES.contains(&tag_protocol::DEFAULT_BAUD_RATE));
        assert!(PROBE_BAUD_RATES.contains(&9_600));
        assert!(PROBE_BAUD_RATES.contains(&921_600));
    }
}
