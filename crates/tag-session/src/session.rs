//! Reader session
//!
//! One `ReaderSession` owns one connected device for the lifetime of a
//! run. Connection establishment handles the uncertain serial link rate
//! (timeout at the default rate triggers one probe pass over the
//! candidate set); model identity is resolved once into a capability
//! record; the session must be closed on every exit path.

use std::sync::Arc;
use std::time::Duration;

use tag_connect::probe_baud_rate;
use tag_protocol::{
    ConnectOptions, DriverError, RadioConfig, ReadPlan, ReaderDriver, ReaderModel, ReaderModelDb,
    Region, TagProtocol, TransportTap, DEFAULT_BAUD_RATE,
};
use tracing::{debug, info, warn};

use crate::error::{ConnectionError, RegionError, SessionError};
use crate::runner::ReadState;

/// Options for establishing a session
#[derive(Debug)]
pub struct SessionOptions {
    /// Display label used in logs (typically the reader URI)
    pub label: String,
    /// Per-attempt handshake timeout; probing pays this once per
    /// candidate rate in the worst case
    pub connect_timeout: Duration,
    /// Raw-frame diagnostics tap, installed before the first open
    pub transport_tap: Option<TransportTap>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            label: "reader".to_string(),
            connect_timeout: Duration::from_millis(1000),
            transport_tap: None,
        }
    }
}

/// Handle to one connected reader, owned by the orchestrating task
pub struct ReaderSession {
    pub(crate) driver: Arc<dyn ReaderDriver>,
    pub(crate) label: String,
    pub(crate) baud_rate: u32,
    pub(crate) model: Option<ReaderModel>,
    pub(crate) model_name: String,
    pub(crate) region: Region,
    pub(crate) radio_config: RadioConfig,
    pub(crate) active_plan: Option<ReadPlan>,
    pub(crate) state: ReadState,
    pub(crate) closed: bool,
}

impl ReaderSession {
    /// Open a session against `driver`
    ///
    /// The first open runs at the default rate. A timeout from a
    /// probe-capable (serial) transport triggers one probe pass over the
    /// candidate rates, and the discovered rate is persisted before
    /// proceeding; any other failure is fatal. Call once per driver -
    /// reconnecting a session that already connected is not supported.
    pub async fn connect(
        driver: Arc<dyn ReaderDriver>,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let SessionOptions {
            label,
            connect_timeout,
            transport_tap,
        } = options;

        if let Some(tap) = transport_tap {
            driver.set_transport_tap(Some(tap));
        }

        let mut baud_rate = DEFAULT_BAUD_RATE;
        let opts = ConnectOptions {
            baud_rate,
            timeout: connect_timeout,
        };
        match driver.open(&opts).await {
            Ok(()) => {}
            Err(DriverError::Timeout) if driver.transport().is_probe_capable() => {
                info!(
                    "{}: connect timed out at {} baud, probing candidate rates",
                    label, baud_rate
                );
                match probe_baud_rate(driver.as_ref(), connect_timeout).await {
                    Ok(found) => {
                        driver
                            .set_baud_rate(found)
                            .await
                            .map_err(ConnectionError::Driver)?;
                        baud_rate = found;
                    }
                    Err(DriverError::Timeout) => {
                        return Err(ConnectionError::ProbeExhausted.into())
                    }
                    Err(e) => return Err(ConnectionError::Driver(e).into()),
                }
            }
            Err(DriverError::Timeout) => return Err(ConnectionError::Timeout.into()),
            Err(e) => return Err(ConnectionError::Driver(e).into()),
        }

        let model_name = driver.model_name().await?;
        let model = ReaderModelDb::by_name(&model_name);
        if model.is_none() {
            warn!("{}: unrecognized reader model '{}'", label, model_name);
        }
        info!("{}: connected to {} at {} baud", label, model_name, baud_rate);

        Ok(Self {
            driver,
            label,
            baud_rate,
            model,
            model_name,
            region: Region::Unspecified,
            radio_config: RadioConfig::default(),
            active_plan: None,
            state: ReadState::Idle,
            closed: false,
        })
    }

    /// Ensure an operating region is committed
    ///
    /// A device already carrying a region is left alone. Otherwise the
    /// first supported region is selected - deterministically, not by
    /// any quality heuristic - and applied. A device supporting no
    /// regions fails without touching the session.
    pub async fn ensure_region(&mut self) -> Result<(), SessionError> {
        let current = self.driver.region().await?;
        if current != Region::Unspecified {
            self.region = current;
            debug!("{}: region already set to {}", self.label, current.name());
            return Ok(());
        }

        let supported = self.driver.supported_regions().await?;
        let Some(&first) = supported.first() else {
            return Err(RegionError::NoSupportedRegions.into());
        };

        self.driver.set_region(first).await?;
        self.region = first;
        info!("{}: operating region set to {}", self.label, first.name());
        Ok(())
    }

    /// Replace the active read plan wholesale
    pub async fn apply_plan(&mut self, plan: &ReadPlan) -> Result<(), SessionError> {
        self.driver.set_read_plan(plan).await?;
        self.active_plan = Some(plan.clone());
        debug!(
            "{}: read plan applied ({} antenna(s), {})",
            self.label,
            plan.antennas().len(),
            plan.protocol().name()
        );
        Ok(())
    }

    /// Apply session-scoped radio parameters (tag-op antenna, Gen2
    /// session, RF power); these persist across operations until changed
    pub async fn set_radio_config(&mut self, config: RadioConfig) -> Result<(), SessionError> {
        self.driver.set_radio_config(&config).await?;
        self.radio_config = config;
        Ok(())
    }

    /// Maximum RF power the module supports, in centi-dBm
    pub async fn max_power_cdbm(&self) -> Result<Option<u16>, SessionError> {
        Ok(self.driver.max_power_cdbm().await?)
    }

    /// Display label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Serial rate the session ended up on
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Firmware-reported model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Capability record, when the model is in the database
    pub fn model(&self) -> Option<&ReaderModel> {
        self.model.as_ref()
    }

    /// Committed operating region
    pub fn region(&self) -> Region {
        self.region
    }

    /// Current read-session state
    pub fn state(&self) -> ReadState {
        self.state
    }

    /// Protocol this device family searches by default
    pub fn default_protocol(&self) -> TagProtocol {
        self.model
            .as_ref()
            .map(|m| m.default_protocol)
            .unwrap_or(TagProtocol::Gen2)
    }

    /// Whether the antenna return-loss query is available
    pub fn supports_return_loss(&self) -> bool {
        self.model
            .as_ref()
            .map(|m| m.capabilities.supports_return_loss)
            .unwrap_or(false)
    }

    /// Whether zero-length identifier-bank reads return the full bank
    pub fn supports_full_bank_read(&self) -> bool {
        self.model
            .as_ref()
            .map(|m| m.capabilities.supports_full_bank_read)
            .unwrap_or(false)
    }

    /// Close the session; required on every exit path, safe to call
    /// more than once
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.driver.set_transport_tap(None);
        self.driver.close().await;
        self.closed = true;
        debug!("{}: session closed", self.label);
    }
}
