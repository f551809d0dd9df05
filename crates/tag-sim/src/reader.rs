//! Simulated reader
//!
//! `SimReader` implements the full driver contract against an in-memory
//! tag population. It emulates the parts of module behavior the
//! orchestration layer has to cope with: a configured serial rate that
//! makes wrong-rate opens time out, regions that must be committed
//! before UHF searches, statistics categories the firmware forces on,
//! and per-record embedded-operation faults.

use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tag_connect::{ReaderUri, UriScheme};
use tag_protocol::op::fault;
use tag_protocol::{
    ConnectOptions, Direction, DriverError, EmbeddedResult, Gen2Bank, QtPayload, RadioConfig,
    ReadPlan, ReaderCapabilities, ReaderDriver, ReaderFamily, ReaderModel, ReaderModelDb,
    ReaderStats, Region, StatsFlags, TagFilter, TagOp, TagProtocol, TagReadRecord, TransportFrame,
    TransportKind, TransportTap, DEFAULT_BAUD_RATE,
};
use thiserror::Error;
use tracing::{debug, trace};

use crate::tag::SimTag;

/// Serial opcodes used for synthesized trace frames
mod opcode {
    pub const VERSION: u8 = 0x03;
    pub const READ_MULTIPLE: u8 = 0x22;
    pub const GET_READER_STATS: u8 = 0x27;
    pub const EXECUTE_TAG_OP: u8 = 0x2D;
    pub const SET_PARAM: u8 = 0x9A;
}

/// Errors building a simulated reader from a `sim://` URI
#[derive(Debug, Error)]
pub enum SimUriError {
    /// The URI is not a `sim://` endpoint
    #[error("not a sim:// endpoint: {0}")]
    NotSim(String),

    /// The target names no known reader model
    #[error("unknown simulated model '{0}'")]
    UnknownModel(String),

    /// A query parameter failed to parse
    #[error("invalid value for '{param}': {value}")]
    BadParam {
        /// Parameter name
        param: &'static str,
        /// Offending value
        value: String,
    },
}

/// Configuration for a simulated reader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimReaderConfig {
    /// Model name, must exist in the model database
    pub model: String,
    /// Transport class the module pretends to be attached over
    pub transport: TransportKind,
    /// Serial rate the module answers at; opens at any other rate
    /// time out
    pub answer_baud: u32,
    /// Initial region
    pub region: Region,
    /// Regions the module claims certification for
    pub supported_regions: Vec<Region>,
    /// Tag population in field of the antennas
    pub tags: Vec<SimTag>,
}

impl Default for SimReaderConfig {
    fn default() -> Self {
        Self {
            model: "M6e".to_string(),
            transport: TransportKind::Serial,
            answer_baud: DEFAULT_BAUD_RATE,
            region: Region::Unspecified,
            supported_regions: vec![Region::Na, Region::Eu, Region::Open],
            tags: (0..4).map(SimTag::numbered).collect(),
        }
    }
}

struct Inner {
    connected: bool,
    host_baud: u32,
    region: Region,
    supported_regions: Vec<Region>,
    radio: RadioConfig,
    plan: Option<ReadPlan>,
    stats_enabled: StatsFlags,
    tags: Vec<SimTag>,
    tap: Option<TransportTap>,
    searches: u32,
    rf_on_ms: u32,
    last_antenna: u16,
}

/// A simulated reader implementing [`ReaderDriver`]
pub struct SimReader {
    model: ReaderModel,
    transport: TransportKind,
    answer_baud: u32,
    inner: Mutex<Inner>,
}

impl SimReader {
    /// Create a simulated reader from explicit configuration
    pub fn new(config: SimReaderConfig) -> Result<Self, SimUriError> {
        let model = ReaderModelDb::by_name(&config.model)
            .ok_or_else(|| SimUriError::UnknownModel(config.model.clone()))?;

        Ok(Self {
            model,
            transport: config.transport,
            answer_baud: config.answer_baud,
            inner: Mutex::new(Inner {
                connected: false,
                host_baud: DEFAULT_BAUD_RATE,
                region: config.region,
                supported_regions: config.supported_regions,
                radio: RadioConfig::default(),
                plan: None,
                stats_enabled: StatsFlags::NONE,
                tags: config.tags,
                tap: None,
                searches: 0,
                rf_on_ms: 0,
                last_antenna: 0,
            }),
        })
    }

    /// Create a simulated reader from a `sim://` endpoint
    ///
    /// Recognized query parameters: `tags=<n>` population size,
    /// `baud=<rate>` the rate the module answers at, `transport=network`
    /// to pretend the module is network-attached.
    pub fn from_uri(uri: &ReaderUri) -> Result<Self, SimUriError> {
        if uri.scheme() != UriScheme::Sim {
            return Err(SimUriError::NotSim(uri.as_str().to_string()));
        }

        let mut config = SimReaderConfig {
            // URIs spell multi-word models with dashes
            model: uri.target().replace('-', " "),
            ..SimReaderConfig::default()
        };

        if let Some(value) = uri.param("tags") {
            let count: u8 = value.parse().map_err(|_| SimUriError::BadParam {
                param: "tags",
                value: value.to_string(),
            })?;
            config.tags = (0..count).map(SimTag::numbered).collect();
        }

        if let Some(value) = uri.param("baud") {
            config.answer_baud = value.parse().map_err(|_| SimUriError::BadParam {
                param: "baud",
                value: value.to_string(),
            })?;
        }

        if let Some(value) = uri.param("transport") {
            config.transport = match value {
                "serial" => TransportKind::Serial,
                "network" => TransportKind::Network,
                _ => {
                    return Err(SimUriError::BadParam {
                        param: "transport",
                        value: value.to_string(),
                    })
                }
            };
        }

        Self::new(config)
    }

    /// Snapshot of the current tag population
    pub fn tags(&self) -> Vec<SimTag> {
        self.inner.lock().unwrap().tags.clone()
    }

    /// Add a tag to the population
    pub fn add_tag(&self, tag: SimTag) {
        self.inner.lock().unwrap().tags.push(tag);
    }

    /// QT state of the tag with the given EPC, if present
    pub fn qt_state(&self, epc: &[u8]) -> Option<QtPayload> {
        self.inner
            .lock()
            .unwrap()
            .tags
            .iter()
            .find(|t| t.epc == epc)
            .map(|t| t.qt)
    }

    /// Whether the module considers itself connected
    pub fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }

    fn ensure_connected(inner: &Inner) -> Result<(), DriverError> {
        if inner.connected {
            Ok(())
        } else {
            Err(DriverError::NotConnected)
        }
    }

    fn ensure_region(&self, inner: &Inner) -> Result<(), DriverError> {
        // HF/LF modules are region-free; UHF searches need one committed
        if self.model.capabilities.family == ReaderFamily::LongRangeUhf
            && inner.region == Region::Unspecified
        {
            return Err(DriverError::Transport(
                "no operating region configured".to_string(),
            ));
        }
        Ok(())
    }

    fn emit_frame(inner: &Inner, direction: Direction, op: u8, payload: &[u8]) {
        if let Some(tap) = &inner.tap {
            let mut bytes = vec![0xFF, payload.len() as u8, op];
            bytes.extend_from_slice(payload);
            let _ = tap.send(TransportFrame { direction, bytes });
        }
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn record_from(
        tag: &SimTag,
        protocol: TagProtocol,
        antenna: u16,
        frequency_khz: u32,
        timestamp_ms: u64,
        data: EmbeddedResult,
    ) -> TagReadRecord {
        let tail = *tag.epc.last().unwrap_or(&0);
        TagReadRecord {
            epc: tag.epc.clone(),
            protocol,
            antenna,
            rssi_dbm: -42 - i32::from(tail % 23),
            phase: u32::from(tail) * 7 % 180,
            frequency_khz,
            read_count: 1,
            timestamp_ms,
            data,
        }
    }

    /// Run one operation against one tag; a fault code comes back as
    /// `Err` and the caller decides whether it is embedded or fatal
    fn apply_op(
        caps: &ReaderCapabilities,
        tag: &mut SimTag,
        op: &TagOp,
    ) -> Result<Option<Vec<u8>>, u16> {
        match op {
            TagOp::ReadData {
                bank,
                word_address,
                word_count,
            } => {
                let Some(memory) = tag.visible_bank(*bank) else {
                    return Err(fault::NO_DATA_READ);
                };
                let start = (*word_address as usize) * 2;

                if *word_count == 0 {
                    let identifier_bank = matches!(bank, Gen2Bank::Tid | Gen2Bank::Epc);
                    if identifier_bank && caps.supports_full_bank_read {
                        if start > memory.len() {
                            return Err(fault::GEN2_MEMORY_OVERRUN);
                        }
                        return Ok(Some(memory[start..].to_vec()));
                    }
                    // Other banks (and lesser modules) refuse the
                    // variable-length form outright
                    return Err(fault::NO_DATA_READ);
                }

                let end = start + (*word_count as usize) * 2;
                if end > memory.len() {
                    return Err(fault::GEN2_MEMORY_OVERRUN);
                }
                Ok(Some(memory[start..end].to_vec()))
            }

            TagOp::Select { filter } => {
                if tag.matches(filter) {
                    Ok(None)
                } else {
                    Err(fault::NO_TAGS_FOUND)
                }
            }

            TagOp::QtReadWrite {
                access_password,
                payload,
                control,
            } => {
                if tag.access_password != 0 && *access_password != tag.access_password {
                    return Err(fault::GEN2_MEMORY_LOCKED);
                }
                if control.read_write {
                    tag.qt = *payload;
                }
                Ok(Some(tag.qt_word().to_be_bytes().to_vec()))
            }
        }
    }

    fn region_frequency(region: Region) -> u32 {
        match region {
            Region::Eu => 865_700,
            Region::Jp => 916_800,
            Region::Kr => 917_300,
            Region::In => 865_900,
            _ => 915_250,
        }
    }
}

#[async_trait]
impl ReaderDriver for SimReader {
    async fn open(&self, opts: &ConnectOptions) -> Result<(), DriverError> {
        if self.transport == TransportKind::Serial && opts.baud_rate != self.answer_baud {
            // The module is listening at a different rate; the host
            // sees nothing but silence for the whole timeout
            trace!(
                "ignoring handshake at {} baud (module at {})",
                opts.baud_rate,
                self.answer_baud
            );
            tokio::time::sleep(opts.timeout).await;
            return Err(DriverError::Timeout);
        }

        let mut inner = self.inner.lock().unwrap();
        Self::emit_frame(&inner, Direction::Tx, opcode::VERSION, &[]);
        Self::emit_frame(
            &inner,
            Direction::Rx,
            opcode::VERSION,
            self.model.model.as_bytes(),
        );
        inner.connected = true;
        debug!("simulated {} opened at {} baud", self.model.model, opts.baud_rate);
        Ok(())
    }

    async fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = false;
        inner.tap = None;
    }

    fn transport(&self) -> TransportKind {
        self.transport
    }

    fn set_transport_tap(&self, tap: Option<TransportTap>) {
        self.inner.lock().unwrap().tap = tap;
    }

    async fn model_name(&self) -> Result<String, DriverError> {
        Ok(self.model.model.clone())
    }

    async fn baud_rate(&self) -> Result<u32, DriverError> {
        Ok(self.inner.lock().unwrap().host_baud)
    }

    async fn set_baud_rate(&self, baud: u32) -> Result<(), DriverError> {
        self.inner.lock().unwrap().host_baud = baud;
        Ok(())
    }

    async fn region(&self) -> Result<Region, DriverError> {
        let inner = self.inner.lock().unwrap();
        Self::ensure_connected(&inner)?;
        Ok(inner.region)
    }

    async fn set_region(&self, region: Region) -> Result<(), DriverError> {
        let mut inner = self.inner.lock().unwrap();
        Self::ensure_connected(&inner)?;
        Self::emit_frame(&inner, Direction::Tx, opcode::SET_PARAM, region.name().as_bytes());
        inner.region = region;
        Ok(())
    }

    async fn supported_regions(&self) -> Result<Vec<Region>, DriverError> {
        let inner = self.inner.lock().unwrap();
        Self::ensure_connected(&inner)?;
        Ok(inner.supported_regions.clone())
    }

    async fn max_power_cdbm(&self) -> Result<Option<u16>, DriverError> {
        Ok(self.model.capabilities.max_power_cdbm)
    }

    async fn set_radio_config(&self, config: &RadioConfig) -> Result<(), DriverError> {
        let mut inner = self.inner.lock().unwrap();
        Self::ensure_connected(&inner)?;
        Self::emit_frame(&inner, Direction::Tx, opcode::SET_PARAM, &[]);
        inner.radio = config.clone();
        Ok(())
    }

    async fn set_read_plan(&self, plan: &ReadPlan) -> Result<(), DriverError> {
        let mut inner = self.inner.lock().unwrap();
        Self::ensure_connected(&inner)?;
        Self::emit_frame(&inner, Direction::Tx, opcode::SET_PARAM, &[plan.antennas().len() as u8]);
        // Wholesale replacement: nothing of the previous plan survives
        inner.plan = Some(plan.clone());
        Ok(())
    }

    async fn read(&self, timeout: Duration) -> Result<Vec<TagReadRecord>, DriverError> {
        let plan = {
            let inner = self.inner.lock().unwrap();
            Self::ensure_connected(&inner)?;
            self.ensure_region(&inner)?;
            let plan = inner
                .plan
                .clone()
                .ok_or_else(|| DriverError::Transport("no read plan applied".to_string()))?;
            Self::emit_frame(
                &inner,
                Direction::Tx,
                opcode::READ_MULTIPLE,
                &(timeout.as_millis() as u16).to_be_bytes(),
            );
            plan
        };

        // The module holds the RF window open for the whole search
        tokio::time::sleep(timeout).await;

        let caps = self.model.capabilities.clone();
        let mut inner = self.inner.lock().unwrap();
        inner.searches += 1;
        inner.rf_on_ms = inner.rf_on_ms.saturating_add(timeout.as_millis() as u32);

        let antennas: Vec<u16> = if plan.antennas().is_empty() {
            vec![1]
        } else {
            plan.antennas().to_vec()
        };
        let timestamp_ms = Self::now_ms();
        let frequency_khz = Self::region_frequency(inner.region);

        let mut records = Vec::new();
        for &antenna in &antennas {
            if antenna == 0 || antenna > u16::from(caps.max_antennas) {
                continue;
            }
            for tag in inner.tags.iter_mut() {
                if let Some(filter) = plan.filter() {
                    if !tag.matches(filter) {
                        continue;
                    }
                }
                let data = match plan.op() {
                    None => EmbeddedResult::None,
                    Some(op) => match Self::apply_op(&caps, tag, op) {
                        Ok(None) => EmbeddedResult::None,
                        Ok(Some(bytes)) => EmbeddedResult::Data(bytes),
                        Err(code) => EmbeddedResult::Error(code),
                    },
                };
                records.push(Self::record_from(
                    tag,
                    plan.protocol(),
                    antenna,
                    frequency_khz,
                    timestamp_ms,
                    data,
                ));
            }
            inner.last_antenna = antenna;
        }

        Self::emit_frame(
            &inner,
            Direction::Rx,
            opcode::READ_MULTIPLE,
            &[records.len() as u8],
        );
        debug!("search returned {} record(s)", records.len());
        Ok(records)
    }

    async fn execute_op(
        &self,
        op: &TagOp,
        filter: Option<&TagFilter>,
    ) -> Result<Vec<TagReadRecord>, DriverError> {
        let caps = self.model.capabilities.clone();
        let mut inner = self.inner.lock().unwrap();
        Self::ensure_connected(&inner)?;
        self.ensure_region(&inner)?;
        Self::emit_frame(&inner, Direction::Tx, opcode::EXECUTE_TAG_OP, &[]);

        let antenna = inner.radio.tagop_antenna.unwrap_or(1);
        let frequency_khz = Self::region_frequency(inner.region);
        let timestamp_ms = Self::now_ms();

        // Single-tag operation: the first tag the filter singulates
        let index = inner
            .tags
            .iter()
            .position(|t| filter.map_or(true, |f| t.matches(f)))
            .ok_or(DriverError::TagOpFailed {
                code: fault::NO_TAGS_FOUND,
            })?;

        let tag = &mut inner.tags[index];
        match Self::apply_op(&caps, tag, op) {
            Ok(data) => {
                let embedded = match data {
                    Some(bytes) => EmbeddedResult::Data(bytes),
                    None => EmbeddedResult::None,
                };
                let record = Self::record_from(
                    tag,
                    self.model.default_protocol,
                    antenna,
                    frequency_khz,
                    timestamp_ms,
                    embedded,
                );
                Self::emit_frame(&inner, Direction::Rx, opcode::EXECUTE_TAG_OP, &[1]);
                Ok(vec![record])
            }
            Err(code) => Err(DriverError::TagOpFailed { code }),
        }
    }

    async fn enable_stats(&self, flags: StatsFlags) -> Result<(), DriverError> {
        let mut inner = self.inner.lock().unwrap();
        Self::ensure_connected(&inner)?;
        inner.stats_enabled = flags;
        Ok(())
    }

    async fn enabled_stats(&self) -> Result<StatsFlags, DriverError> {
        let inner = self.inner.lock().unwrap();
        Self::ensure_connected(&inner)?;
        // Firmware forces temperature and antenna status on
        Ok(inner.stats_enabled | StatsFlags::ALWAYS_ON)
    }

    async fn stats(&self) -> Result<ReaderStats, DriverError> {
        let inner = self.inner.lock().unwrap();
        Self::ensure_connected(&inner)?;
        Self::emit_frame(&inner, Direction::Tx, opcode::GET_READER_STATS, &[]);

        let caps = &self.model.capabilities;
        let uhf = caps.family == ReaderFamily::LongRangeUhf;
        let enabled = inner.stats_enabled | StatsFlags::ALWAYS_ON;

        let plan_antennas: Vec<u16> = inner
            .plan
            .as_ref()
            .map(|p| p.antennas().to_vec())
            .unwrap_or_default();
        let connected =
            |port: u16| port == 1 || plan_antennas.contains(&port);

        let mut stats = ReaderStats {
            temperature_c: 29 + (inner.searches % 4) as i8,
            ..Default::default()
        };
        for port in 1..=u16::from(caps.max_antennas) {
            stats.connected_antennas.push((port, connected(port)));
        }

        if uhf && enabled.contains(StatsFlags::NOISE_FLOOR_TX_ON) {
            for port in (1..=u16::from(caps.max_antennas)).filter(|&p| connected(p)) {
                stats.noise_floor_tx_on.push((port, -77 + port as i8));
            }
        }
        if uhf && enabled.contains(StatsFlags::RF_ON_TIME) {
            for port in (1..=u16::from(caps.max_antennas)).filter(|&p| connected(p)) {
                stats.rf_on_time.push((port, inner.rf_on_ms));
            }
        }
        if uhf && enabled.contains(StatsFlags::FREQUENCY) {
            stats.frequency_khz = Self::region_frequency(inner.region);
        }
        if enabled.contains(StatsFlags::PROTOCOL) {
            stats.protocol = inner.plan.as_ref().map(|p| p.protocol());
        }
        if uhf && enabled.contains(StatsFlags::ANTENNA) {
            stats.antenna = inner.last_antenna;
        }

        Ok(stats)
    }

    async fn antenna_return_loss(&self) -> Result<Vec<(u16, i16)>, DriverError> {
        if !self.model.capabilities.supports_return_loss {
            return Err(DriverError::Unsupported("antenna return loss"));
        }
        let inner = self.inner.lock().unwrap();
        Self::ensure_connected(&inner)?;
        Ok((1..=u16::from(self.model.capabilities.max_antennas))
            .map(|port| (port, 270 + 15 * port as i16))
            .collect())
    }
}
