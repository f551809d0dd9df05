//! Integration tests for reader session orchestration
//!
//! These tests drive the full stack against the simulated reader:
//! - Connection establishment and baud-rate probing
//! - Region resolution determinism
//! - Read plan application and replacement
//! - Synchronous and background reads, dedup tracking
//! - Single-tag operations and embedded-operation faults
//! - Statistics collection and absence handling

use std::sync::Arc;
use std::time::Duration;

use tag_protocol::op::fault;
use tag_protocol::{
    EmbeddedResult, Gen2Bank, QtControl, QtPayload, RadioConfig, ReadPlan, ReaderDriver, Region,
    StatsFlags, TagFilter, TagOp, TagProtocol, TransportKind, DEFAULT_BAUD_RATE,
};
use tag_session::{
    OperationError, ReadState, ReaderSession, RegionError, SessionError, SessionOptions,
    StatsError, TagTracker,
};
use tag_sim::{SimReader, SimReaderConfig, SimTag};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub fn options() -> SessionOptions {
        SessionOptions {
            label: "test".to_string(),
            connect_timeout: Duration::from_millis(5),
            transport_tap: None,
        }
    }

    /// Connect a session over a simulated reader with the given config
    pub async fn session_with(config: SimReaderConfig) -> (Arc<SimReader>, ReaderSession) {
        let driver = Arc::new(SimReader::new(config).unwrap());
        let driver_dyn: Arc<dyn ReaderDriver> = driver.clone();
        let session = ReaderSession::connect(driver_dyn, options())
            .await
            .unwrap();
        (driver, session)
    }

    /// Connected session with region resolved and a fast plan applied
    pub async fn ready_session(config: SimReaderConfig) -> (Arc<SimReader>, ReaderSession) {
        let (driver, mut session) = session_with(config).await;
        session.ensure_region().await.unwrap();
        session.apply_plan(&fast_plan()).await.unwrap();
        (driver, session)
    }

    pub fn fast_plan() -> ReadPlan {
        ReadPlan::new(vec![1], TagProtocol::Gen2).with_timeout(Duration::from_millis(10))
    }

    pub fn population(count: u8) -> Vec<SimTag> {
        (0..count).map(SimTag::numbered).collect()
    }
}

// ============================================================================
// Connection Tests
// ============================================================================

mod connection_tests {
    use super::*;

    #[tokio::test]
    async fn connect_at_default_rate() {
        let (_, session) = helpers::session_with(SimReaderConfig::default()).await;
        assert_eq!(session.baud_rate(), DEFAULT_BAUD_RATE);
        assert_eq!(session.model_name(), "M6e");
        assert_eq!(session.state(), ReadState::Idle);
    }

    #[tokio::test]
    async fn timeout_triggers_probe_and_persists_rate() {
        let config = SimReaderConfig {
            answer_baud: 9_600,
            ..Default::default()
        };
        let (driver, mut session) = helpers::session_with(config).await;

        // The discovered rate is persisted on both sides
        assert_eq!(session.baud_rate(), 9_600);
        assert_eq!(driver.baud_rate().await.unwrap(), 9_600);

        // The next operation succeeds without any re-probe
        session.ensure_region().await.unwrap();
        session.apply_plan(&helpers::fast_plan()).await.unwrap();
        let records = session.read_for(Duration::from_millis(10)).await.unwrap();
        assert_eq!(records.len(), 4);
    }

    #[tokio::test]
    async fn network_transport_is_never_probed() {
        // A network endpoint ignores the link rate entirely; a mismatch
        // that would strand a serial module must not matter here
        let config = SimReaderConfig {
            transport: TransportKind::Network,
            answer_baud: 9_600,
            ..Default::default()
        };
        let (_, session) = helpers::session_with(config).await;
        assert_eq!(session.baud_rate(), DEFAULT_BAUD_RATE);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (driver, mut session) = helpers::session_with(SimReaderConfig::default()).await;
        session.close().await;
        assert!(!driver.is_connected());
        session.close().await;
    }

    #[tokio::test]
    async fn transport_tap_sees_connect_traffic() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let driver = Arc::new(SimReader::new(SimReaderConfig::default()).unwrap());
        let driver_dyn: Arc<dyn ReaderDriver> = driver.clone();
        let mut session = ReaderSession::connect(
            driver_dyn,
            SessionOptions {
                transport_tap: Some(tx),
                ..helpers::options()
            },
        )
        .await
        .unwrap();

        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        assert!(!frames.is_empty());
        assert!(frames.iter().all(|f| f.bytes[0] == 0xFF));

        session.close().await;
    }
}

// ============================================================================
// Region Resolution Tests
// ============================================================================

mod region_tests {
    use super::*;

    #[tokio::test]
    async fn unspecified_region_selects_first_supported() {
        let config = SimReaderConfig {
            supported_regions: vec![Region::Eu, Region::Na, Region::Open],
            ..Default::default()
        };
        let (driver, mut session) = helpers::session_with(config).await;

        session.ensure_region().await.unwrap();
        // Always list[0], a documented tie-break rather than a heuristic
        assert_eq!(session.region(), Region::Eu);
        assert_eq!(driver.region().await.unwrap(), Region::Eu);
    }

    #[tokio::test]
    async fn preset_region_is_left_alone() {
        let config = SimReaderConfig {
            region: Region::Jp,
            supported_regions: vec![Region::Na, Region::Eu],
            ..Default::default()
        };
        let (driver, mut session) = helpers::session_with(config).await;

        session.ensure_region().await.unwrap();
        assert_eq!(session.region(), Region::Jp);
        assert_eq!(driver.region().await.unwrap(), Region::Jp);
    }

    #[tokio::test]
    async fn empty_support_list_fails_without_partial_config() {
        let config = SimReaderConfig {
            supported_regions: vec![],
            ..Default::default()
        };
        let (driver, mut session) = helpers::session_with(config).await;

        match session.ensure_region().await {
            Err(SessionError::Region(RegionError::NoSupportedRegions)) => {}
            other => panic!("expected NoSupportedRegions, got {:?}", other.err()),
        }
        // Nothing was committed on either side
        assert_eq!(session.region(), Region::Unspecified);
        assert_eq!(driver.region().await.unwrap(), Region::Unspecified);
    }
}

// ============================================================================
// Read Plan Tests
// ============================================================================

mod plan_tests {
    use super::*;

    #[tokio::test]
    async fn plan_replacement_is_total() {
        let (_, mut session) = helpers::ready_session(SimReaderConfig::default()).await;

        // P1 restricts to a single tag
        let target = SimTag::numbered(0);
        let p1 = helpers::fast_plan().with_filter(TagFilter::epc(&target.epc));
        session.apply_plan(&p1).await.unwrap();
        let records = session.read_for(Duration::from_millis(10)).await.unwrap();
        assert_eq!(records.len(), 1);

        // P2 carries no filter; nothing of P1 may survive
        let p2 = helpers::fast_plan();
        session.apply_plan(&p2).await.unwrap();
        let records = session.read_for(Duration::from_millis(10)).await.unwrap();
        assert_eq!(records.len(), 4);
    }

    #[tokio::test]
    async fn read_without_plan_is_a_state_error() {
        let (_, mut session) = helpers::session_with(SimReaderConfig::default()).await;
        session.ensure_region().await.unwrap();
        assert!(matches!(
            session.read_for(Duration::from_millis(10)).await,
            Err(SessionError::State(_))
        ));
    }
}

// ============================================================================
// Read Runner Tests
// ============================================================================

mod runner_tests {
    use super::*;

    #[tokio::test]
    async fn synchronous_read_returns_population() {
        let (_, mut session) = helpers::ready_session(SimReaderConfig::default()).await;
        let records = session.read_for(Duration::from_millis(10)).await.unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(session.state(), ReadState::Idle);
    }

    #[tokio::test]
    async fn start_then_immediate_stop_is_empty_not_an_error() {
        let config = SimReaderConfig {
            tags: vec![],
            ..Default::default()
        };
        let (_, mut session) = helpers::ready_session(config).await;

        let stream = session.start_reading().await.unwrap();
        assert_eq!(session.state(), ReadState::Reading);

        let drained = session.stop_reading(stream).await.unwrap();
        assert!(drained.is_empty());
        assert_eq!(session.state(), ReadState::Stopped);
    }

    #[tokio::test]
    async fn background_read_tracks_unique_and_total() {
        let config = SimReaderConfig {
            tags: helpers::population(3),
            ..Default::default()
        };
        let (_, mut session) = helpers::ready_session(config).await;

        let mut tracker = TagTracker::new();
        let mut notifications = Vec::new();

        let mut stream = session.start_reading().await.unwrap();
        let window = tokio::time::sleep(Duration::from_millis(35));
        tokio::pin!(window);
        loop {
            tokio::select! {
                _ = &mut window => break,
                record = stream.recv() => match record {
                    Some(record) => {
                        if tracker.observe(&record) {
                            notifications.push(record.epc.clone());
                        }
                    }
                    None => break,
                },
            }
        }
        // Records still in flight at stop time count too
        for record in session.stop_reading(stream).await.unwrap() {
            if tracker.observe(&record) {
                notifications.push(record.epc.clone());
            }
        }

        assert_eq!(tracker.unique_count(), 3);
        assert!(tracker.total_count() >= tracker.unique_count());
        assert_eq!(notifications.len(), 3);
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let (_, mut session) = helpers::ready_session(SimReaderConfig::default()).await;
        let stream = session.start_reading().await.unwrap();

        assert!(matches!(
            session.start_reading().await,
            Err(SessionError::State(_))
        ));

        session.stop_reading(stream).await.unwrap();
    }

    #[tokio::test]
    async fn stopped_is_terminal() {
        let (_, mut session) = helpers::ready_session(SimReaderConfig::default()).await;
        let stream = session.start_reading().await.unwrap();
        session.stop_reading(stream).await.unwrap();

        assert!(matches!(
            session.start_reading().await,
            Err(SessionError::State(_))
        ));
    }

    #[tokio::test]
    async fn sync_read_during_background_read_is_rejected() {
        let (_, mut session) = helpers::ready_session(SimReaderConfig::default()).await;
        let stream = session.start_reading().await.unwrap();

        assert!(matches!(
            session.read_for(Duration::from_millis(10)).await,
            Err(SessionError::State(_))
        ));

        session.stop_reading(stream).await.unwrap();
    }
}

// ============================================================================
// Tag Operation Tests
// ============================================================================

mod ops_tests {
    use super::*;

    fn qt_op(password: u32, public_map: bool) -> TagOp {
        TagOp::QtReadWrite {
            access_password: password,
            payload: QtPayload {
                public_map,
                short_range: false,
            },
            control: QtControl {
                read_write: true,
                persistence: true,
            },
        }
    }

    #[tokio::test]
    async fn execute_requires_tagop_antenna() {
        let (_, mut session) = helpers::ready_session(SimReaderConfig::default()).await;

        let result = session.execute(&qt_op(0, true), None).await;
        assert!(matches!(
            result,
            Err(SessionError::Operation(OperationError::NoAntenna))
        ));
    }

    #[tokio::test]
    async fn qt_transition_round_trip() {
        let config = SimReaderConfig {
            tags: vec![SimTag::numbered(0)],
            ..Default::default()
        };
        let (driver, mut session) = helpers::ready_session(config).await;
        session
            .set_radio_config(RadioConfig {
                tagop_antenna: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();

        let epc = SimTag::numbered(0).epc;
        session.execute(&qt_op(0, true), None).await.unwrap();
        assert!(driver.qt_state(&epc).unwrap().public_map);

        session.execute(&qt_op(0, false), None).await.unwrap();
        assert!(!driver.qt_state(&epc).unwrap().public_map);
    }

    #[tokio::test]
    async fn wrong_access_password_is_a_device_fault() {
        let config = SimReaderConfig {
            tags: vec![SimTag::numbered(0).with_access_password(0x1122_3344)],
            ..Default::default()
        };
        let (_, mut session) = helpers::ready_session(config).await;
        session
            .set_radio_config(RadioConfig {
                tagop_antenna: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();

        match session.execute(&qt_op(0xDEAD_BEEF, true), None).await {
            Err(SessionError::Operation(OperationError::TagOperationFailed { code })) => {
                assert_eq!(code, fault::GEN2_MEMORY_LOCKED);
            }
            other => panic!("expected device fault, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn embedded_read_returns_data_per_record() {
        let (_, mut session) = helpers::ready_session(SimReaderConfig::default()).await;
        let plan = helpers::fast_plan().with_op(TagOp::ReadData {
            bank: Gen2Bank::Tid,
            word_address: 0,
            word_count: 0,
        });
        session.apply_plan(&plan).await.unwrap();

        let records = session.read_for(Duration::from_millis(10)).await.unwrap();
        assert_eq!(records.len(), 4);
        for record in &records {
            match &record.data {
                EmbeddedResult::Data(tid) => assert_eq!(&tid[..4], &[0xE2, 0x80, 0x11, 0x05]),
                other => panic!("expected TID payload, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn embedded_fault_does_not_abort_the_batch() {
        let (_, mut session) = helpers::ready_session(SimReaderConfig::default()).await;
        // Way past the end of the TID bank
        let plan = helpers::fast_plan().with_op(TagOp::ReadData {
            bank: Gen2Bank::Tid,
            word_address: 64,
            word_count: 4,
        });
        session.apply_plan(&plan).await.unwrap();

        let records = session.read_for(Duration::from_millis(10)).await.unwrap();
        assert_eq!(records.len(), 4);
        for record in &records {
            assert!(record.is_error_data());
            assert_eq!(record.data, EmbeddedResult::Error(fault::GEN2_MEMORY_OVERRUN));
            // The decoded code shows up in the rendered record
            assert!(record.summary().contains("0x0423"));
        }
    }
}

// ============================================================================
// Statistics Tests
// ============================================================================

mod stats_tests {
    use super::*;

    #[tokio::test]
    async fn stats_after_read_cycle() {
        let (_, mut session) = helpers::ready_session(SimReaderConfig::default()).await;
        session.enable_stats(StatsFlags::ALL).await.unwrap();
        session.read_for(Duration::from_millis(10)).await.unwrap();

        let stats = session.collect_stats().await.unwrap();
        assert!(stats.temperature_c != 0);
        assert!(stats.frequency_khz != 0);
        assert!(!stats.connected_antennas.is_empty());
        assert_eq!(stats.protocol, Some(TagProtocol::Gen2));
    }

    #[tokio::test]
    async fn forced_categories_do_not_fail_the_sanity_check() {
        let (_, mut session) = helpers::ready_session(SimReaderConfig::default()).await;
        // The device will force temperature and antenna status on top of
        // this request; that must never be treated as an error
        session.enable_stats(StatsFlags::RF_ON_TIME).await.unwrap();
    }

    #[tokio::test]
    async fn contactless_family_omits_uhf_telemetry() {
        let config = SimReaderConfig {
            model: "M3e".to_string(),
            ..Default::default()
        };
        let (_, mut session) = helpers::session_with(config).await;
        session.ensure_region().await.unwrap();
        session.enable_stats(StatsFlags::ALL).await.unwrap();

        let stats = session.collect_stats().await.unwrap();
        assert_eq!(stats.frequency_khz, 0);
        assert!(stats.rf_on_time.is_empty());

        // Absent fields are omitted from the rendering, not printed as 0
        let rendered = stats.render();
        assert!(!rendered.contains("Frequency"));
        assert!(!rendered.contains("RF on-time"));
        assert!(rendered.contains("Temperature"));
    }

    #[tokio::test]
    async fn return_loss_is_gated_on_model() {
        let (_, mut session) = helpers::ready_session(SimReaderConfig::default()).await;
        let losses = session.antenna_return_loss().await.unwrap();
        assert!(!losses.is_empty());

        let config = SimReaderConfig {
            model: "M3e".to_string(),
            ..Default::default()
        };
        let (_, mut m3e) = helpers::session_with(config).await;
        assert!(matches!(
            m3e.antenna_return_loss().await,
            Err(SessionError::Stats(StatsError::Unsupported(_)))
        ));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;
    use tag_protocol::TagReadRecord;

    fn record(epc: u8) -> TagReadRecord {
        TagReadRecord {
            epc: vec![epc],
            protocol: TagProtocol::Gen2,
            antenna: 1,
            rssi_dbm: -50,
            phase: 0,
            frequency_khz: 915_250,
            read_count: 1,
            timestamp_ms: 0,
            data: EmbeddedResult::None,
        }
    }

    proptest! {
        #[test]
        fn tracker_counts_are_consistent(epcs in prop::collection::vec(any::<u8>(), 0..64)) {
            let mut tracker = TagTracker::new();
            let mut notifications = Vec::new();
            for &epc in &epcs {
                if tracker.observe(&record(epc)) {
                    notifications.push(epc);
                }
            }

            let mut first_seen = Vec::new();
            for &epc in &epcs {
                if !first_seen.contains(&epc) {
                    first_seen.push(epc);
                }
            }

            prop_assert_eq!(tracker.total_count(), epcs.len() as u64);
            prop_assert_eq!(tracker.unique_count(), first_seen.len() as u64);
            // Notifications arrive in first-sighting order
            prop_assert_eq!(notifications, first_seen);
        }
    }
}
