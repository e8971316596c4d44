//! Integration tests for snapshot assembly over a realistic dashboard bundle

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use sitrep_engine::{
    classification::Tier,
    health::SubsystemState,
    messages::{self, MessageBoard, MessageId, MessageStatus},
    risk::RiskFactor,
    resources::ResourceStatus,
    zones::{self, HazardKind, Zone, ZoneStatus},
    EngineConfig, EngineError, RawBundle, SnapshotAssembler,
};

const BUNDLE: &str = include_str!("../fixtures/dashboard_bundle.json");

fn bundle() -> RawBundle {
    serde_json::from_str(BUNDLE).unwrap()
}

#[test]
fn test_dashboard_snapshot() {
    let assembler = SnapshotAssembler::default();
    let snapshot = assembler.assemble(&bundle()).unwrap();

    let zone_ids: Vec<u64> = snapshot.zones().iter().map(|z| z.id).collect();
    assert_eq!(zone_ids, vec![2, 1, 3]);
    assert_eq!(snapshot.zones()[0].hazard, HazardKind::Fire);
    assert_eq!(snapshot.zone_counts().get(Tier::Critical), 1);
    assert_eq!(snapshot.zones_with_status(ZoneStatus::Monitoring).count(), 1);
    assert_eq!(snapshot.zone_totals().affected, 430);

    let counters = snapshot.counters();
    assert_eq!(counters.high_priority_zones, 2);
    assert_eq!(counters.active_incidents, 2);
    assert_eq!(counters.system_load, 61.0);
    assert_eq!(counters.open_alerts, 3);
    assert_eq!(counters.open_messages, 4);
    assert_eq!(counters.percent_allocated, 87);

    assert_eq!(snapshot.health().overall, SubsystemState::Processing);
    assert_eq!(snapshot.health().components.len(), 4);
}

#[test]
fn test_dashboard_resources() {
    let snapshot = SnapshotAssembler::default().assemble(&bundle()).unwrap();

    let medical = &snapshot.resources()[0];
    assert_eq!(medical.status(), ResourceStatus::Shortage);
    assert_eq!(medical.metrics.percent_allocated, 38);
    assert_eq!(medical.needed(), 125.0);

    let shelter = &snapshot.resources()[2];
    assert_eq!(shelter.status(), ResourceStatus::Adequate);
    assert_eq!(shelter.needed(), 0.0);

    assert_eq!(snapshot.shortages().count(), 2);
    assert_eq!(snapshot.resource_summary().adequate_count, 1);
}

#[test]
fn test_dashboard_messages_and_weather() {
    let snapshot = SnapshotAssembler::default().assemble(&bundle()).unwrap();

    let scores: Vec<u8> = snapshot.messages().iter().map(|m| m.score).collect();
    assert_eq!(scores, vec![96, 89, 87, 72]);
    assert_eq!(snapshot.messages()[2].status, MessageStatus::Responding);

    let weather = snapshot.weather_summary().unwrap();
    assert_eq!(weather.latest.temperature, 25.0);
    assert_eq!(weather.peak_wind_speed, 22.0);
    assert!((weather.total_rainfall - 2.5).abs() < 1e-9);
    let first = snapshot.weather().samples()[0].timestamp;
    assert_eq!(first, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
}

#[test]
fn test_configured_policy_flows_into_snapshot() {
    let config = EngineConfig::from_toml_str("adequacy_threshold = 0.3\nsystem_load = 78.0").unwrap();
    let snapshot = SnapshotAssembler::new(config).assemble(&bundle()).unwrap();

    assert_eq!(snapshot.counters().system_load, 78.0);
    assert_eq!(snapshot.shortages().count(), 0);
}

#[test]
fn test_operator_session() {
    let assembler = SnapshotAssembler::default();
    let mut board = MessageBoard::new(assembler.config());

    let submitted = board.submit("Evacuate Sector 9 immediately", Tier::High, "General").unwrap();
    assert_eq!(submitted.score, 85);
    assert_eq!(submitted.status, MessageStatus::Active);
    assert_eq!(submitted.id, MessageId::Operator(1));

    let feed = bundle();
    let snapshot = assembler.assemble_session(&feed, &board).unwrap();
    assert_eq!(snapshot.messages().len(), 5);
    assert_eq!(snapshot.counters().open_alerts, 4);
    assert!(snapshot.messages().iter().any(|m| m.id == MessageId::Field(1)));

    board.dispatch(submitted.id, "Rescue Unit 2").unwrap();
    board.transition(submitted.id, MessageStatus::Resolved).unwrap();
    let err = board.transition(submitted.id, MessageStatus::Responding).unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition { .. }));

    let next = assembler.assemble_session(&feed, &board).unwrap();
    assert!(next.version() > snapshot.version());
    assert_eq!(next.counters().open_alerts, 3);
}

#[test]
fn test_operator_message_ranks_ahead_of_older_feed_with_equal_score() {
    let config = EngineConfig::from_toml_str("[submit_scores]\nhigh = 87").unwrap();
    let assembler = SnapshotAssembler::new(config);
    let mut board = MessageBoard::new(assembler.config());
    let submitted = board.submit("Medical team to Zone Beta", Tier::High, "Medical Request").unwrap();

    let snapshot = assembler.assemble_session(&bundle(), &board).unwrap();
    let titles: Vec<&str> = snapshot.messages().iter().map(|m| m.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Building collapse on 5th Avenue, multiple people trapped",
            "Water contamination detected in central district",
            "Medical team to Zone Beta",
            "Need medical supplies at evacuation center",
            "Road blockage due to debris on Highway 12",
        ]
    );
    assert_eq!(snapshot.messages()[2].id, submitted.id);
    assert_eq!(board.get(submitted.id).unwrap().created_order, 0);
}

#[test]
fn test_failed_session_keeps_board_and_last_snapshot() {
    let assembler = SnapshotAssembler::default();
    let mut board = MessageBoard::new(assembler.config());
    board.submit("Evacuate Sector 9 immediately", Tier::High, "General").unwrap();
    let good = assembler.assemble_session(&bundle(), &board).unwrap();

    // The board already holds field report 2, which the feed repeats
    board.ingest(&bundle().messages[1]).unwrap();
    let before = board.clone();

    let err = assembler.assemble_session(&bundle(), &board).unwrap_err();
    assert!(matches!(err, EngineError::InvalidMessage(_)));
    assert_eq!(board, before);
    assert_eq!(assembler.version(), good.version());
    assert_eq!(assembler.latest().unwrap().id(), good.id());

    let mut missing_tier = bundle();
    missing_tier.messages[0].tier = "SEVERE".to_string();
    assert!(matches!(
        assembler.assemble_session(&missing_tier, &MessageBoard::new(assembler.config())),
        Err(EngineError::InvalidTier(_))
    ));
    assert_eq!(assembler.latest().unwrap().id(), good.id());
}

#[test]
fn test_exhausted_message_id_is_rejected_not_panicking() {
    let assembler = SnapshotAssembler::default();
    let mut raw = bundle();
    raw.messages[0].id = Some(u64::MAX);
    assert!(matches!(assembler.assemble(&raw), Err(EngineError::InvalidMessage(_))));

    let mut raw = bundle();
    raw.messages[0].created_order = Some(u64::MAX);
    assert!(matches!(assembler.assemble(&raw), Err(EngineError::InvalidMessage(_))));
    assert!(assembler.latest().is_none());
}

#[test]
fn test_dashboard_risk() {
    let snapshot = SnapshotAssembler::default().assemble(&bundle()).unwrap();
    let risk = snapshot.risk();
    assert_eq!(risk.factors, vec![RiskFactor::Seismic]);
    assert_eq!(risk.probability, 0.7);
    assert_eq!(risk.tier, Tier::High);
    assert!((risk.inputs.rain_24h_mm - 2.5).abs() < 1e-9);
    assert_eq!(risk.inputs.humidity_pct, Some(55.0));

    let mut calm = bundle();
    calm.max_magnitude = None;
    let snapshot = SnapshotAssembler::default().assemble(&calm).unwrap();
    assert!(snapshot.risk().is_baseline());
    assert_eq!(snapshot.risk().tier, Tier::Low);
}

#[test]
fn test_rejected_bundle_is_all_or_nothing() {
    let assembler = SnapshotAssembler::default();
    let good = assembler.assemble(&bundle()).unwrap();

    let mut missing_title = bundle();
    missing_title.messages[1].title = None;
    assert!(matches!(assembler.assemble(&missing_title), Err(EngineError::InvalidMessage(_))));

    let mut bad_estimate = bundle();
    bad_estimate.resources[0].estimated = 0.0;
    assert!(matches!(assembler.assemble(&bad_estimate), Err(EngineError::InvalidQuantity(_))));

    let mut bad_subsystem = bundle();
    bad_subsystem.subsystems.get_mut("cvModel").unwrap().state = "rebooting".to_string();
    assert!(matches!(assembler.assemble(&bad_subsystem), Err(EngineError::InvalidLabel { .. })));

    assert_eq!(assembler.version(), good.version());
    assert_eq!(assembler.latest().unwrap().id(), good.id());
}

#[test]
fn test_offline_subsystem_dominates() {
    let mut raw = bundle();
    raw.subsystems.get_mut("nlpModel").unwrap().state = "offline".to_string();

    let snapshot = SnapshotAssembler::default().assemble(&raw).unwrap();
    assert_eq!(snapshot.health().overall, SubsystemState::Offline);
    assert!(snapshot.headline().contains("Systems offline"));
}

#[test]
fn test_snapshot_serializes() {
    let snapshot = SnapshotAssembler::default().assemble(&bundle()).unwrap();
    let json = serde_json::to_value(&*snapshot).unwrap();

    assert_eq!(json["version"], 1);
    assert_eq!(json["zones"][0]["severity"], "CRITICAL");
    assert_eq!(json["resources"][0]["metrics"]["status"], "shortage");
    assert_eq!(json["health"]["overall"], "processing");
    assert_eq!(json["risk"]["tier"], "HIGH");
    assert_eq!(json["messages"][0]["id"]["source"], "field");
    assert!(json["weather"].is_array());
}

fn tier_strategy() -> impl Strategy<Value = Tier> {
    prop_oneof![Just(Tier::Critical), Just(Tier::High), Just(Tier::Medium), Just(Tier::Low)]
}

fn zone_strategy() -> impl Strategy<Value = Zone> {
    (0u64..50, tier_strategy(), 0i64..240, any::<bool>()).prop_map(|(id, severity, minutes, active)| Zone {
        id,
        hazard: HazardKind::Flood,
        severity,
        location: format!("Sector {id}"),
        detected_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes),
        confidence: 80.0,
        status: if active { ZoneStatus::Active } else { ZoneStatus::Monitoring },
        responders: 1,
        evacuated: 0,
        affected: 10,
    })
}

proptest! {
    #[test]
    fn prop_classify_is_sorted_and_idempotent(zones in prop::collection::vec(zone_strategy(), 0..30)) {
        let sorted = zones::classify(&zones);
        prop_assert_eq!(sorted.len(), zones.len());
        for pair in sorted.windows(2) {
            prop_assert!(pair[0].severity.rank() >= pair[1].severity.rank());
        }
        prop_assert_eq!(zones::classify(&sorted), sorted);
    }

    #[test]
    fn prop_high_priority_count_matches_tiers(zones in prop::collection::vec(zone_strategy(), 0..30)) {
        let counts = zones::counts_by_tier(&zones);
        prop_assert_eq!(
            zones::count_high_priority(&zones),
            counts.get(Tier::Critical) + counts.get(Tier::High)
        );
    }

    #[test]
    fn prop_rank_orders_by_score(scores in prop::collection::vec(0u8..=100, 0..20)) {
        let mut board = MessageBoard::new(&EngineConfig::default());
        for score in &scores {
            board.ingest(&sitrep_engine::RawMessage {
                tier: "MEDIUM".to_string(),
                score: Some(i64::from(*score)),
                title: Some("report".to_string()),
                category: Some("General".to_string()),
                ..Default::default()
            }).unwrap();
        }

        let ranked = board.ranked();
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score > pair[1].score
                || (pair[0].score == pair[1].score && pair[0].created_order > pair[1].created_order));
        }
        prop_assert_eq!(messages::rank(&ranked), ranked);
    }
}
