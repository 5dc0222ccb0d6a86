//! End-to-end dead reckoning: raw telemetry text through the frame parser
//! and sensor store into the fusion engine.

use bhumi_station::{FrameParser, FusionConfig, FusionEngine, SensorStore};

/// Feed one raw message through parser and store, then run one fusion tick.
fn feed_and_tick(
    parser: &FrameParser,
    store: &SensorStore,
    engine: &mut FusionEngine,
    message: &str,
) -> bool {
    for frame in parser.parse_message(message) {
        store.update(frame);
    }
    engine.tick(&store.snapshot())
}

fn pipeline() -> (FrameParser, SensorStore, FusionEngine) {
    (
        FrameParser::new(8),
        SensorStore::new(),
        FusionEngine::new(FusionConfig::default()),
    )
}

#[test]
fn test_odometer_increment_advances_pose_along_heading() {
    let (parser, store, mut engine) = pipeline();

    assert!(feed_and_tick(&parser, &store, &mut engine, "RB\t0,100,87"));
    assert!(feed_and_tick(&parser, &store, &mut engine, "RB\t0,150,87"));

    let pose = engine.pose();
    assert!((pose.x - 50.0).abs() < 1e-3, "pose.x = {}", pose.x);
    assert!(pose.y.abs() < 1e-3, "pose.y = {}", pose.y);
}

#[test]
fn test_all_no_return_sweep_appends_no_obstacles() {
    let (parser, store, mut engine) = pipeline();

    feed_and_tick(&parser, &store, &mut engine, "RB\t0,100,87");
    let msg = "RB\t0,100,87\r\nMF\t-1\t-1\t-1\t-1\t-1\t-1\t-1\t-1";
    feed_and_tick(&parser, &store, &mut engine, msg);

    assert!(engine.snapshot().obstacles.is_empty());
}

#[test]
fn test_repeated_odometer_value_is_idempotent() {
    let (parser, store, mut engine) = pipeline();

    feed_and_tick(&parser, &store, &mut engine, "RB\t0,100,87");
    feed_and_tick(&parser, &store, &mut engine, "RB\t0,150,87");
    let before = engine.snapshot();

    // The robot keeps repeating the same report while standing still
    for _ in 0..5 {
        feed_and_tick(&parser, &store, &mut engine, "RB\t0,150,87");
    }
    let after = engine.snapshot();

    assert_eq!(before.pose.x, after.pose.x);
    assert_eq!(before.pose.y, after.pose.y);
    assert_eq!(before.path.len(), after.path.len());
}

#[test]
fn test_wrong_length_sweep_leaves_store_unchanged() {
    let parser = FrameParser::new(8);
    let store = SensorStore::new();

    for frame in parser.parse_message("MF\t100\t200\t300\t400\t500\t600\t700\t800") {
        store.update(frame);
    }
    let before = store.snapshot();
    assert!(before.ranging.is_some());

    // Truncated sweep must be dropped, not stored
    assert!(parser.parse_message("MF\t100\t200\t300").is_empty());
    let after = store.snapshot();
    assert_eq!(
        before.ranging.as_ref().map(|r| r.ranges().to_vec()),
        after.ranging.as_ref().map(|r| r.ranges().to_vec())
    );
}

#[test]
fn test_obstacle_history_is_bounded() {
    let parser = FrameParser::new(8);
    let store = SensorStore::new();
    let mut engine = FusionEngine::new(FusionConfig {
        history_capacity: 16,
        ..FusionConfig::default()
    });

    feed_and_tick(&parser, &store, &mut engine, "RB\t0,0,87");
    for i in 0..10 {
        let odometer = i as f32 * 10.0;
        let msg = format!(
            "RB\t0,{},87\r\nMF\t100\t100\t100\t100\t100\t100\t100\t100",
            odometer
        );
        feed_and_tick(&parser, &store, &mut engine, &msg);
    }

    let snapshot = engine.snapshot();
    // 10 sweeps x 8 beams would be 80 points unbounded
    assert_eq!(snapshot.obstacles.len(), 16);
    assert!(snapshot.path.len() <= 16);
}

#[test]
fn test_remote_error_message_does_not_disturb_fusion() {
    let (parser, store, mut engine) = pipeline();

    feed_and_tick(&parser, &store, &mut engine, "RB\t0,100,87");
    feed_and_tick(&parser, &store, &mut engine, "RB\t0,150,87");

    // The whole message is discarded, including the leading valid segment
    let frames = parser.parse_message("RB\t0,999,87\r\n[ERROR] imu saturated");
    assert!(frames.is_empty());
    for frame in frames {
        store.update(frame);
    }
    engine.tick(&store.snapshot());

    assert!((engine.pose().x - 50.0).abs() < 1e-3);
}

#[test]
fn test_composite_message_feeds_both_stores() {
    let parser = FrameParser::new(8);
    let store = SensorStore::new();

    let msg = "RB\t45,1200,87\r\nMF\t100\t200\t300\t400\t500\t600\t700\t800";
    let frames = parser.parse_message(msg);
    assert_eq!(frames.len(), 2);
    for frame in frames {
        store.update(frame);
    }

    let snapshot = store.snapshot();
    assert_eq!(snapshot.heading(), Some(45.0));
    assert_eq!(snapshot.odometer(), Some(1200.0));
    assert_eq!(snapshot.ranging.as_ref().map(|r| r.len()), Some(8));
}
