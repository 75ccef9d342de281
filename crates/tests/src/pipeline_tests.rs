//! Full publish path: daemon -> channel publisher -> dispatcher -> sinks

use std::collections::HashMap;
use std::time::Duration;

use contracts::{type_tag, RawSensorEvent, SensordBlueprint, SinkConfig, SinkType};
use dispatcher::{create_dispatcher, device_state_channel, ChannelPublisher, StateListener};
use driver_session::{MockDriver, MockPoll};
use ingestion::{DaemonExit, LoopControl, SensorDaemon};

fn file_sink(dir: &std::path::Path) -> SinkConfig {
    SinkConfig {
        name: "file".to_string(),
        sink_type: SinkType::File,
        queue_capacity: 64,
        params: HashMap::from([("path".to_string(), dir.display().to_string())]),
    }
}

fn log_sink() -> SinkConfig {
    SinkConfig {
        name: "log".to_string(),
        sink_type: SinkType::Log,
        queue_capacity: 64,
        params: HashMap::new(),
    }
}

fn accel(timestamp: i64) -> MockPoll {
    MockPoll::Events(vec![RawSensorEvent::new(type_tag::ACCELEROMETER, 15, timestamp)
        .with_vector([0.0, 0.0, 9.81], 3)])
}

/// daemon -> ChannelPublisher -> dispatcher -> FileSink + LogSink
#[tokio::test]
async fn test_e2e_daemon_to_file_sink() {
    let dir = tempfile::tempdir().unwrap();
    let mut blueprint = SensordBlueprint::default();
    blueprint.sinks = vec![file_sink(dir.path()), log_sink()];

    let (publisher, publish_rx) = ChannelPublisher::channel(64);
    let publisher_metrics = publisher.metrics();
    let dispatcher_task = create_dispatcher(blueprint.sinks.clone(), publish_rx)
        .await
        .unwrap()
        .spawn();

    let control = LoopControl::new();
    let driver = MockDriver::new().on_exhausted(control.shutdown.clone());
    driver.script((0..5).map(|i| accel(1_000 + i)));

    let (_feed, cache) = device_state_channel();
    let mut daemon =
        SensorDaemon::new(&blueprint, Box::new(driver.clone()), publisher, cache).unwrap();

    let exit = tokio::task::spawn_blocking(move || daemon.run(&control))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(exit, DaemonExit::Shutdown);

    // daemon dropped with the blocking task; the dispatcher drains and stops
    let totals = tokio::time::timeout(Duration::from_secs(5), dispatcher_task)
        .await
        .expect("dispatcher did not drain")
        .unwrap();

    assert_eq!(publisher_metrics.accepted(), 5);
    assert_eq!(totals.len(), 2);
    for (name, snapshot) in &totals {
        assert_eq!(snapshot.write_count, 5, "sink {name}");
    }

    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0]
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("sensorEvents_"));

    let content = std::fs::read_to_string(&files[0]).unwrap();
    let records: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 5);

    let seqs: Vec<_> = records.iter().map(|r| r["seq"].as_u64().unwrap()).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    assert!(records[0]["received_at"].is_string());
    assert_eq!(records[0]["events"][0]["sensor"], 15);
    assert_eq!(records[0]["events"][0]["timestamp"], 1_000);
}

/// UDP state update -> DeviceStateCache -> power controller
#[tokio::test]
async fn test_udp_state_update_reaches_power_controller() {
    let (feed, cache) = device_state_channel();
    let listener = StateListener::bind("127.0.0.1:0", feed).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let listener_task = listener.spawn();

    let sender = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender
        .send_to(br#"{"topic":"deviceState","started":true}"#, addr)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let control = LoopControl::new();
    let driver = MockDriver::new().on_exhausted(control.shutdown.clone());
    driver.script((0..25).map(accel));

    let (publisher, mut publish_rx) = ChannelPublisher::channel(64);
    let mut daemon = SensorDaemon::new(
        &SensordBlueprint::default(),
        Box::new(driver.clone()),
        publisher,
        cache,
    )
    .unwrap();

    let metrics = tokio::task::spawn_blocking(move || {
        daemon.run(&control).unwrap();
        daemon.metrics()
    })
    .await
    .unwrap();
    listener_task.abort();

    // without the update the initial "not started" value would force low-power
    assert_eq!(metrics.snapshot().power_transitions, 0);

    let mut received = 0;
    while publish_rx.try_recv().is_ok() {
        received += 1;
    }
    assert_eq!(received, 25);
}
