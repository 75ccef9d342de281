//! Session lifecycle against the scripted mock driver

use std::sync::{Arc, Mutex};

use contracts::{
    type_tag, EventPublisher, RawSensorEvent, SensorEventBatch, SensorPayload, SensordBlueprint,
    Topic,
};
use driver_session::{DriverCall, MockDriver, MockPoll, SessionError};
use ingestion::{
    DaemonExit, IngestionError, LoopControl, MockStateSubscriber, RecordingPublisher, SensorDaemon,
};

fn blueprint() -> SensordBlueprint {
    let mut blueprint = SensordBlueprint::default();
    blueprint.session.initial_backoff_ms = 1;
    blueprint.session.max_backoff_ms = 2;
    blueprint.acquisition.initial_backoff_ms = 1;
    blueprint.acquisition.max_backoff_ms = 2;
    blueprint
}

fn active_state() -> MockStateSubscriber {
    let state = MockStateSubscriber::new();
    state.set_started(true);
    state
}

fn gyro(timestamp: i64) -> MockPoll {
    MockPoll::Events(vec![
        RawSensorEvent::new(type_tag::GYROSCOPE, 9, timestamp).with_vector([0.0, 0.1, 0.0], 3),
    ])
}

/// Records the driver call count at every publish
struct CallMarkingPublisher {
    driver: MockDriver,
    marks: Arc<Mutex<Vec<usize>>>,
}

impl EventPublisher for CallMarkingPublisher {
    fn publish(&self, _channel: &Topic, _batch: SensorEventBatch) {
        if let Ok(mut marks) = self.marks.lock() {
            marks.push(self.driver.calls().len());
        }
    }
}

#[test]
fn test_reference_batch_end_to_end() {
    let control = LoopControl::new();
    let driver = MockDriver::new().on_exhausted(control.shutdown.clone());
    driver.script([MockPoll::Events(vec![
        RawSensorEvent::new(type_tag::ACCELEROMETER, 15, 1_000).with_vector([1.0, 2.0, 3.0], 3),
        RawSensorEvent::new(999, 4, 1_001),
        RawSensorEvent::new(type_tag::LIGHT, 14, 1_002).with_scalar(500.0),
    ])]);

    let publisher = RecordingPublisher::new();
    let mut daemon = SensorDaemon::new(
        &blueprint(),
        Box::new(driver.clone()),
        publisher.clone(),
        active_state(),
    )
    .unwrap();

    assert_eq!(daemon.run(&control).unwrap(), DaemonExit::Shutdown);

    let published = publisher.published();
    assert_eq!(published.len(), 1);
    let events = &published[0].batch.events;
    assert_eq!(events.len(), 2);

    assert_eq!(events[0].sensor, 15);
    assert_eq!(events[0].sensor_type, type_tag::ACCELEROMETER);
    assert_eq!(events[0].timestamp, 1_000);
    match events[0].payload {
        SensorPayload::Acceleration(v) => {
            assert_eq!(v.v, [1.0, 2.0, 3.0]);
            assert_eq!(v.status, 3);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
    assert_eq!(events[1].payload, SensorPayload::Light(500.0));
    assert_eq!(daemon.summary().total_unrecognized, 1);
}

#[test]
fn test_activation_order_at_session_start() {
    let control = LoopControl::new();
    let driver = MockDriver::new().on_exhausted(control.shutdown.clone());
    let blueprint = blueprint();

    let mut daemon = SensorDaemon::new(
        &blueprint,
        Box::new(driver.clone()),
        RecordingPublisher::new(),
        active_state(),
    )
    .unwrap();
    daemon.run(&control).unwrap();

    let mut expected = vec![DriverCall::Open];
    for sensor in blueprint.to_registry().unwrap().iter() {
        expected.push(DriverCall::Activate {
            handle: sensor.handle,
            enabled: false,
        });
        expected.push(DriverCall::Activate {
            handle: sensor.handle,
            enabled: true,
        });
        expected.push(DriverCall::SetDelay {
            handle: sensor.handle,
            delay_ns: sensor.sampling_interval_ns,
        });
    }
    expected.push(DriverCall::Close);

    assert_eq!(driver.control_calls(), expected);
}

#[test]
fn test_activation_rejection_does_not_abort_protocol() {
    let control = LoopControl::new();
    let driver = MockDriver::new()
        .reject_activate(9)
        .on_exhausted(control.shutdown.clone());
    driver.script([gyro(1)]);

    let publisher = RecordingPublisher::new();
    let mut daemon = SensorDaemon::new(
        &blueprint(),
        Box::new(driver.clone()),
        publisher.clone(),
        active_state(),
    )
    .unwrap();
    daemon.run(&control).unwrap();

    let enabled = driver
        .control_calls()
        .iter()
        .filter(|c| matches!(c, DriverCall::Activate { enabled: true, .. }))
        .count();
    assert_eq!(enabled, 7);
    assert_eq!(publisher.batch_count(), 1);
}

#[test]
fn test_power_follows_device_state_cache() {
    let control = LoopControl::new();
    let driver = MockDriver::new().on_exhausted(control.shutdown.clone());
    driver.script((0..45).map(gyro));

    let (feed, cache) = dispatcher::device_state_channel();
    feed.publish("deviceState", contracts::DeviceState { started: false });

    let publisher = RecordingPublisher::new();
    let mut daemon =
        SensorDaemon::new(&blueprint(), Box::new(driver.clone()), publisher.clone(), cache)
            .unwrap();
    daemon.run(&control).unwrap();

    // one transition at frame 0; frames 20 and 40 keep the prior value
    assert_eq!(daemon.metrics().snapshot().power_transitions, 1);
    assert_eq!(publisher.batch_count(), 45);

    let calls = driver.control_calls();
    let transition_start = 1 + 7 * 3;
    let enabled_after: Vec<_> = calls[transition_start..]
        .iter()
        .filter_map(|c| match c {
            DriverCall::Activate {
                handle,
                enabled: true,
            } => Some(*handle),
            _ => None,
        })
        .collect();
    assert_eq!(enabled_after, vec![8, 14, 15]);

    let disabled_after = calls[transition_start..]
        .iter()
        .filter(|c| matches!(c, DriverCall::Activate { enabled: false, .. }))
        .count();
    assert_eq!(disabled_after, 7);
}

#[test]
fn test_power_checked_only_on_cadence() {
    let control = LoopControl::new();
    let driver = MockDriver::new().on_exhausted(control.shutdown.clone());
    driver.script((0..19).map(gyro));

    let state = MockStateSubscriber::new();
    state.set_started(true);

    let mut daemon = SensorDaemon::new(
        &blueprint(),
        Box::new(driver.clone()),
        RecordingPublisher::new(),
        state.clone(),
    )
    .unwrap();
    daemon.run(&control).unwrap();

    // only frame 0 of frames 0..19 samples the state
    assert_eq!(state.read_count(), 1);
    assert_eq!(daemon.metrics().snapshot().power_transitions, 0);
}

#[test]
fn test_no_publish_between_teardown_and_reactivation() {
    let control = LoopControl::new();
    let driver = MockDriver::new().on_exhausted(control.shutdown.clone());
    driver.script([gyro(1), MockPoll::Signal(control.reinit.clone()), gyro(2)]);

    let marks = Arc::new(Mutex::new(Vec::new()));
    let publisher = CallMarkingPublisher {
        driver: driver.clone(),
        marks: Arc::clone(&marks),
    };
    let mut daemon =
        SensorDaemon::new(&blueprint(), Box::new(driver.clone()), publisher, active_state())
            .unwrap();

    assert_eq!(daemon.run(&control).unwrap(), DaemonExit::Shutdown);

    let calls = driver.calls();
    let close = calls.iter().position(|c| *c == DriverCall::Close).unwrap();
    let second_open = calls.iter().rposition(|c| *c == DriverCall::Open).unwrap();
    let reactivated = second_open + 7 * 3;
    assert!(close < second_open);
    assert!(matches!(calls[reactivated], DriverCall::SetDelay { handle: 15, .. }));

    let marks = marks.lock().unwrap().clone();
    assert_eq!(marks.len(), 2);
    for mark in marks {
        assert!(mark <= close || mark > reactivated, "publish at call {mark}");
    }
    assert_eq!(driver.open_count(), 2);
    assert_eq!(driver.close_count(), 2);
}

#[test]
fn test_shutdown_during_session_closes_device() {
    let control = LoopControl::new();
    let driver = MockDriver::new();
    driver.script([gyro(1), gyro(2), MockPoll::Signal(control.shutdown.clone()), gyro(3)]);

    let publisher = RecordingPublisher::new();
    let mut daemon = SensorDaemon::new(
        &blueprint(),
        Box::new(driver.clone()),
        publisher.clone(),
        active_state(),
    )
    .unwrap();

    assert_eq!(daemon.run(&control).unwrap(), DaemonExit::Shutdown);
    assert_eq!(publisher.batch_count(), 2);
    assert_eq!(driver.close_count(), 1);
    assert_eq!(driver.calls().last(), Some(&DriverCall::Close));
}

#[test]
fn test_session_open_retries_then_succeeds() {
    let control = LoopControl::new();
    let driver = MockDriver::new()
        .fail_load(2)
        .fail_open(1)
        .on_exhausted(control.shutdown.clone());

    let mut daemon = SensorDaemon::new(
        &blueprint(),
        Box::new(driver.clone()),
        RecordingPublisher::new(),
        active_state(),
    )
    .unwrap();

    assert_eq!(daemon.run(&control).unwrap(), DaemonExit::Shutdown);
    assert_eq!(driver.open_count(), 1);
    assert_eq!(daemon.metrics().snapshot().sessions_opened, 1);
}

#[test]
fn test_session_retries_exhausted() {
    let mut blueprint = blueprint();
    blueprint.session.max_attempts = 3;
    let driver = MockDriver::new().fail_load(10);

    let mut daemon = SensorDaemon::new(
        &blueprint,
        Box::new(driver.clone()),
        RecordingPublisher::new(),
        active_state(),
    )
    .unwrap();

    let err = daemon.run(&LoopControl::new()).unwrap_err();
    assert!(matches!(
        err,
        IngestionError::Session(SessionError::RetriesExhausted { attempts: 3, .. })
    ));
    assert_eq!(driver.open_count(), 0);
}

#[test]
fn test_test_mode_enumerates_and_exits() {
    let driver = MockDriver::new().with_sensors(driver_session::SimulatedModule::sensor_list());
    let mut daemon = SensorDaemon::new(
        &blueprint(),
        Box::new(driver.clone()),
        RecordingPublisher::new(),
        active_state(),
    )
    .unwrap()
    .with_test_mode(true);

    assert_eq!(daemon.run(&LoopControl::new()).unwrap(), DaemonExit::TestMode(8));
    assert_eq!(driver.control_calls(), vec![DriverCall::Open, DriverCall::Close]);
}
