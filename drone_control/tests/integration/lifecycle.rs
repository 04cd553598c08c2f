//! Integration test: coordinator startup and shutdown.
//!
//! Validates: invalid config never starts a thread → silent feeds produce
//! zero commands only → stopping mid-tracking yields exactly one final zero →
//! a panicking activity is reported at join.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded};
use drone_common::types::{Position, PositionUpdate, VelocityCommand};
use drone_control::{ControlError, Coordinator};

use super::{recorder, test_config, wait_until};

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn invalid_dt_prevents_start() {
    let mut config = test_config();
    config.control.dt = 0.0;
    let (_pos_tx, pos_rx) = unbounded::<PositionUpdate>();
    let (_cmd_tx, cmd_rx) = unbounded::<String>();
    let (seen, sink) = recorder();

    let result = Coordinator::start(&config, pos_rx, cmd_rx, sink);
    assert!(matches!(result, Err(ControlError::Configuration(_))));
    assert!(seen.lock().is_empty());
}

#[test]
fn unrepresentable_dt_prevents_start() {
    let mut config = test_config();
    config.control.dt = 1e30;
    let (_pos_tx, pos_rx) = unbounded::<PositionUpdate>();
    let (_cmd_tx, cmd_rx) = unbounded::<String>();
    let (seen, sink) = recorder();

    let result = Coordinator::start(&config, pos_rx, cmd_rx, sink);
    assert!(matches!(result, Err(ControlError::Configuration(_))));
    assert!(seen.lock().is_empty());
}

#[test]
fn empty_entity_prevents_start() {
    let mut config = test_config();
    config.control.entity_id = "  ".to_string();
    let (_pos_tx, pos_rx) = unbounded::<PositionUpdate>();
    let (_cmd_tx, cmd_rx) = unbounded::<String>();

    let result = Coordinator::start(&config, pos_rx, cmd_rx, |_c: VelocityCommand| {});
    assert!(matches!(result, Err(ControlError::Configuration(_))));
}

#[test]
fn no_position_emits_only_zero_commands() {
    let (_pos_tx, pos_rx) = unbounded::<PositionUpdate>();
    let (_cmd_tx, cmd_rx) = unbounded::<String>();
    let (seen, sink) = recorder();

    let coordinator = Coordinator::start(&test_config(), pos_rx, cmd_rx, sink).unwrap();
    assert!(coordinator.is_running());
    assert!(wait_until(TIMEOUT, || seen.lock().len() >= 5));
    let report = coordinator.shutdown().unwrap();

    let seen = seen.lock();
    assert!(seen.iter().all(VelocityCommand::is_zero));
    assert!(report.control.ticks >= 5);
    assert_eq!(report.positions.accepted, 0);
}

#[test]
fn stop_mid_tracking_emits_one_final_zero() {
    let (pos_tx, pos_rx) = unbounded();
    let (_cmd_tx, cmd_rx) = unbounded::<String>();
    let (seen, sink) = recorder();

    let coordinator = Coordinator::start(&test_config(), pos_rx, cmd_rx, sink).unwrap();
    let handle = coordinator.handle();
    pos_tx
        .send(PositionUpdate::new("drone1", Position::ORIGIN))
        .unwrap();
    assert!(wait_until(TIMEOUT, || handle.snapshot().position_received));
    handle.set_target(Position::new(5.0, 0.0, 0.0)).unwrap();
    assert!(wait_until(TIMEOUT, || seen.lock().iter().any(|c| !c.is_zero())));

    let report = coordinator.shutdown().unwrap();
    assert!(!handle.is_running());

    let seen = seen.lock();
    let n = seen.len();
    assert!(n >= 2);
    assert_eq!(seen[n - 1], VelocityCommand::ZERO);
    assert!(!seen[n - 2].is_zero());
    assert_eq!(report.control.commands_emitted, n as u64);
}

#[test]
fn shutdown_signal_stops_everything() {
    let (_pos_tx, pos_rx) = unbounded::<PositionUpdate>();
    let (_cmd_tx, cmd_rx) = unbounded::<String>();
    let (signal_tx, signal_rx) = bounded(1);
    let (seen, sink) = recorder();

    let coordinator = Coordinator::start(&test_config(), pos_rx, cmd_rx, sink).unwrap();
    let handle = coordinator.handle();
    let signaller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        signal_tx.send(()).unwrap();
    });

    let report = coordinator.wait_for_shutdown(&signal_rx).unwrap();
    signaller.join().unwrap();
    assert!(!handle.is_running());
    assert!(report.control.ticks > 0);
    assert_eq!(seen.lock().last(), Some(&VelocityCommand::ZERO));
}

#[test]
fn handle_stop_ends_loop_before_join() {
    let (_pos_tx, pos_rx) = unbounded::<PositionUpdate>();
    let (_cmd_tx, cmd_rx) = unbounded::<String>();
    let (seen, sink) = recorder();

    let coordinator = Coordinator::start(&test_config(), pos_rx, cmd_rx, sink).unwrap();
    coordinator.handle().request_stop();
    let report = coordinator.shutdown().unwrap();

    // Stop may land before the first tick; the final zero is still sent.
    assert!(report.control.commands_emitted >= 1);
    assert_eq!(seen.lock().last(), Some(&VelocityCommand::ZERO));
}

#[test]
fn panicking_sink_is_reported_at_join() {
    let (_pos_tx, pos_rx) = unbounded::<PositionUpdate>();
    let (_cmd_tx, cmd_rx) = unbounded::<String>();
    let sink = |c: VelocityCommand| {
        if c.is_zero() {
            panic!("actuator link lost");
        }
    };

    let coordinator = Coordinator::start(&test_config(), pos_rx, cmd_rx, sink).unwrap();
    thread::sleep(Duration::from_millis(50));
    let result = coordinator.shutdown();
    assert!(matches!(result, Err(ControlError::TaskPanicked("control"))));
}
