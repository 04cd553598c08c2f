//! Integration test: operator directives through the command feed.
//!
//! Validates: malformed lines are rejected without touching state → manual
//! override passes through unchanged → a new target returns to PID tracking
//! → gain directives reach the shared state.

use std::time::Duration;

use crossbeam_channel::unbounded;
use drone_common::types::{PidGains, Position, PositionUpdate, VelocityCommand};
use drone_control::state::shared::CommandMode;
use drone_control::Coordinator;

use super::{recorder, test_config, wait_until};

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn malformed_line_is_rejected_between_valid_ones() {
    let (_pos_tx, pos_rx) = unbounded::<PositionUpdate>();
    let (cmd_tx, cmd_rx) = unbounded();
    let coordinator =
        Coordinator::start(&test_config(), pos_rx, cmd_rx, |_c: VelocityCommand| {}).unwrap();
    let handle = coordinator.handle();

    cmd_tx.send("1 2 3".to_string()).unwrap();
    assert!(wait_until(TIMEOUT, || handle.snapshot().target_set));
    let before = handle.snapshot();

    cmd_tx.send("1 2 3 4".to_string()).unwrap();
    cmd_tx.send("sideways".to_string()).unwrap();
    cmd_tx.send("forward".to_string()).unwrap();
    assert!(wait_until(TIMEOUT, || {
        handle.snapshot().target_position == Position::new(2.0, 2.0, 3.0)
    }));

    // Only the step changed anything.
    let after = handle.snapshot();
    assert_eq!(after.target_generation, before.target_generation + 1);
    assert_eq!(after.gains, before.gains);
    assert_eq!(after.mode, CommandMode::Tracking);

    let report = coordinator.shutdown().unwrap();
    assert_eq!(report.commands.accepted, 2);
    assert_eq!(report.commands.rejected, 2);
}

#[test]
fn manual_override_then_new_target() {
    let (pos_tx, pos_rx) = unbounded();
    let (cmd_tx, cmd_rx) = unbounded();
    let (seen, sink) = recorder();
    let coordinator = Coordinator::start(&test_config(), pos_rx, cmd_rx, sink).unwrap();

    pos_tx
        .send(PositionUpdate::new("drone1", Position::new(0.0, 0.0, 1.0)))
        .unwrap();
    let manual = VelocityCommand::new(
        drone_common::types::Vector3::new(0.5, 0.0, -0.2),
        drone_common::types::Vector3::new(0.0, 0.0, 0.1),
    );
    cmd_tx.send("0.5 0 -0.2 0 0 0.1".to_string()).unwrap();
    assert!(wait_until(TIMEOUT, || seen.lock().contains(&manual)));

    cmd_tx.send("3, 0, 1".to_string()).unwrap();
    assert!(wait_until(TIMEOUT, || {
        seen.lock()
            .last()
            .is_some_and(|c| c.linear.x > 0.0 && c.angular.is_zero())
    }));

    let report = coordinator.shutdown().unwrap();
    assert_eq!(report.commands.accepted, 2);
    assert_eq!(seen.lock().last(), Some(&VelocityCommand::ZERO));
}

#[test]
fn stop_directive_zeroes_output_while_running() {
    let (pos_tx, pos_rx) = unbounded();
    let (cmd_tx, cmd_rx) = unbounded();
    let (seen, sink) = recorder();
    let coordinator = Coordinator::start(&test_config(), pos_rx, cmd_rx, sink).unwrap();
    let handle = coordinator.handle();

    pos_tx.send(PositionUpdate::new("drone1", Position::ORIGIN)).unwrap();
    handle.set_target(Position::new(0.0, 4.0, 0.0)).unwrap();
    assert!(wait_until(TIMEOUT, || seen.lock().iter().any(|c| c.linear.y > 0.0)));

    cmd_tx.send("hover".to_string()).unwrap();
    assert!(wait_until(TIMEOUT, || handle.snapshot().mode == CommandMode::Manual));
    let mark = seen.lock().len();
    assert!(wait_until(TIMEOUT, || seen.lock().len() > mark + 3));
    assert!(seen.lock()[mark + 1..].iter().all(VelocityCommand::is_zero));
    assert!(handle.is_running());

    coordinator.shutdown().unwrap();
}

#[test]
fn gains_directive_updates_state() {
    let (_pos_tx, pos_rx) = unbounded::<PositionUpdate>();
    let (cmd_tx, cmd_rx) = unbounded();
    let coordinator =
        Coordinator::start(&test_config(), pos_rx, cmd_rx, |_c: VelocityCommand| {}).unwrap();
    let handle = coordinator.handle();

    cmd_tx
        .send("1.0 0.0 0.2  1.0 0.0 0.2  2.0 0.1 0.3".to_string())
        .unwrap();
    assert!(wait_until(TIMEOUT, || handle.snapshot().gains_generation == 1));

    let gains = handle.snapshot().gains;
    assert_eq!(gains.x, PidGains::new(1.0, 0.0, 0.2));
    assert_eq!(gains.z, PidGains::new(2.0, 0.1, 0.3));
    coordinator.shutdown().unwrap();
}
