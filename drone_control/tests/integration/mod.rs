//! Shared fixtures for the integration tests.

mod commands;
mod lifecycle;
mod tracking;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use drone_common::types::VelocityCommand;
use drone_control::config::DroneConfig;
use parking_lot::Mutex;

/// Commands captured by [`recorder`].
pub type Recorded = Arc<Mutex<Vec<VelocityCommand>>>;

/// Fast-ticking config so tests finish quickly.
pub fn test_config() -> DroneConfig {
    let mut config = DroneConfig::default();
    config.control.dt = 0.01;
    config.control.feed_poll_ms = 5;
    config
}

/// A sink that appends every command to a shared vector.
pub fn recorder() -> (Recorded, impl FnMut(VelocityCommand) + Send + 'static) {
    let seen: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    (seen, move |cmd| sink_seen.lock().push(cmd))
}

/// Poll `condition` every millisecond until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}
