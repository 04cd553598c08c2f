//! TOML configuration with validation.
//!
//! ```toml
//! [shared]
//! log_level = "info"
//! service_name = "drone-pilot"
//!
//! [control]
//! entity_id = "drone1"
//! dt = 0.1
//! hold_threshold = 0.05
//! step_size = 1.0
//! idle_zero_output = true
//! feed_poll_ms = 50
//!
//! [gains.x]
//! kp = 0.5
//! ki = 0.01
//! kd = 0.1
//!
//! [sim]
//! period_ms = 20
//! response_time = 0.3
//! start = { x = 0.0, y = 0.0, z = 0.0 }
//! decoys = ["drone2"]
//! ```
//!
//! Missing sections fall back to [`Default`]. Validation runs before any
//! activity starts; a failure is a fatal [`ControlError::Configuration`].

use std::path::Path;
use std::time::Duration;

use drone_common::config::{ConfigLoader, SharedConfig};
use drone_common::types::{AxisGains, PidGains, Position};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, Result};

/// Default control tick [s].
pub const DEFAULT_DT: f64 = 0.1;
/// Default hold threshold [m].
pub const DEFAULT_HOLD_THRESHOLD: f64 = 0.05;
/// Default directional step [m].
pub const DEFAULT_STEP_SIZE: f64 = 1.0;
/// Default ingestion receive timeout [ms].
pub const DEFAULT_FEED_POLL_MS: u64 = 50;
/// Default per-axis gains.
pub const DEFAULT_GAINS: PidGains = PidGains::new(0.5, 0.01, 0.1);

/// Loop timing and ingestion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSection {
    /// Identity of the tracked body in the position feed.
    pub entity_id: String,
    /// Tick interval shared by the loop and every PID unit [s].
    pub dt: f64,
    /// Distance at which tracking switches to holding [m].
    pub hold_threshold: f64,
    /// Target increment applied by a directional directive [m].
    pub step_size: f64,
    /// Emit a zero command on idle ticks instead of nothing.
    pub idle_zero_output: bool,
    /// Receive timeout of the ingestion activities [ms].
    pub feed_poll_ms: u64,
}

impl Default for ControlSection {
    fn default() -> Self {
        Self {
            entity_id: "drone1".to_string(),
            dt: DEFAULT_DT,
            hold_threshold: DEFAULT_HOLD_THRESHOLD,
            step_size: DEFAULT_STEP_SIZE,
            idle_zero_output: true,
            feed_poll_ms: DEFAULT_FEED_POLL_MS,
        }
    }
}

/// Convert a tick interval [s] to a [`Duration`].
///
/// Rejects non-finite, non-positive and unrepresentably large values.
pub fn tick_period(dt: f64) -> Result<Duration> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(ControlError::config(format!(
            "control.dt must be finite and > 0, got {dt}"
        )));
    }
    Duration::try_from_secs_f64(dt)
        .map_err(|e| ControlError::config(format!("control.dt {dt} is not a valid period: {e}")))
}

impl ControlSection {
    /// Tick period as a [`Duration`].
    pub fn period(&self) -> Result<Duration> {
        tick_period(self.dt)
    }

    pub fn feed_poll(&self) -> Duration {
        Duration::from_millis(self.feed_poll_ms)
    }
}

fn default_gains() -> PidGains {
    DEFAULT_GAINS
}

/// Initial gains. An axis table left out keeps [`DEFAULT_GAINS`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainsSection {
    #[serde(default = "default_gains")]
    pub x: PidGains,
    #[serde(default = "default_gains")]
    pub y: PidGains,
    #[serde(default = "default_gains")]
    pub z: PidGains,
}

impl Default for GainsSection {
    fn default() -> Self {
        Self {
            x: DEFAULT_GAINS,
            y: DEFAULT_GAINS,
            z: DEFAULT_GAINS,
        }
    }
}

impl GainsSection {
    pub fn axis_gains(&self) -> AxisGains {
        AxisGains {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }
}

/// Simulated drone used by the binary when no real feed is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSection {
    /// Integration and publish period [ms].
    pub period_ms: u64,
    /// First-order velocity response time constant [s]. 0 = instant.
    pub response_time: f64,
    /// Initial position of the simulated body.
    pub start: Position,
    /// Extra entities published on the same feed.
    pub decoys: Vec<String>,
}

impl Default for SimSection {
    fn default() -> Self {
        Self {
            period_ms: 20,
            response_time: 0.3,
            start: Position::ORIGIN,
            decoys: vec!["drone2".to_string()],
        }
    }
}

impl SimSection {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneConfig {
    pub shared: SharedConfig,
    pub control: ControlSection,
    pub gains: GainsSection,
    pub sim: SimSection,
}

impl DroneConfig {
    /// Check every bound. The first violation wins.
    pub fn validate(&self) -> Result<()> {
        self.shared.validate()?;

        let c = &self.control;
        if c.entity_id.trim().is_empty() {
            return Err(ControlError::config("control.entity_id cannot be empty"));
        }
        c.period()?;
        if !(c.hold_threshold.is_finite() && c.hold_threshold >= 0.0) {
            return Err(ControlError::config(format!(
                "control.hold_threshold must be finite and >= 0, got {}",
                c.hold_threshold
            )));
        }
        if !(c.step_size.is_finite() && c.step_size > 0.0) {
            return Err(ControlError::config(format!(
                "control.step_size must be finite and > 0, got {}",
                c.step_size
            )));
        }
        if c.feed_poll_ms == 0 {
            return Err(ControlError::config("control.feed_poll_ms must be > 0"));
        }
        if !self.gains.axis_gains().is_finite() {
            return Err(ControlError::config(format!(
                "gains must be finite, got {:?}",
                self.gains
            )));
        }

        let sim = &self.sim;
        if sim.period_ms == 0 {
            return Err(ControlError::config("sim.period_ms must be > 0"));
        }
        if !(sim.response_time.is_finite() && sim.response_time >= 0.0) {
            return Err(ControlError::config(format!(
                "sim.response_time must be finite and >= 0, got {}",
                sim.response_time
            )));
        }
        if !sim.start.is_finite() {
            return Err(ControlError::config("sim.start must be finite"));
        }
        Ok(())
    }
}

/// Read, parse and validate a config file.
pub fn load_config(path: &Path) -> Result<DroneConfig> {
    let config = DroneConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate an in-memory TOML document.
pub fn load_config_from_str(content: &str) -> Result<DroneConfig> {
    let config = DroneConfig::from_toml_str(content)?;
    config.validate()?;
    Ok(config)
}
