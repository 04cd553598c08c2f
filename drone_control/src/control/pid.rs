//! Single-axis PID unit with a fixed tick interval.
//!
//! Rectangular integration, unfiltered backward-difference derivative, no
//! output clamping. Zero Ki disables the integral contribution and zero Kd
//! the derivative, but the accumulators keep running.

use drone_common::types::PidGains;

use crate::error::{ControlError, Result};

/// PID gains plus the per-axis history the control law needs.
///
/// Owned by the control loop thread. Never shared, never locked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidUnit {
    gains: PidGains,
    /// Accumulated `error * dt`.
    integral: f64,
    /// Error of the previous `compute` call.
    prev_error: f64,
    /// Fixed tick interval [s], > 0.
    dt: f64,
}

impl PidUnit {
    /// Create a unit with zeroed history.
    ///
    /// Fails with [`ControlError::Configuration`] when `dt` is not a finite
    /// positive number or a gain is not finite. `dt` is never checked again.
    pub fn new(gains: PidGains, dt: f64) -> Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ControlError::config(format!(
                "PID tick interval must be finite and > 0, got {dt}"
            )));
        }
        if !gains.is_finite() {
            return Err(ControlError::config(format!(
                "PID gains must be finite, got {gains:?}"
            )));
        }
        Ok(Self {
            gains,
            integral: 0.0,
            prev_error: 0.0,
            dt,
        })
    }

    /// Run one step of the control law.
    ///
    /// Must be called once per tick, never concurrently for the same axis.
    #[inline]
    pub fn compute(&mut self, setpoint: f64, measurement: f64) -> f64 {
        let error = setpoint - measurement;

        self.integral += error * self.dt;
        let derivative = (error - self.prev_error) / self.dt;
        self.prev_error = error;

        self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative
    }

    /// Replace gains and drop the accumulated integral.
    ///
    /// `prev_error` survives so the next derivative still refers to the last
    /// real error.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
        self.integral = 0.0;
    }

    /// Zero integral and previous error.
    #[inline]
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }

    #[inline]
    pub const fn gains(&self) -> PidGains {
        self.gains
    }

    #[inline]
    pub const fn integral(&self) -> f64 {
        self.integral
    }

    #[inline]
    pub const fn prev_error(&self) -> f64 {
        self.prev_error
    }

    #[inline]
    pub const fn dt(&self) -> f64 {
        self.dt
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
