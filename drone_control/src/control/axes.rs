//! Three decoupled PID units, one per spatial axis.

use drone_common::types::{Axis, AxisGains, Position, VelocityCommand};

use super::pid::PidUnit;
use crate::error::Result;

/// The x, y, z PID units driven by the control loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisPids {
    units: [PidUnit; 3],
}

impl AxisPids {
    /// Build all three units with the same tick interval.
    pub fn new(gains: AxisGains, dt: f64) -> Result<Self> {
        Ok(Self {
            units: [
                PidUnit::new(gains.x, dt)?,
                PidUnit::new(gains.y, dt)?,
                PidUnit::new(gains.z, dt)?,
            ],
        })
    }

    /// One PID step per axis toward `target`.
    ///
    /// Angular components of the result are zero.
    pub fn compute(&mut self, target: &Position, current: &Position) -> VelocityCommand {
        let mut out = [0.0; 3];
        for axis in Axis::ALL {
            out[axis.index()] = self.units[axis.index()].compute(target[axis], current[axis]);
        }
        VelocityCommand::linear(out[0], out[1], out[2])
    }

    /// Apply new gains to every axis (integral reset per axis).
    pub fn set_gains(&mut self, gains: &AxisGains) {
        for axis in Axis::ALL {
            self.units[axis.index()].set_gains(gains.get(axis));
        }
    }

    /// Zero integral and previous error on every axis.
    pub fn reset(&mut self) {
        self.units.iter_mut().for_each(PidUnit::reset);
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> &PidUnit {
        &self.units[axis.index()]
    }

    pub fn gains(&self) -> AxisGains {
        AxisGains {
            x: self.units[0].gains(),
            y: self.units[1].gains(),
            z: self.units[2].gains(),
        }
    }
}
