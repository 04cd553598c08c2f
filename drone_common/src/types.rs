//! Value types exchanged between the control core and its collaborators.
//!
//! All types are `Copy` except [`PositionUpdate`], which carries the entity
//! id of the reporting body.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

// ─── Axis ───────────────────────────────────────────────────────────

/// One of the three decoupled spatial axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Forward / back.
    X,
    /// Left / right.
    Y,
    /// Up / down.
    Z,
}

impl Axis {
    /// All axes in x, y, z order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Array index of this axis.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

// ─── Position ───────────────────────────────────────────────────────

/// A point in 3-D space [m].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// (0, 0, 0).
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Copy of `self` moved by `delta` along `axis`.
    #[inline]
    pub fn offset(mut self, axis: Axis, delta: f64) -> Self {
        self[axis] += delta;
        self
    }

    /// True when no component is NaN or infinite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Index<Axis> for Position {
    type Output = f64;

    fn index(&self, axis: Axis) -> &f64 {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

impl IndexMut<Axis> for Position {
    fn index_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

// ─── Velocity Command ───────────────────────────────────────────────

/// Three-component vector used for the linear and angular parts of a command.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Actuator command: linear velocity [m/s] and angular rate [rad/s].
///
/// Written only by the control loop; consumed by a velocity sink.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VelocityCommand {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl VelocityCommand {
    /// Full stop.
    pub const ZERO: Self = Self {
        linear: Vector3::ZERO,
        angular: Vector3::ZERO,
    };

    #[inline]
    pub const fn new(linear: Vector3, angular: Vector3) -> Self {
        Self { linear, angular }
    }

    /// Linear-only command, angular rates zero.
    #[inline]
    pub const fn linear(x: f64, y: f64, z: f64) -> Self {
        Self {
            linear: Vector3::new(x, y, z),
            angular: Vector3::ZERO,
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.linear.is_zero() && self.angular.is_zero()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.linear.is_finite() && self.angular.is_finite()
    }
}

impl fmt::Display for VelocityCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lin=({:.3}, {:.3}, {:.3}) ang=({:.3}, {:.3}, {:.3})",
            self.linear.x,
            self.linear.y,
            self.linear.z,
            self.angular.x,
            self.angular.y,
            self.angular.z
        )
    }
}

// ─── PID Gains ──────────────────────────────────────────────────────

/// Gains of a single-axis PID unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (0 = disabled).
    #[serde(default)]
    pub ki: f64,
    /// Derivative gain (0 = disabled).
    #[serde(default)]
    pub kd: f64,
}

impl PidGains {
    #[inline]
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

/// One gain triple per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisGains {
    pub x: PidGains,
    pub y: PidGains,
    pub z: PidGains,
}

impl AxisGains {
    /// Same gains on every axis.
    #[inline]
    pub const fn uniform(gains: PidGains) -> Self {
        Self {
            x: gains,
            y: gains,
            z: gains,
        }
    }

    #[inline]
    pub const fn get(&self, axis: Axis) -> PidGains {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ─── Feed Items ─────────────────────────────────────────────────────

/// One report from the position feed.
///
/// The feed may carry many bodies; consumers filter on `entity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub entity: String,
    pub position: Position,
}

impl PositionUpdate {
    pub fn new(entity: impl Into<String>, position: Position) -> Self {
        Self {
            entity: entity.into(),
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Position::new(1.0, 2.0, 3.0);
        let b = Position::new(4.0, 6.0, 3.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn offset_moves_single_axis() {
        let p = Position::new(1.0, 1.0, 1.0).offset(Axis::Z, -0.5);
        assert_eq!(p, Position::new(1.0, 1.0, 0.5));
        assert_eq!(p[Axis::Z], 0.5);
    }

    #[test]
    fn non_finite_position_detected() {
        assert!(Position::ORIGIN.is_finite());
        assert!(!Position::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Position::new(0.0, f64::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn zero_command() {
        assert!(VelocityCommand::ZERO.is_zero());
        assert!(VelocityCommand::default().is_zero());
        assert!(!VelocityCommand::linear(0.0, 0.0, 0.1).is_zero());
        let spin = VelocityCommand::new(Vector3::ZERO, Vector3::new(0.0, 0.0, 1.0));
        assert!(!spin.is_zero());
    }

    #[test]
    fn axis_gains_lookup() {
        let g = AxisGains {
            x: PidGains::new(1.0, 0.0, 0.0),
            y: PidGains::new(2.0, 0.0, 0.0),
            z: PidGains::new(3.0, 0.0, 0.0),
        };
        let kps: Vec<f64> = Axis::ALL.iter().map(|a| g.get(*a).kp).collect();
        assert_eq!(kps, vec![1.0, 2.0, 3.0]);
        assert!(!AxisGains::uniform(PidGains::new(f64::NAN, 0.0, 0.0)).is_finite());
    }

    #[test]
    fn gains_toml_defaults() {
        let g: PidGains = toml::from_str("kp = 0.5").unwrap();
        assert_eq!(g, PidGains::new(0.5, 0.0, 0.0));
    }
}
