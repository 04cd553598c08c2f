//! Operator directive parser.
//!
//! One directive per line. Tokens are separated by whitespace and/or commas.
//!
//! | Tokens            | Directive |
//! |-------------------|-----------|
//! | 3 numbers         | target position `x y z` |
//! | 6 numbers         | manual velocity `vx vy vz wx wy wz` |
//! | 9 numbers         | gains `kp ki kd` for x, then y, then z |
//! | `up` / `down`     | step target along ±z |
//! | `forward` / `back`| step target along ±x |
//! | `left` / `right`  | step target along +y / −y |
//! | `stop` / `hover`  | manual zero velocity |
//!
//! Anything else is an [`ControlError::InvalidCommand`].

use drone_common::types::{Axis, AxisGains, PidGains, Position, Vector3, VelocityCommand};

use crate::error::{ControlError, Result};

/// Unit direction of a step directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Forward,
    Back,
    Left,
    Right,
}

impl Direction {
    /// Axis and sign of this direction.
    pub const fn axis_sign(self) -> (Axis, f64) {
        match self {
            Direction::Up => (Axis::Z, 1.0),
            Direction::Down => (Axis::Z, -1.0),
            Direction::Forward => (Axis::X, 1.0),
            Direction::Back => (Axis::X, -1.0),
            Direction::Left => (Axis::Y, 1.0),
            Direction::Right => (Axis::Y, -1.0),
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        let d = match word.to_ascii_lowercase().as_str() {
            "up" => Direction::Up,
            "down" => Direction::Down,
            "forward" | "fwd" => Direction::Forward,
            "back" | "backward" => Direction::Back,
            "left" => Direction::Left,
            "right" => Direction::Right,
            _ => return None,
        };
        Some(d)
    }
}

/// A parsed operator directive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Directive {
    /// New absolute target; clears manual override.
    Target(Position),
    /// Manual override velocity.
    Velocity(VelocityCommand),
    /// New gains for all three axes.
    Gains(AxisGains),
    /// Incremental target change by the configured step.
    Step(Direction),
}

/// Parse one line. `Ok(None)` for blank lines and `#` comments.
pub fn parse_line(line: &str) -> Result<Option<Directive>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    parse_directive(line).map(Some)
}

/// Parse a non-empty directive.
pub fn parse_directive(input: &str) -> Result<Directive> {
    let tokens: Vec<&str> = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    match tokens.as_slice() {
        [] => Err(ControlError::invalid("empty directive")),
        [word] if word.parse::<f64>().is_err() => parse_word(word),
        _ => parse_numbers(&tokens),
    }
}

fn parse_word(word: &str) -> Result<Directive> {
    if let Some(direction) = Direction::from_word(word) {
        return Ok(Directive::Step(direction));
    }
    match word.to_ascii_lowercase().as_str() {
        "stop" | "hover" => Ok(Directive::Velocity(VelocityCommand::ZERO)),
        _ => Err(ControlError::invalid(format!("unknown directive '{word}'"))),
    }
}

fn parse_numbers(tokens: &[&str]) -> Result<Directive> {
    let mut values = Vec::with_capacity(tokens.len());
    for token in tokens {
        let v: f64 = token
            .parse()
            .map_err(|_| ControlError::invalid(format!("'{token}' is not a number")))?;
        if !v.is_finite() {
            return Err(ControlError::invalid(format!("'{token}' is not finite")));
        }
        values.push(v);
    }

    match values.as_slice() {
        &[x, y, z] => Ok(Directive::Target(Position::new(x, y, z))),
        &[vx, vy, vz, wx, wy, wz] => Ok(Directive::Velocity(VelocityCommand::new(
            Vector3::new(vx, vy, vz),
            Vector3::new(wx, wy, wz),
        ))),
        &[xp, xi, xd, yp, yi, yd, zp, zi, zd] => Ok(Directive::Gains(AxisGains {
            x: PidGains::new(xp, xi, xd),
            y: PidGains::new(yp, yi, yd),
            z: PidGains::new(zp, zi, zd),
        })),
        other => Err(ControlError::invalid(format!(
            "expected 3, 6 or 9 numbers, got {}",
            other.len()
        ))),
    }
}
