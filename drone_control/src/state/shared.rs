//! The single record shared by the ingestion activities and the control loop.
//!
//! Every field sits behind one `parking_lot::Mutex`. Each accessor takes the
//! lock for exactly its own body, so the lock is never held across a channel
//! receive, a sink call or a sleep. Writers bump a generation counter so the
//! loop can detect a new target or new gains between two snapshots, even when
//! the written value equals the previous one.

use std::sync::Arc;

use drone_common::types::{Axis, AxisGains, Position, VelocityCommand};
use parking_lot::Mutex;

use crate::error::{ControlError, Result};

/// Operator-selected command source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandMode {
    /// PID toward `target_position`.
    #[default]
    Tracking,
    /// Pass `manual_velocity` through unchanged.
    Manual,
}

/// Consistent copy of [`ControlState`], taken under one lock acquisition.
///
/// `target_position` is meaningful only when `target_set`; `current_position`
/// only when `position_received`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSnapshot {
    pub current_position: Position,
    pub target_position: Position,
    pub target_set: bool,
    pub position_received: bool,
    pub running: bool,
    pub mode: CommandMode,
    pub manual_velocity: VelocityCommand,
    pub gains: AxisGains,
    /// Bumped on every target write.
    pub target_generation: u64,
    /// Bumped on every gains write.
    pub gains_generation: u64,
}

impl ControlSnapshot {
    /// Distance to target, `None` unless both positions are meaningful.
    pub fn distance_to_target(&self) -> Option<f64> {
        (self.position_received && self.target_set)
            .then(|| self.current_position.distance_to(&self.target_position))
    }
}

#[derive(Debug)]
struct Inner {
    current_position: Position,
    target_position: Position,
    target_set: bool,
    position_received: bool,
    running: bool,
    mode: CommandMode,
    manual_velocity: VelocityCommand,
    gains: AxisGains,
    target_generation: u64,
    gains_generation: u64,
}

impl Inner {
    fn install_target(&mut self, target: Position) {
        self.target_position = target;
        self.target_set = true;
        self.mode = CommandMode::Tracking;
        self.manual_velocity = VelocityCommand::ZERO;
        self.target_generation += 1;
    }
}

/// Shared control record. Created once at startup with all flags false.
#[derive(Debug)]
pub struct ControlState {
    inner: Mutex<Inner>,
}

impl ControlState {
    /// New record holding the initial gains. Not running, no position, no target.
    pub fn new(gains: AxisGains) -> Self {
        Self {
            inner: Mutex::new(Inner {
                current_position: Position::ORIGIN,
                target_position: Position::ORIGIN,
                target_set: false,
                position_received: false,
                running: false,
                mode: CommandMode::Tracking,
                manual_velocity: VelocityCommand::ZERO,
                gains,
                target_generation: 0,
                gains_generation: 0,
            }),
        }
    }

    // ── Writers ──

    /// Record the latest measured position.
    pub fn set_current_position(&self, position: Position) {
        let mut s = self.inner.lock();
        s.current_position = position;
        s.position_received = true;
    }

    /// Install a new target and return to PID tracking.
    ///
    /// Clears any manual override. The loop resets every PID unit before its
    /// next computation.
    pub fn set_target(&self, target: Position) -> Result<()> {
        if !target.is_finite() {
            return Err(ControlError::invalid(format!("non-finite target {target:?}")));
        }
        self.inner.lock().install_target(target);
        Ok(())
    }

    /// Move the target by `delta` along `axis`.
    ///
    /// Relative to the current target when one is set, otherwise to the
    /// current position. Fails with [`ControlError::StaleState`] when neither
    /// exists. Returns the new target.
    pub fn nudge_target(&self, axis: Axis, delta: f64) -> Result<Position> {
        if !delta.is_finite() {
            return Err(ControlError::invalid(format!("non-finite step {delta}")));
        }
        let mut s = self.inner.lock();
        let base = if s.target_set {
            s.target_position
        } else if s.position_received {
            s.current_position
        } else {
            return Err(ControlError::StaleState);
        };
        let target = base.offset(axis, delta);
        s.install_target(target);
        Ok(target)
    }

    /// Bypass the PID with a fixed velocity until the next target or override.
    pub fn set_manual_velocity(&self, velocity: VelocityCommand) -> Result<()> {
        if !velocity.is_finite() {
            return Err(ControlError::invalid(format!(
                "non-finite velocity {velocity:?}"
            )));
        }
        let mut s = self.inner.lock();
        s.mode = CommandMode::Manual;
        s.manual_velocity = velocity;
        Ok(())
    }

    /// Publish new gains. The loop applies them before its next computation.
    pub fn set_gains(&self, gains: AxisGains) -> Result<()> {
        if !gains.is_finite() {
            return Err(ControlError::invalid(format!("non-finite gains {gains:?}")));
        }
        let mut s = self.inner.lock();
        s.gains = gains;
        s.gains_generation += 1;
        Ok(())
    }

    /// Allow the activities to run. Called by the coordinator before spawning.
    pub fn mark_running(&self) {
        self.inner.lock().running = true;
    }

    /// Terminal condition observed by every activity.
    pub fn request_stop(&self) {
        self.inner.lock().running = false;
    }

    // ── Readers ──

    /// Copy of every field, read under a single lock acquisition.
    pub fn snapshot(&self) -> ControlSnapshot {
        let s = self.inner.lock();
        ControlSnapshot {
            current_position: s.current_position,
            target_position: s.target_position,
            target_set: s.target_set,
            position_received: s.position_received,
            running: s.running,
            mode: s.mode,
            manual_velocity: s.manual_velocity,
            gains: s.gains,
            target_generation: s.target_generation,
            gains_generation: s.gains_generation,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    pub fn current_position(&self) -> Option<Position> {
        let s = self.inner.lock();
        s.position_received.then_some(s.current_position)
    }

    pub fn target_position(&self) -> Option<Position> {
        let s = self.inner.lock();
        s.target_set.then_some(s.target_position)
    }

    pub fn is_target_set(&self) -> bool {
        self.inner.lock().target_set
    }

    pub fn is_position_received(&self) -> bool {
        self.inner.lock().position_received
    }

    pub fn mode(&self) -> CommandMode {
        self.inner.lock().mode
    }
}

/// Cloneable entry point for callers outside the three activities.
///
/// Exposes the target-setting and gain-tuning API plus the stop request.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    state: Arc<ControlState>,
}

impl ControlHandle {
    pub fn new(state: Arc<ControlState>) -> Self {
        Self { state }
    }

    pub fn set_target(&self, target: Position) -> Result<()> {
        self.state.set_target(target)
    }

    pub fn nudge_target(&self, axis: Axis, delta: f64) -> Result<Position> {
        self.state.nudge_target(axis, delta)
    }

    pub fn set_gains(&self, gains: AxisGains) -> Result<()> {
        self.state.set_gains(gains)
    }

    pub fn set_manual_velocity(&self, velocity: VelocityCommand) -> Result<()> {
        self.state.set_manual_velocity(velocity)
    }

    pub fn request_stop(&self) {
        self.state.request_stop();
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        self.state.snapshot()
    }

    /// Underlying shared record.
    pub fn state(&self) -> &Arc<ControlState> {
        &self.state
    }
}
