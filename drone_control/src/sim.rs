//! Simulated drone: velocity commands in, position updates out.
//!
//! Stands in for the vehicle and its tracking system when the binary runs
//! without external feeds. Each period the latest received command drives a
//! first-order velocity response, the velocity is integrated into position,
//! and the position is published for the tracked entity and every decoy.
//!
//! The simulator runs until the command channel disconnects, i.e. until the
//! control loop has sent its final command and dropped its sink.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use drone_common::types::{Axis, Position, PositionUpdate, Vector3, VelocityCommand};
use tracing::{debug, info, trace};

use crate::config::SimSection;

/// Spacing of decoy bodies along +x from the start position [m].
const DECOY_SPACING: f64 = 5.0;

// ─── Kinematics ─────────────────────────────────────────────────────

/// Point-mass kinematics with a first-order velocity lag.
#[derive(Debug, Clone, PartialEq)]
pub struct DroneModel {
    position: Position,
    velocity: Vector3,
    response_time: f64,
}

impl DroneModel {
    pub fn new(start: Position, response_time: f64) -> Self {
        Self {
            position: start,
            velocity: Vector3::ZERO,
            response_time,
        }
    }

    /// Advance by `dt` seconds under `command` and return the new position.
    ///
    /// Angular rates are ignored; the model has no attitude.
    pub fn step(&mut self, command: &VelocityCommand, dt: f64) -> Position {
        let alpha = if self.response_time <= 0.0 {
            1.0
        } else {
            dt / (self.response_time + dt)
        };
        let wanted = [command.linear.x, command.linear.y, command.linear.z];
        let mut v = [self.velocity.x, self.velocity.y, self.velocity.z];
        for axis in Axis::ALL {
            let i = axis.index();
            v[i] += (wanted[i] - v[i]) * alpha;
            self.position[axis] += v[i] * dt;
        }
        self.velocity = Vector3::new(v[0], v[1], v[2]);

        trace!("sim pos={} vel=({:.3}, {:.3}, {:.3})", self.position, v[0], v[1], v[2]);
        self.position
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn velocity(&self) -> Vector3 {
        self.velocity
    }
}

// ─── Simulator Activity ─────────────────────────────────────────────

/// Counters returned when the simulator exits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimReport {
    pub steps: u64,
    pub commands: u64,
    pub final_position: Position,
}

/// The simulator activity.
pub struct SimulatedDrone {
    model: DroneModel,
    entity_id: String,
    decoys: Vec<(String, Position)>,
    commands: Receiver<VelocityCommand>,
    feed: Sender<PositionUpdate>,
    period: Duration,
    last_command: VelocityCommand,
    feed_open: bool,
    report: SimReport,
}

impl SimulatedDrone {
    pub fn new(
        config: &SimSection,
        entity_id: impl Into<String>,
        commands: Receiver<VelocityCommand>,
        feed: Sender<PositionUpdate>,
    ) -> Self {
        let decoys = config
            .decoys
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let at = config.start.offset(Axis::X, DECOY_SPACING * (i + 1) as f64);
                (name.clone(), at)
            })
            .collect();
        Self {
            model: DroneModel::new(config.start, config.response_time),
            entity_id: entity_id.into(),
            decoys,
            commands,
            feed,
            period: config.period(),
            last_command: VelocityCommand::ZERO,
            feed_open: true,
            report: SimReport {
                final_position: config.start,
                ..SimReport::default()
            },
        }
    }

    /// Drain pending commands, keeping the newest.
    ///
    /// Returns `false` once the command channel is disconnected and empty.
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(cmd) => {
                    self.last_command = cmd;
                    self.report.commands += 1;
                }
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn publish(&mut self, position: Position) {
        if !self.feed_open {
            return;
        }
        let own = PositionUpdate::new(self.entity_id.clone(), position);
        let sent = self.feed.send(own).is_ok()
            && self
                .decoys
                .iter()
                .all(|(name, at)| self.feed.send(PositionUpdate::new(name.clone(), *at)).is_ok());
        if !sent {
            // Keep consuming commands so the final zero is still observed.
            debug!("Position feed closed, simulator stops publishing");
            self.feed_open = false;
        }
    }

    /// One simulation step: consume commands, integrate, publish.
    ///
    /// Returns `false` when the command source is gone.
    pub fn step(&mut self) -> bool {
        let connected = self.drain_commands();
        let position = self.model.step(&self.last_command, self.period.as_secs_f64());
        self.report.steps += 1;
        self.report.final_position = position;
        self.publish(position);
        connected
    }

    pub fn model(&self) -> &DroneModel {
        &self.model
    }

    /// Run until the command channel disconnects.
    pub fn run(mut self) -> SimReport {
        info!(
            entity = %self.entity_id,
            decoys = self.decoys.len(),
            "Simulator started at {}",
            self.model.position()
        );
        self.publish(self.model.position());

        let mut next = Instant::now() + self.period;
        while self.step() {
            let now = Instant::now();
            if now < next {
                thread::sleep(next - now);
                next += self.period;
            } else {
                next = now + self.period;
            }
        }

        info!(
            "Simulator stopped after {} steps at {} (last command {})",
            self.report.steps, self.report.final_position, self.last_command
        );
        self.report
    }
}
