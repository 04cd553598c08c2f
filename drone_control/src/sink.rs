//! Velocity sinks: where the control loop delivers its commands.
//!
//! The loop owns exactly one sink, injected at construction, and calls
//! [`VelocitySink::send`] once per emitted command. A sink must not block for
//! long; a slow sink delays the next tick.

use crossbeam_channel::{Sender, TrySendError};
use drone_common::types::VelocityCommand;
use tracing::{debug, info, warn};

/// Accepts one [`VelocityCommand`] at a time.
pub trait VelocitySink: Send {
    fn send(&mut self, command: VelocityCommand);
}

impl<F> VelocitySink for F
where
    F: FnMut(VelocityCommand) + Send,
{
    fn send(&mut self, command: VelocityCommand) {
        self(command)
    }
}

/// Forwards commands into a crossbeam channel without blocking.
///
/// A full channel drops the command; a disconnected receiver is reported
/// once and then ignored.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Sender<VelocityCommand>,
    dropped: u64,
    disconnected: bool,
}

impl ChannelSink {
    pub fn new(tx: Sender<VelocityCommand>) -> Self {
        Self {
            tx,
            dropped: 0,
            disconnected: false,
        }
    }

    /// Commands lost to a full channel.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl VelocitySink for ChannelSink {
    fn send(&mut self, command: VelocityCommand) {
        match self.tx.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                if self.dropped == 1 || self.dropped % 100 == 0 {
                    warn!("Velocity channel full, {} command(s) dropped", self.dropped);
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                if !self.disconnected {
                    warn!("Velocity channel receiver gone, discarding further commands");
                    self.disconnected = true;
                }
            }
        }
    }
}

/// Logs every command. Used when no actuator is attached.
#[derive(Debug, Default)]
pub struct LogSink {
    count: u64,
    debug: bool,
}

impl LogSink {
    /// Log at INFO.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log at DEBUG, for use next to a real sink.
    pub fn debug() -> Self {
        Self { count: 0, debug: true }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl VelocitySink for LogSink {
    fn send(&mut self, command: VelocityCommand) {
        self.count += 1;
        if self.debug {
            debug!(seq = self.count, "velocity {}", command);
        } else {
            info!(seq = self.count, "velocity {}", command);
        }
    }
}

/// Copies every command to two sinks.
pub struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: VelocitySink, B: VelocitySink> Tee<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: VelocitySink, B: VelocitySink> VelocitySink for Tee<A, B> {
    fn send(&mut self, command: VelocityCommand) {
        self.first.send(command);
        self.second.send(command);
    }
}
