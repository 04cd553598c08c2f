//! Command/target ingestion activity.
//!
//! Receives raw operator lines, parses them into [`Directive`]s and applies
//! them to the shared [`ControlState`]. A rejected line is logged and
//! counted; it never changes state and never stops the activity.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info, warn};

use super::directive::{parse_line, Directive};
use crate::error::Result;
use crate::state::shared::ControlState;
use crate::stats::IngestionStats;

/// Apply one directive. `step_size` scales [`Directive::Step`].
pub fn apply_directive(state: &ControlState, directive: Directive, step_size: f64) -> Result<()> {
    match directive {
        Directive::Target(target) => {
            state.set_target(target)?;
            info!("Target set to {}", target);
        }
        Directive::Velocity(velocity) => {
            state.set_manual_velocity(velocity)?;
            info!("Manual override {}", velocity);
        }
        Directive::Gains(gains) => {
            state.set_gains(gains)?;
            info!(
                "Gains updated: x={:?} y={:?} z={:?}",
                gains.x, gains.y, gains.z
            );
        }
        Directive::Step(direction) => {
            let (axis, sign) = direction.axis_sign();
            let target = state.nudge_target(axis, sign * step_size)?;
            info!("Target stepped {:?} to {}", direction, target);
        }
    }
    Ok(())
}

/// The command ingestion activity.
pub struct CommandIngestion {
    state: Arc<ControlState>,
    feed: Receiver<String>,
    step_size: f64,
    poll: Duration,
    stats: IngestionStats,
}

impl CommandIngestion {
    pub fn new(
        state: Arc<ControlState>,
        feed: Receiver<String>,
        step_size: f64,
        poll: Duration,
    ) -> Self {
        Self {
            state,
            feed,
            step_size,
            poll,
            stats: IngestionStats::default(),
        }
    }

    /// Parse and apply one line, updating the counters.
    ///
    /// Blank and comment lines return `Ok(None)` and are not counted.
    pub fn handle_line(&mut self, line: &str) -> Result<Option<Directive>> {
        let outcome = parse_line(line).and_then(|parsed| match parsed {
            Some(d) => apply_directive(&self.state, d, self.step_size).map(|()| Some(d)),
            None => Ok(None),
        });
        match &outcome {
            Ok(Some(_)) => self.stats.accepted += 1,
            Ok(None) => {}
            Err(e) => {
                self.stats.rejected += 1;
                warn!("Rejected directive {:?}: {}", line.trim(), e);
            }
        }
        outcome
    }

    pub fn stats(&self) -> IngestionStats {
        self.stats
    }

    /// Run until `running` is false or the feed disconnects.
    pub fn run(mut self) -> IngestionStats {
        info!("Command ingestion started");
        while self.state.is_running() {
            match self.feed.recv_timeout(self.poll) {
                Ok(line) => {
                    let _ = self.handle_line(&line);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Command feed disconnected");
                    break;
                }
            }
        }
        info!(
            "Command ingestion stopped ({} accepted, {} rejected)",
            self.stats.accepted, self.stats.rejected
        );
        self.stats
    }
}
