//! Position ingestion activity.
//!
//! The feed may report many bodies. Only updates for the configured entity
//! reach the shared state; the rest are counted and dropped. Writes are
//! fire-and-forget under the state lock, never waiting for the control loop.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use drone_common::types::PositionUpdate;
use tracing::{debug, info, trace, warn};

use crate::state::shared::ControlState;
use crate::stats::IngestionStats;

/// Outcome of offering one update to [`PositionIngestion::handle_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Accepted,
    /// Different entity.
    Filtered,
    /// Non-finite coordinates.
    Rejected,
}

/// The position ingestion activity.
pub struct PositionIngestion {
    state: Arc<ControlState>,
    feed: Receiver<PositionUpdate>,
    entity_id: String,
    poll: Duration,
    stats: IngestionStats,
}

impl PositionIngestion {
    pub fn new(
        state: Arc<ControlState>,
        feed: Receiver<PositionUpdate>,
        entity_id: impl Into<String>,
        poll: Duration,
    ) -> Self {
        Self {
            state,
            feed,
            entity_id: entity_id.into(),
            poll,
            stats: IngestionStats::default(),
        }
    }

    /// Filter and store one update.
    pub fn handle_update(&mut self, update: &PositionUpdate) -> UpdateOutcome {
        if update.entity != self.entity_id {
            self.stats.filtered += 1;
            trace!(entity = %update.entity, "Ignoring position of other entity");
            return UpdateOutcome::Filtered;
        }
        if !update.position.is_finite() {
            self.stats.rejected += 1;
            warn!("Rejected non-finite position {:?}", update.position);
            return UpdateOutcome::Rejected;
        }
        self.state.set_current_position(update.position);
        self.stats.accepted += 1;
        if self.stats.accepted == 1 {
            info!("First position received: {}", update.position);
        } else {
            trace!("Position {}", update.position);
        }
        UpdateOutcome::Accepted
    }

    pub fn stats(&self) -> IngestionStats {
        self.stats
    }

    /// Run until `running` is false or the feed disconnects.
    ///
    /// A silent feed is not an error: the last stored position stays valid.
    pub fn run(mut self) -> IngestionStats {
        info!(entity = %self.entity_id, "Position ingestion started");
        while self.state.is_running() {
            match self.feed.recv_timeout(self.poll) {
                Ok(update) => {
                    self.handle_update(&update);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Position feed disconnected");
                    break;
                }
            }
        }
        info!(
            "Position ingestion stopped ({} accepted, {} filtered, {} rejected)",
            self.stats.accepted, self.stats.filtered, self.stats.rejected
        );
        self.stats
    }
}
