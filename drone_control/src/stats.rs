//! Counters reported by the feed-consuming activities when they exit.

/// Per-activity message counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionStats {
    /// Messages applied to the control state.
    pub accepted: u64,
    /// Messages ignored because they concern another entity.
    pub filtered: u64,
    /// Messages refused as malformed or inapplicable.
    pub rejected: u64,
}

impl IngestionStats {
    /// Every message seen, whatever its outcome.
    pub fn total(&self) -> u64 {
        self.accepted + self.filtered + self.rejected
    }
}
