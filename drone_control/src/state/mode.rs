//! Control loop mode transitions.
//!
//! Idle → Tracking ⇄ Holding, with Manual orthogonal to both (entered by a
//! direct-velocity command, left by a new target). Stopped is terminal and
//! reachable from every mode.

/// Mode of the control loop for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// No position yet, or tracking without a target.
    #[default]
    Idle,
    /// PID toward the target.
    Tracking,
    /// At the setpoint; output suppressed until the target changes.
    Holding,
    /// Operator velocity passed through.
    Manual,
    /// Shut down. Terminal.
    Stopped,
}

/// Per-tick observation fed to [`LoopModeMachine::handle_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// Position missing, or tracking without a target.
    NoData,
    /// Target generation changed since the previous tick.
    TargetChanged,
    /// Tracking, outside the hold threshold.
    Track,
    /// Tracking, within the hold threshold.
    WithinThreshold,
    /// Operator override active.
    ManualCommand,
    /// `running` observed false.
    Stop,
}

/// Result of a transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition accepted, new mode.
    Ok(LoopMode),
    /// Transition refused; mode unchanged.
    Rejected(&'static str),
}

/// Holds the current [`LoopMode`].
#[derive(Debug, Clone, Default)]
pub struct LoopModeMachine {
    mode: LoopMode,
}

impl LoopModeMachine {
    pub const fn new() -> Self {
        Self {
            mode: LoopMode::Idle,
        }
    }

    #[inline]
    pub const fn mode(&self) -> LoopMode {
        self.mode
    }

    pub fn handle_event(&mut self, event: LoopEvent) -> TransitionResult {
        use LoopEvent::*;
        use LoopMode::*;

        let next = match (self.mode, event) {
            (Stopped, _) => return TransitionResult::Rejected("loop already stopped"),

            (_, Stop) => Stopped,
            (_, NoData) => Idle,
            (_, ManualCommand) => Manual,

            // A new target releases the hold; elsewhere it is a no-op.
            (Holding, TargetChanged) => Tracking,
            (mode, TargetChanged) => mode,

            (Holding, Track) => {
                return TransitionResult::Rejected("holding until the target changes");
            }
            (Idle | Tracking | Manual, Track) => Tracking,

            (Idle | Tracking | Manual | Holding, WithinThreshold) => Holding,
        };

        self.mode = next;
        TransitionResult::Ok(next)
    }

    /// True while PID output is suppressed at the setpoint.
    #[inline]
    pub const fn is_holding(&self) -> bool {
        matches!(self.mode, LoopMode::Holding)
    }

    #[inline]
    pub const fn is_stopped(&self) -> bool {
        matches!(self.mode, LoopMode::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        assert_eq!(LoopModeMachine::new().mode(), LoopMode::Idle);
    }

    #[test]
    fn idle_track_hold_cycle() {
        let mut m = LoopModeMachine::new();
        assert_eq!(m.handle_event(LoopEvent::Track), TransitionResult::Ok(LoopMode::Tracking));
        assert_eq!(
            m.handle_event(LoopEvent::WithinThreshold),
            TransitionResult::Ok(LoopMode::Holding)
        );
        assert!(m.is_holding());
        assert!(matches!(m.handle_event(LoopEvent::Track), TransitionResult::Rejected(_)));
        assert!(m.is_holding());
        assert_eq!(
            m.handle_event(LoopEvent::TargetChanged),
            TransitionResult::Ok(LoopMode::Tracking)
        );
    }

    #[test]
    fn target_change_outside_hold_is_noop() {
        let mut m = LoopModeMachine::new();
        m.handle_event(LoopEvent::ManualCommand);
        assert_eq!(
            m.handle_event(LoopEvent::TargetChanged),
            TransitionResult::Ok(LoopMode::Manual)
        );
    }

    #[test]
    fn manual_is_reachable_from_hold() {
        let mut m = LoopModeMachine::new();
        m.handle_event(LoopEvent::WithinThreshold);
        assert_eq!(
            m.handle_event(LoopEvent::ManualCommand),
            TransitionResult::Ok(LoopMode::Manual)
        );
    }

    #[test]
    fn stopped_is_terminal() {
        let mut m = LoopModeMachine::new();
        m.handle_event(LoopEvent::Track);
        assert_eq!(m.handle_event(LoopEvent::Stop), TransitionResult::Ok(LoopMode::Stopped));
        assert!(m.is_stopped());
        for ev in [
            LoopEvent::NoData,
            LoopEvent::Track,
            LoopEvent::ManualCommand,
            LoopEvent::TargetChanged,
            LoopEvent::Stop,
        ] {
            assert!(matches!(m.handle_event(ev), TransitionResult::Rejected(_)));
        }
    }
}
