//! Fixed-period control loop: snapshot → decide → compute → emit.
//!
//! ## Tick
//! 1. Take one [`ControlSnapshot`]. `running == false` ends the loop.
//! 2. Apply new gains (`set_gains`, integral reset) and, on a new target,
//!    reset every PID unit before anything is computed.
//! 3. No position, or tracking without a target: idle tick. Emits a zero
//!    command when `idle_zero_output` is set, nothing otherwise.
//! 4. Manual: emit the operator velocity unchanged.
//! 5. Tracking: within `hold_threshold` of the target, emit one zero command
//!    and hold (emit nothing) until the target changes. Otherwise run the
//!    three PID units and emit their output as linear velocity.
//!
//! ## Pacing
//! Deadlines advance by exactly one period from the previous deadline, so
//! sleep jitter does not accumulate. A tick that ends past its deadline is an
//! overrun; the schedule is then re-anchored to the current instant.
//!
//! ## Shutdown
//! The loop emits exactly one final zero command before returning.

use std::sync::Arc;
use std::time::{Duration, Instant};

use drone_common::types::VelocityCommand;
use tracing::{debug, info, warn};

use crate::config::{tick_period, ControlSection};
use crate::control::axes::AxisPids;
use crate::error::Result;
use crate::sink::VelocitySink;
use crate::state::mode::{LoopEvent, LoopMode, LoopModeMachine};
use crate::state::shared::{CommandMode, ControlSnapshot, ControlState};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick timing statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleStats {
    /// Ticks executed.
    pub cycle_count: u64,
    /// Duration of the last tick body [ns].
    pub last_cycle_ns: u64,
    /// Shortest tick body [ns].
    pub min_cycle_ns: u64,
    /// Longest tick body [ns].
    pub max_cycle_ns: u64,
    /// Running sum for the average.
    pub sum_cycle_ns: u64,
    /// Ticks that finished after their deadline.
    pub overruns: u64,
    /// Worst wake-up delay past the scheduled deadline [ns].
    pub max_latency_ns: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: u64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, duration: Duration, latency: Duration) {
        let duration_ns = duration.as_nanos() as u64;
        let latency_ns = latency.as_nanos() as u64;
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average tick body [ns], 0 before the first tick.
    #[inline]
    pub fn avg_cycle_ns(&self) -> u64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Settings / Results ─────────────────────────────────────────────

/// Loop parameters taken from [`ControlSection`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSettings {
    /// Tick interval [s], also the PID `dt`.
    pub dt: f64,
    /// Distance at which tracking switches to holding [m].
    pub hold_threshold: f64,
    /// Emit zero on idle ticks.
    pub idle_zero_output: bool,
}

impl From<&ControlSection> for LoopSettings {
    fn from(c: &ControlSection) -> Self {
        Self {
            dt: c.dt,
            hold_threshold: c.hold_threshold,
            idle_zero_output: c.idle_zero_output,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// A command went to the sink.
    Emitted(VelocityCommand),
    /// Nothing emitted (idle without zero output, or holding).
    Suppressed,
    /// Loop stopped. The final zero was emitted on the first such tick.
    Stopped,
}

/// Summary returned when the loop terminates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopReport {
    pub ticks: u64,
    /// Includes the final zero command.
    pub commands_emitted: u64,
    pub stats: CycleStats,
}

// ─── Control Loop ───────────────────────────────────────────────────

/// The control loop activity. Owns the PID units and the sink.
pub struct ControlLoop<S: VelocitySink> {
    state: Arc<ControlState>,
    pids: AxisPids,
    sink: S,
    modes: LoopModeMachine,
    settings: LoopSettings,
    period: Duration,
    seen_target_generation: u64,
    seen_gains_generation: u64,
    ticks: u64,
    emitted: u64,
    stats: CycleStats,
}

impl<S: VelocitySink> ControlLoop<S> {
    /// Build the loop with PID units seeded from the state's current gains.
    ///
    /// Fails with a configuration error for a `dt` that is not a valid period.
    pub fn new(state: Arc<ControlState>, settings: LoopSettings, sink: S) -> Result<Self> {
        let period = tick_period(settings.dt)?;
        let snapshot = state.snapshot();
        let pids = AxisPids::new(snapshot.gains, settings.dt)?;
        Ok(Self {
            state,
            pids,
            sink,
            modes: LoopModeMachine::new(),
            period,
            settings,
            seen_target_generation: 0,
            seen_gains_generation: snapshot.gains_generation,
            ticks: 0,
            emitted: 0,
            stats: CycleStats::new(),
        })
    }

    /// Execute one tick without sleeping.
    pub fn tick(&mut self) -> TickOutcome {
        if self.modes.is_stopped() {
            return TickOutcome::Stopped;
        }
        self.ticks += 1;

        let snap = self.state.snapshot();
        if !snap.running {
            self.modes.handle_event(LoopEvent::Stop);
            self.emit(VelocityCommand::ZERO);
            info!("Control loop stopping, final zero velocity emitted");
            return TickOutcome::Stopped;
        }

        self.absorb_changes(&snap);

        if !snap.position_received || (snap.mode == CommandMode::Tracking && !snap.target_set) {
            self.transition(LoopEvent::NoData);
            return if self.settings.idle_zero_output {
                self.emit(VelocityCommand::ZERO)
            } else {
                TickOutcome::Suppressed
            };
        }

        match snap.mode {
            CommandMode::Manual => {
                self.transition(LoopEvent::ManualCommand);
                self.emit(snap.manual_velocity)
            }
            CommandMode::Tracking => self.track(&snap),
        }
    }

    fn track(&mut self, snap: &ControlSnapshot) -> TickOutcome {
        if self.modes.is_holding() {
            return TickOutcome::Suppressed;
        }

        let distance = snap.current_position.distance_to(&snap.target_position);
        if distance <= self.settings.hold_threshold {
            self.transition(LoopEvent::WithinThreshold);
            info!(
                "Target {} reached (distance {:.4}), holding",
                snap.target_position, distance
            );
            return self.emit(VelocityCommand::ZERO);
        }

        self.transition(LoopEvent::Track);
        let command = self
            .pids
            .compute(&snap.target_position, &snap.current_position);
        self.emit(command)
    }

    /// Pick up gains and target written since the previous tick.
    fn absorb_changes(&mut self, snap: &ControlSnapshot) {
        if snap.gains_generation != self.seen_gains_generation {
            self.seen_gains_generation = snap.gains_generation;
            self.pids.set_gains(&snap.gains);
            debug!("Applied gains generation {}", snap.gains_generation);
        }
        if snap.target_generation != self.seen_target_generation {
            self.seen_target_generation = snap.target_generation;
            self.pids.reset();
            self.transition(LoopEvent::TargetChanged);
            debug!(
                "New target generation {}, PID state reset",
                snap.target_generation
            );
        }
    }

    fn transition(&mut self, event: LoopEvent) {
        let before = self.modes.mode();
        self.modes.handle_event(event);
        let after = self.modes.mode();
        if before != after {
            debug!("Loop mode {:?} -> {:?}", before, after);
        }
    }

    fn emit(&mut self, command: VelocityCommand) -> TickOutcome {
        self.sink.send(command);
        self.emitted += 1;
        TickOutcome::Emitted(command)
    }

    /// Run ticks at the fixed period until the stop request is observed.
    pub fn run(mut self) -> LoopReport {
        info!(
            "Control loop started (period={}ms, hold_threshold={})",
            self.period.as_secs_f64() * 1000.0,
            self.settings.hold_threshold
        );

        let mut deadline = Instant::now();
        loop {
            let start = Instant::now();
            let latency = start.saturating_duration_since(deadline);
            let outcome = self.tick();
            self.stats.record(start.elapsed(), latency);

            if outcome == TickOutcome::Stopped {
                break;
            }

            deadline += self.period;
            let now = Instant::now();
            if now < deadline {
                std::thread::sleep(deadline - now);
            } else {
                self.stats.overruns += 1;
                if self.stats.overruns <= 10 || self.stats.overruns % 1000 == 0 {
                    warn!(
                        "Tick overrun #{}: {}us past deadline",
                        self.stats.overruns,
                        (now - deadline).as_micros()
                    );
                }
                deadline = now;
            }

            if self.stats.cycle_count % 100 == 0 {
                debug!(
                    "Loop: {} ticks, avg={}us, max={}us, overruns={}, mode={:?}",
                    self.stats.cycle_count,
                    self.stats.avg_cycle_ns() / 1000,
                    self.stats.max_cycle_ns / 1000,
                    self.stats.overruns,
                    self.modes.mode()
                );
            }
        }

        info!(
            "Control loop stopped after {} ticks ({} commands, {} overruns)",
            self.ticks, self.emitted, self.stats.overruns
        );
        self.report()
    }

    pub fn report(&self) -> LoopReport {
        LoopReport {
            ticks: self.ticks,
            commands_emitted: self.emitted,
            stats: self.stats.clone(),
        }
    }

    #[inline]
    pub fn mode(&self) -> LoopMode {
        self.modes.mode()
    }

    #[inline]
    pub fn pids(&self) -> &AxisPids {
        &self.pids
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
