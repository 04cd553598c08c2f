//! Lifecycle coordinator: starts the three activities and stops them.
//!
//! Startup order: validate config → build state and loop (fatal on error) →
//! mark running → spawn position ingestion, command ingestion, control loop.
//! Shutdown is cooperative: `request_stop()` followed by joining every
//! thread, so no activity is abandoned mid-tick and the control loop always
//! emits its final zero command.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, RecvError};
use drone_common::types::PositionUpdate;
use tracing::{error, info};

use crate::command::ingest::CommandIngestion;
use crate::config::DroneConfig;
use crate::cycle::{ControlLoop, LoopReport, LoopSettings};
use crate::error::{ControlError, Result};
use crate::position::PositionIngestion;
use crate::sink::VelocitySink;
use crate::state::shared::{ControlHandle, ControlState};
use crate::stats::IngestionStats;

const POSITION_THREAD: &str = "position";
const COMMAND_THREAD: &str = "command";
const CONTROL_THREAD: &str = "control";

/// What every activity reported when it exited.
#[derive(Debug, Clone, PartialEq)]
pub struct ShutdownReport {
    pub control: LoopReport,
    pub positions: IngestionStats,
    pub commands: IngestionStats,
}

/// Owns the activity threads and the shared state.
pub struct Coordinator {
    state: Arc<ControlState>,
    position: Option<JoinHandle<IngestionStats>>,
    command: Option<JoinHandle<IngestionStats>>,
    control: Option<JoinHandle<LoopReport>>,
}

impl Coordinator {
    /// Validate `config` and start all three activities.
    ///
    /// A configuration error is returned before any thread exists.
    pub fn start<S>(
        config: &DroneConfig,
        positions: Receiver<PositionUpdate>,
        commands: Receiver<String>,
        sink: S,
    ) -> Result<Self>
    where
        S: VelocitySink + 'static,
    {
        config.validate()?;
        let c = &config.control;

        let state = Arc::new(ControlState::new(config.gains.axis_gains()));
        let control_loop = ControlLoop::new(Arc::clone(&state), LoopSettings::from(c), sink)?;
        let position_task =
            PositionIngestion::new(Arc::clone(&state), positions, c.entity_id.clone(), c.feed_poll());
        let command_task =
            CommandIngestion::new(Arc::clone(&state), commands, c.step_size, c.feed_poll());

        state.mark_running();
        let mut coordinator = Self {
            state,
            position: None,
            command: None,
            control: None,
        };

        // On a spawn failure, stop and join whatever already started.
        coordinator.position = Some(coordinator.spawn(POSITION_THREAD, move || position_task.run())?);
        coordinator.command = Some(coordinator.spawn(COMMAND_THREAD, move || command_task.run())?);
        coordinator.control = Some(coordinator.spawn(CONTROL_THREAD, move || control_loop.run())?);

        info!(
            entity = %c.entity_id,
            "Coordinator started (dt={}s, hold_threshold={}, step={})",
            c.dt, c.hold_threshold, c.step_size
        );
        Ok(coordinator)
    }

    fn spawn<T, F>(&mut self, name: &'static str, body: F) -> Result<JoinHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        thread::Builder::new()
            .name(name.to_string())
            .spawn(body)
            .map_err(|source| {
                error!("Failed to spawn {name} thread: {source}");
                self.abort();
                ControlError::Spawn { name, source }
            })
    }

    /// Stop and join whatever is running, ignoring results.
    fn abort(&mut self) {
        self.state.request_stop();
        if let Some(h) = self.position.take() {
            let _ = h.join();
        }
        if let Some(h) = self.command.take() {
            let _ = h.join();
        }
        if let Some(h) = self.control.take() {
            let _ = h.join();
        }
    }

    /// Target/gains/stop API for external callers.
    pub fn handle(&self) -> ControlHandle {
        ControlHandle::new(Arc::clone(&self.state))
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Block until the shutdown signal fires (or its sender is dropped),
    /// then shut down.
    pub fn wait_for_shutdown(self, signal: &Receiver<()>) -> Result<ShutdownReport> {
        match signal.recv() {
            Ok(()) => info!("Shutdown signal received"),
            Err(RecvError) => info!("Shutdown signal source closed"),
        }
        self.shutdown()
    }

    /// Request stop and join all three activities.
    ///
    /// Every thread is joined even if an earlier one panicked; the first
    /// panic is then reported as [`ControlError::TaskPanicked`].
    pub fn shutdown(mut self) -> Result<ShutdownReport> {
        info!("Stopping activities");
        self.state.request_stop();

        let positions = join(self.position.take(), POSITION_THREAD);
        let commands = join(self.command.take(), COMMAND_THREAD);
        let control = join(self.control.take(), CONTROL_THREAD);

        let report = ShutdownReport {
            control: control?,
            positions: positions?,
            commands: commands?,
        };
        info!(
            "All activities stopped ({} ticks, {} commands, {}/{} positions accepted)",
            report.control.ticks,
            report.control.commands_emitted,
            report.positions.accepted,
            report.positions.total()
        );
        Ok(report)
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        if self.position.is_some() || self.command.is_some() || self.control.is_some() {
            self.abort();
        }
    }
}

fn join<T: Default>(handle: Option<JoinHandle<T>>, name: &'static str) -> Result<T> {
    match handle {
        Some(h) => h.join().map_err(|_| {
            error!("{name} thread panicked");
            ControlError::TaskPanicked(name)
        }),
        None => Ok(T::default()),
    }
}
