//! # Drone Control
//!
//! Runs the position-tracking control loop against a simulated drone (or,
//! with `--no-sim`, against a logging sink) and reads operator directives
//! from stdin, one per line:
//!
//! - `x y z`: new target position
//! - six numbers: manual velocity override (linear xyz, angular xyz)
//! - nine numbers: gains (kp ki kd for x, then y, then z)
//! - `up` `down` `forward` `back` `left` `right`: step the target
//! - `stop` / `hover`: manual zero velocity
//!
//! Ctrl-C or end of stdin shuts everything down.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use std::thread;

use clap::Parser;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use drone_common::types::PositionUpdate;
use drone_control::config::{load_config, DroneConfig};
use drone_control::sim::SimulatedDrone;
use drone_control::sink::{ChannelSink, LogSink, Tee, VelocitySink};
use drone_control::{ControlError, Coordinator, ShutdownReport};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Capacity of the loop → simulator command channel.
const VELOCITY_CHANNEL_CAPACITY: usize = 64;

/// Drone Control: position-tracking PID loop
#[derive(Parser, Debug)]
#[command(name = "drone_control")]
#[command(version)]
#[command(about = "Position-tracking PID control loop for a single drone")]
struct Args {
    /// Path to TOML configuration. Built-in defaults when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override `control.entity_id`.
    #[arg(long)]
    entity: Option<String>,

    /// Override `control.dt` (tick interval in seconds).
    #[arg(long)]
    dt: Option<f64>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,

    /// Do not start the simulated drone; log commands instead.
    #[arg(long)]
    no_sim: bool,
}

fn main() {
    let args = Args::parse();
    let config = resolve_config(&args);

    let level = match &config {
        _ if args.verbose => Level::DEBUG,
        Ok(cfg) => cfg
            .shared
            .log_level
            .as_directive()
            .parse()
            .unwrap_or(Level::INFO),
        Err(_) => Level::INFO,
    };
    setup_tracing(level, args.json);

    info!("Drone Control v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config.and_then(|cfg| run(&args, &cfg));
    if let Err(e) = result {
        if e.is_fatal() {
            error!("FATAL: {e}");
        } else {
            error!("Stopped with error: {e}");
        }
        process::exit(1);
    }

    info!("Drone Control shutdown complete");
}

/// Load the file (or defaults) and apply CLI overrides, then validate.
fn resolve_config(args: &Args) -> Result<DroneConfig, ControlError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => DroneConfig::default(),
    };
    if let Some(entity) = &args.entity {
        config.control.entity_id = entity.clone();
    }
    if let Some(dt) = args.dt {
        config.control.dt = dt;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &Args, config: &DroneConfig) -> Result<(), ControlError> {
    info!(
        service = %config.shared.service_name,
        "Config OK: entity={}, dt={}s, gains x={:?} y={:?} z={:?}",
        config.control.entity_id,
        config.control.dt,
        config.gains.x,
        config.gains.y,
        config.gains.z
    );

    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    let (command_tx, command_rx) = unbounded::<String>();
    let (position_tx, position_rx) = unbounded::<PositionUpdate>();

    let ctrlc_tx = shutdown_tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        let _ = ctrlc_tx.try_send(());
    }) {
        warn!("Failed to install Ctrl-C handler: {e}");
    }

    spawn_stdin_reader(command_tx, shutdown_tx)?;
    info!(
        "Reading directives from stdin ('x y z', 6 or 9 numbers, up/down/forward/back/left/right, stop)"
    );

    let report = if args.no_sim {
        // Hold the sender so the position feed stays connected but silent.
        let _feed = position_tx;
        serve(config, position_rx, command_rx, LogSink::new(), &shutdown_rx)?
    } else {
        let (velocity_tx, velocity_rx) = bounded(VELOCITY_CHANNEL_CAPACITY);
        let sim = SimulatedDrone::new(
            &config.sim,
            config.control.entity_id.clone(),
            velocity_rx,
            position_tx,
        );
        let sim_thread = thread::Builder::new()
            .name("sim".to_string())
            .spawn(move || sim.run())
            .map_err(|source| ControlError::Spawn { name: "sim", source })?;

        let sink = Tee::new(ChannelSink::new(velocity_tx), LogSink::debug());
        let report = serve(config, position_rx, command_rx, sink, &shutdown_rx);

        // The loop dropped its sink, so the simulator sees a disconnect.
        match sim_thread.join() {
            Ok(sim_report) => info!(
                "Simulated drone at {} after {} steps",
                sim_report.final_position, sim_report.steps
            ),
            Err(_) => error!("sim thread panicked"),
        }
        report?
    };

    let stats = &report.control.stats;
    info!(
        "Loop stats: ticks={}, avg={}ns, max={}ns, overruns={}; directives accepted={}, rejected={}",
        stats.cycle_count,
        stats.avg_cycle_ns(),
        stats.max_cycle_ns,
        stats.overruns,
        report.commands.accepted,
        report.commands.rejected
    );
    Ok(())
}

fn serve<S>(
    config: &DroneConfig,
    positions: Receiver<PositionUpdate>,
    commands: Receiver<String>,
    sink: S,
    shutdown: &Receiver<()>,
) -> Result<ShutdownReport, ControlError>
where
    S: VelocitySink + 'static,
{
    let coordinator = Coordinator::start(config, positions, commands, sink)?;
    coordinator.wait_for_shutdown(shutdown)
}

/// Forward stdin lines to the command feed; signal shutdown on EOF.
///
/// The thread is detached: a blocking read cannot be interrupted, and the
/// process exits once the coordinator has shut down.
fn spawn_stdin_reader(commands: Sender<String>, shutdown: Sender<()>) -> Result<(), ControlError> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if commands.send(line).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("stdin read failed: {e}");
                        break;
                    }
                }
            }
            info!("stdin closed");
            let _ = shutdown.try_send(());
        })
        .map(|_| ())
        .map_err(|source| ControlError::Spawn {
            name: "stdin",
            source,
        })
}

/// Setup tracing subscriber. `RUST_LOG` directives are kept alongside `level`.
fn setup_tracing(level: Level, json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
