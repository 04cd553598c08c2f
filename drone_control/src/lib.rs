//! # Drone Control Library
//!
//! Position-tracking PID control for a single drone. Three activities share
//! one mutex-guarded [`state::shared::ControlState`]:
//!
//! 1. **Position ingestion** ([`position`]): filters the feed by entity id and
//!    stores the latest position.
//! 2. **Command ingestion** ([`command`]): parses operator directives (target,
//!    manual velocity, gains, directional steps) and applies them.
//! 3. **Control loop** ([`cycle`]): once per `dt`, snapshots the state and
//!    emits either a PID correction, the manual velocity, or nothing.
//!
//! [`lifecycle::Coordinator`] starts and joins the three. On shutdown the
//! loop always delivers one final zero-velocity command.
//!
//! ## Ownership
//!
//! PID units ([`control`]) live on the control-loop thread only. Target and
//! gain changes reach them through generation counters in the shared state,
//! never through a second lock.

pub mod command;
pub mod config;
pub mod control;
pub mod cycle;
pub mod error;
pub mod lifecycle;
pub mod position;
pub mod sim;
pub mod sink;
pub mod state;
pub mod stats;

pub use error::{ControlError, Result};
pub use lifecycle::{Coordinator, ShutdownReport};
pub use state::shared::ControlHandle;
