//! Drone Common Library
//!
//! Value types and configuration loading shared by the drone control
//! workspace crates.
//!
//! # Module Structure
//!
//! - [`types`] - Positions, velocity commands, PID gains and feed items
//! - [`config`] - TOML loading trait, shared config section, log levels
//!
//! # Usage
//!
//! ```rust
//! use drone_common::types::{Position, VelocityCommand};
//! use drone_common::config::{ConfigLoader, SharedConfig};
//!
//! let p = Position::new(1.0, 2.0, 2.0);
//! assert_eq!(p.distance_to(&Position::ORIGIN), 3.0);
//! assert!(VelocityCommand::ZERO.is_zero());
//! ```

pub mod config;
pub mod types;
