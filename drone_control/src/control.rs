//! Control law root.
//!
//! One [`pid::PidUnit`] per axis, grouped in [`axes::AxisPids`]. The units
//! live on the control loop thread only.

pub mod axes;
pub mod pid;
