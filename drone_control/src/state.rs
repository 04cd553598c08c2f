//! Shared control record and the control loop's mode machine.

pub mod mode;
pub mod shared;
