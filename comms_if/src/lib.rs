//! # Communications interface crate.
//!
//! Provides the interfaces between the motion control core and its
//! collaborators: the run configuration coming in from the user interface and
//! the demands/sensor data exchanged with the vehicle hardware.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Run configuration commands
pub mod tc;

/// Command and sensor definitions for equipment (drive motors, steering, gyro)
pub mod eqpt;
