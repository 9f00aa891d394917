//! # EV motion control library.
//!
//! This library holds the motion control core of the vehicle, so that the run executable, the
//! path preview tool and the benches can all share it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Vehicle parameters - physical dimensions shared by several modules
pub mod params;

/// Vehicle interface - the hardware seam between the core and the actuators/sensors
pub mod vehicle;

/// Localisation module - dead reckoning odometry and gyro drift calibration
pub mod loc;

/// Trajectory control module - the reference path and the speed profile along it
pub mod traj_ctrl;

/// Steering control module - converts heading error into actuator demands
pub mod steer_ctrl;

/// Run manager - the control loop tying all other modules together
pub mod run_mgr;

/// Simulation client - a kinematic vehicle model for running without hardware
pub mod sim_client;
