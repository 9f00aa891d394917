//! # Vehicle Interface
//!
//! The core never talks to hardware directly. Instead it drives anything implementing
//! [`Vehicle`], which may be the real drive electronics or the kinematic simulation in
//! [`crate::sim_client`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::drive::{DriveDems, DriveSensData};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Interface to the vehicle's sensors, actuators and clock.
pub trait Vehicle {
    /// Monotonic time since an arbitrary fixed epoch.
    ///
    /// Units: seconds
    fn time_s(&self) -> f64;

    /// Read the current sensor values.
    fn read_sens(&mut self) -> Result<DriveSensData, VehicleError>;

    /// Issue a new set of actuator demands, which persist until the next call.
    fn send_dems(&mut self, dems: &DriveDems) -> Result<(), VehicleError>;

    /// Block for the given duration. Non-positive durations return immediately.
    fn wait(&mut self, duration_s: f64);
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors reported by a vehicle implementation. These are never retried by the core.
#[derive(Debug, thiserror::Error)]
pub enum VehicleError {
    #[error("Invalid vehicle configuration: {0}")]
    InvalidConfig(String),

    #[error("Actuator demand rejected: {0}")]
    ActuatorFault(String),
}
