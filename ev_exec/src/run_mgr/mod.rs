//! # Run manager module
//!
//! The run manager owns a single run from start to finish. It builds the trajectory and steering
//! controllers for the run configuration, then drives the fixed period control loop against a
//! [`Vehicle`](crate::vehicle::Vehicle):
//!
//! 1. Read the sensors and update the pose
//! 1. Get the speed and heading demands from trajectory control
//! 1. Get the actuator demands from steering control and send them
//! 1. Check the stall and timeout guards
//! 1. Wait for the next cycle
//!
//! The run ends when the full path length has been travelled, or early if a guard trips. Early
//! termination is a normal outcome reported in the [`RunSummary`], not an error.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod guards;
mod params;
mod state;
mod tm;
mod validate;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use guards::*;
pub use params::*;
pub use state::*;
pub use tm::*;
pub use validate::*;

use crate::{
    loc::LocError, steer_ctrl::SteerCtrlError, traj_ctrl::TrajCtrlError, vehicle::VehicleError,
};
use util::archive::ArchiveError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which stop a run. Stalls and timeouts are not errors.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Trajectory control error: {0}")]
    TrajCtrl(#[from] TrajCtrlError),

    #[error("Steering control error: {0}")]
    SteerCtrl(#[from] SteerCtrlError),

    #[error("Localisation error: {0}")]
    Loc(#[from] LocError),

    #[error("Vehicle error: {0}")]
    Vehicle(#[from] VehicleError),

    #[error("Could not archive run data: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Invalid run manager parameter: {0}")]
    InvalidParam(String),
}
