//! # Steering control module
//!
//! Steering control turns the heading and speed demands from trajectory control into actuator
//! demands. A single PID controller acts on the heading error, and its output is interpreted
//! according to the vehicle's steering mode:
//!
//! - Front steer: the output is a steering actuator angle, clamped to the actuator's range.
//! - Differential: the output is a turn rate correction which, together with an optional path
//!   curvature feedforward, is mixed into left and right wheel speeds.
//!
//! The controller must be armed at the start of a run, which resets the PID state, and is stopped
//! at the end, after which it only demands a hold.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_diff_drive;
mod calc_front_steer;
mod params;
mod pid;
mod state;
mod window;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use calc_diff_drive::mix_differential;
pub use params::*;
pub use pid::*;
pub use state::*;
pub use window::SlidingWindow;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during SteerCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum SteerCtrlError {
    #[error("Steering control must be armed before it is processed")]
    NotArmed,

    #[error("The integral window length must be at least 1")]
    ZeroWindowLength,

    #[error("Invalid steering parameter: {0}")]
    InvalidParam(String),
}
