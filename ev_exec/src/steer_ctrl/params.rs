//! Steering control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for steering control
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Params {
    /// How the vehicle is steered
    pub mode: SteerMode,

    /// If true the differential turn rate includes the rate needed to follow the path curvature
    /// at the current speed.
    pub curvature_feedforward: bool,

    /// Maximum difference between the left and right wheel speeds in differential mode.
    ///
    /// Units: millimeters/second
    pub max_wheel_speed_diff_mms: f64,

    /// Gains used in front steer mode, heading error (deg) to steering angle (deg)
    pub front_steer: PidParams,

    /// Gains used in differential mode, heading error (deg) to turn rate (deg/s)
    pub differential: PidParams,
}

/// Gains and integral behaviour of a PID controller
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct PidParams {
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,

    /// If set the integral is the sum over this many most recent updates rather than since reset.
    #[serde(default)]
    pub integral_window_len: Option<usize>,

    /// If set the integral is clamped to `[-limit, limit]`.
    #[serde(default)]
    pub integral_limit: Option<f64>,

    /// Clear the integral whenever the error changes sign.
    #[serde(default)]
    pub reset_on_sign_change: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SteerMode {
    /// Steerable front wheels with a common drive
    FrontSteer,

    /// Independently driven left and right wheels
    Differential,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Gains for the configured steering mode.
    pub fn active_pid(&self) -> &PidParams {
        match self.mode {
            SteerMode::FrontSteer => &self.front_steer,
            SteerMode::Differential => &self.differential,
        }
    }
}
