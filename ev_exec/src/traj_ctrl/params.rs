//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Params {
    /// The speed profile model to use
    pub profile: ProfileKind,

    /// Maximum forward speed
    ///
    /// Units: millimeters/second
    pub max_speed_mms: f64,

    /// Maximum acceleration
    ///
    /// Units: millimeters/second^2
    pub max_accel_mms2: f64,

    /// Maximum deceleration (positive)
    ///
    /// Units: millimeters/second^2
    pub max_decel_mms2: f64,

    /// Speed commanded when the target time has expired but distance remains.
    ///
    /// Units: millimeters/second
    pub creep_speed_mms: f64,

    /// When overdue, target speeds below this are raised to the creep speed.
    ///
    /// Units: millimeters/second
    pub min_crawl_speed_mms: f64,

    /// Distance ahead of the vehicle of the pure pursuit point
    ///
    /// Units: millimeters
    pub lookahead_mm: f64,

    /// Distance within which the target is considered reached
    ///
    /// Units: millimeters
    pub target_tolerance_mm: f64,

    /// Correction added to the requested target distance
    ///
    /// Units: meters
    pub distance_correction_m: f64,

    /// Number of uniform samples used to integrate the lane change length.
    pub path_integration_steps: usize,

    /// Diameter of the cans
    ///
    /// Units: meters
    pub can_diameter_m: f64,

    /// Lateral position of the inside edge of the outer can
    ///
    /// Units: meters
    pub outer_can_inside_edge_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Available speed profile models.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProfileKind {
    /// Closed loop speed control recomputed every cycle from the remaining distance and time.
    Dynamic,

    /// Closed form smooth trapezoid solved once at the start of the run.
    SCurve,
}
