//! Run manager parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the run manager
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Params {
    /// Control loop period
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Interval between telemetry records
    ///
    /// Units: seconds
    pub tm_interval_s: f64,

    /// Minimum distance which must be travelled in each stall window
    ///
    /// Units: millimeters
    pub stall_threshold_mm: f64,

    /// Stall check interval
    ///
    /// Units: seconds
    pub stall_window_s: f64,

    /// The run is stopped once it has lasted this multiple of the target time
    pub timeout_factor: f64,

    /// Measure the gyro drift before starting the run
    pub calibrate_before_run: bool,

    /// Units: seconds
    pub calib_duration_s: f64,

    /// Units: seconds
    pub calib_period_s: f64,

    /// Run configuration limits
    pub validation: ValidationParams,
}

/// Event bounds the run configuration is checked against.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ValidationParams {
    /// If false validation is skipped with a warning
    pub enabled: bool,

    pub min_target_distance_m: f64,
    pub max_target_distance_m: f64,

    pub min_target_time_s: f64,
    pub max_target_time_s: f64,

    pub min_bonus_gap_m: f64,
    pub max_bonus_gap_m: f64,
}
