//! # Localisation module
//!
//! This module provides localisation for the vehicle in the form of dead reckoning. Distance comes
//! from the average rotation of the two drive wheels and heading from the drift-corrected gyro.
//!
//! The frame has its origin at the start line with +X along the centreline towards the target and
//! +Y to the left. Heading is counter-clockwise positive from +X.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calib;
mod odometry;

pub use calib::calibrate_drift;
pub use odometry::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose of the vehicle in the run frame.
#[derive(Debug, Copy, Clone, Serialize, Default, PartialEq)]
pub struct Pose {
    /// Position in the run frame
    ///
    /// Units: millimeters
    pub position_mm: Vector2<f64>,

    /// Heading, counter-clockwise positive from the +X axis
    ///
    /// Units: degrees
    pub heading_deg: f64,

    /// Total distance travelled along the ground since the start of the run. This never
    /// decreases within a run.
    ///
    /// Units: millimeters
    pub distance_mm: f64,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Errors which can occur in localisation.
#[derive(Debug, thiserror::Error)]
pub enum LocError {
    #[error("Odometry has not been reset since startup, reset it before the run starts")]
    NotReset,

    #[error("Invalid calibration timing: duration {0} s, sample period {1} s")]
    InvalidCalibTiming(f64, f64),

    #[error("Could not read the gyro during calibration: {0}")]
    CalibSensorError(crate::vehicle::VehicleError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn x_mm(&self) -> f64 {
        self.position_mm[0]
    }

    pub fn y_mm(&self) -> f64 {
        self.position_mm[1]
    }
}
