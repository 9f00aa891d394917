//! # Drive Equipment Demands and Sensor Data

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Raw sensor data read from the vehicle once per cycle.
///
/// All values are relative to the last sensor reset.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct DriveSensData {
    /// Accumulated angle of the left drive motor.
    ///
    /// Units: degrees
    pub left_drv_deg: f64,

    /// Accumulated angle of the right drive motor.
    ///
    /// Units: degrees
    pub right_drv_deg: f64,

    /// Raw heading sensor (gyro) angle, in the sensor's own sign convention.
    ///
    /// Units: degrees
    pub gyro_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Demands sent to the vehicle's actuators. A new demand is issued every cycle.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum DriveDems {
    /// Both drive motors at the same rate, with the steering actuator tracking a
    /// target position.
    Steered {
        /// Drive motor rate demand.
        ///
        /// Units: degrees/second
        drv_rate_degs: f64,

        /// Steering actuator position demand. Positive steers to the left.
        ///
        /// Units: degrees
        str_pos_deg: f64,
    },

    /// Independent left and right drive motor rates, no steering actuator.
    Differential {
        /// Left drive motor rate demand.
        ///
        /// Units: degrees/second
        left_drv_rate_degs: f64,

        /// Right drive motor rate demand.
        ///
        /// Units: degrees/second
        right_drv_rate_degs: f64,
    },

    /// Brake and hold the drive motors, return steering to neutral and hold it.
    Hold,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl DriveDems {
    /// Returns true if the demand commands any motion.
    pub fn is_moving(&self) -> bool {
        match *self {
            DriveDems::Steered { drv_rate_degs, .. } => drv_rate_degs != 0.0,
            DriveDems::Differential {
                left_drv_rate_degs,
                right_drv_rate_degs,
            } => left_drv_rate_degs != 0.0 || right_drv_rate_degs != 0.0,
            DriveDems::Hold => false,
        }
    }
}
