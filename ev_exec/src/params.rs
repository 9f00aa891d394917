//! # Vehicle Parameters
//!
//! Physical parameters of the vehicle which are needed by more than one module.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleParams {
    /// Drive wheel diameter.
    ///
    /// Units: millimeters
    pub wheel_diameter_mm: f64,

    /// Wheel rotations per motor rotation. Greater than one means the wheel turns faster than the
    /// motor.
    pub gear_ratio: f64,

    /// Distance between the left and right drive wheel contact points.
    ///
    /// Units: millimeters
    pub track_width_mm: f64,

    /// Distance between the steered axle and the drive axle.
    ///
    /// Units: millimeters
    pub wheelbase_mm: f64,

    /// Maximum steering actuator deflection either side of centre.
    ///
    /// Units: degrees
    pub max_steer_angle_deg: f64,

    /// True if the gyro reports clockwise rotation as positive. Heading inside the software is
    /// always counter-clockwise positive.
    pub gyro_clockwise_positive: bool,

    /// True if the drive motors are mounted so that a positive rate drives the vehicle backwards.
    /// Applies to both rate demands and encoder angles.
    #[serde(default)]
    pub invert_drive: bool,

    /// True if a positive steering actuator position turns the wheels to the right.
    #[serde(default)]
    pub invert_steering: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl VehicleParams {
    /// Linear distance travelled per degree of drive motor rotation.
    ///
    /// Units: millimeters/degree
    pub fn mm_per_motor_deg(&self) -> f64 {
        self.wheel_diameter_mm * std::f64::consts::PI / 360.0 * self.gear_ratio
    }

    /// Sign applied to raw gyro angles to obtain a counter-clockwise positive heading.
    pub fn gyro_sign(&self) -> f64 {
        if self.gyro_clockwise_positive {
            -1.0
        } else {
            1.0
        }
    }

    /// Sign applied to drive motor rates and angles to obtain forward positive values.
    pub fn drive_sign(&self) -> f64 {
        if self.invert_drive {
            -1.0
        } else {
            1.0
        }
    }

    /// Sign applied to steering angles to obtain left positive values.
    pub fn steer_sign(&self) -> f64 {
        if self.invert_steering {
            -1.0
        } else {
            1.0
        }
    }

    /// Convert a forward speed into a drive motor rate demand, in the motor's own direction.
    ///
    /// Units: millimeters/second in, degrees/second out
    pub fn speed_to_motor_rate(&self, speed_mms: f64) -> f64 {
        self.drive_sign() * speed_mms / self.mm_per_motor_deg()
    }

    /// Convert a left positive steering angle into a steering actuator position demand.
    ///
    /// Units: degrees
    pub fn steer_angle_to_position(&self, steer_deg: f64) -> f64 {
        self.steer_sign() * steer_deg
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mm_per_motor_deg() {
        let params: VehicleParams =
            util::params::from_str(include_str!("../../params/vehicle.toml")).unwrap();

        // 43.2 mm wheel, 5:1 speed up
        let expected = 43.2 * std::f64::consts::PI / 360.0 * 5.0;
        assert!((params.mm_per_motor_deg() - expected).abs() < 1e-12);
        assert!((params.speed_to_motor_rate(expected) - 1.0).abs() < 1e-12);
        assert_eq!(params.gyro_sign(), -1.0);
        assert_eq!(params.steer_angle_to_position(10.0), 10.0);
    }

    #[test]
    fn test_inverted_actuators() {
        let mut params: VehicleParams =
            util::params::from_str(include_str!("../../params/vehicle.toml")).unwrap();
        let forward = params.speed_to_motor_rate(500.0);
        assert!(forward > 0.0);

        params.invert_drive = true;
        params.invert_steering = true;
        assert_eq!(params.speed_to_motor_rate(500.0), -forward);
        assert_eq!(params.steer_angle_to_position(10.0), -10.0);
    }
}
