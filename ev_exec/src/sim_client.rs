//! # Simulation Client
//!
//! The simulation client stands in for the vehicle hardware so that runs can be executed and
//! tested on a desk. It is a simple kinematic model, no dynamics or wheel slip, which provides:
//!
//! - Drive motor encoder angles, integrated from the demanded rates.
//! - A gyro angle with a configurable constant drift, in the gyro's own sign convention.
//! - Front steer (bicycle model) or differential motion, following whichever demand was last sent.
//!
//! Time is simulated. Waiting advances the simulated clock, and optionally also sleeps for the
//! same duration so that a run can be watched as it happens.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{trace, warn};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::{thread, time::Duration};

use crate::{
    params::VehicleParams,
    vehicle::{Vehicle, VehicleError},
};
use comms_if::eqpt::drive::{DriveDems, DriveSensData};
use util::maths::clamp_abs;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Simulated vehicle.
pub struct SimVehicle {
    vehicle: VehicleParams,
    sim: SimParams,

    time_s: f64,

    /// True position in the run frame
    position_mm: Vector2<f64>,

    /// True heading, counter-clockwise positive
    heading_deg: f64,

    left_drv_deg: f64,
    right_drv_deg: f64,

    dems: DriveDems,

    /// If true the wheels are blocked and cannot turn
    jammed: bool,
}

/// Simulation options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Constant gyro drift rate, in the gyro's sign convention
    ///
    /// Units: degrees/second
    pub gyro_drift_dps: f64,

    /// Offset of the steered wheels from the demanded angle, positive to the left
    ///
    /// Units: degrees
    pub steer_bias_deg: f64,

    /// If set the wheels jam once the simulated clock passes this time
    ///
    /// Units: seconds
    pub jam_at_s: Option<f64>,

    /// Longest integration step
    ///
    /// Units: seconds
    pub max_step_s: f64,

    /// If true waits also sleep the calling thread
    pub realtime: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            gyro_drift_dps: 0.0,
            steer_bias_deg: 0.0,
            jam_at_s: None,
            max_step_s: 0.005,
            realtime: false,
        }
    }
}

impl SimParams {
    /// Check the options can be simulated.
    pub fn validate(&self) -> Result<(), VehicleError> {
        if !(self.max_step_s > 0.0) || !self.max_step_s.is_finite() {
            return Err(VehicleError::InvalidConfig(format!(
                "max_step_s must be positive and finite, got {}",
                self.max_step_s
            )));
        }
        if !self.gyro_drift_dps.is_finite() || !self.steer_bias_deg.is_finite() {
            return Err(VehicleError::InvalidConfig(format!(
                "gyro_drift_dps and steer_bias_deg must be finite, got {} and {}",
                self.gyro_drift_dps, self.steer_bias_deg
            )));
        }
        if self.jam_at_s.map_or(false, |t| t.is_nan()) {
            return Err(VehicleError::InvalidConfig(String::from("jam_at_s is NaN")));
        }
        Ok(())
    }
}

impl SimVehicle {
    pub fn new(vehicle: VehicleParams, sim: SimParams) -> Result<Self, VehicleError> {
        sim.validate()?;

        Ok(Self {
            position_mm: Vector2::zeros(),
            vehicle,
            sim,
            time_s: 0.0,
            heading_deg: 0.0,
            left_drv_deg: 0.0,
            right_drv_deg: 0.0,
            dems: DriveDems::Hold,
            jammed: false,
        })
    }

    /// Block the wheels, as if the vehicle had hit something.
    pub fn jam(&mut self) {
        warn!("Simulated vehicle jammed at {:.2} s", self.time_s);
        self.jammed = true;
    }

    /// The true position in the run frame.
    pub fn position_mm(&self) -> Vector2<f64> {
        self.position_mm
    }

    /// The true heading, counter-clockwise positive.
    pub fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    /// The most recent demand received.
    pub fn dems(&self) -> DriveDems {
        self.dems
    }

    /// Advance the model by one step.
    fn step(&mut self, dt_s: f64) {
        if self.jammed {
            return;
        }

        // Demands and encoders are in the actuators' own directions
        let mm_per_deg = self.vehicle.drive_sign() * self.vehicle.mm_per_motor_deg();
        let half_track_mm = self.vehicle.track_width_mm / 2.0;

        // Forward speed (mm/s) and yaw rate (rad/s)
        let (speed_mms, yaw_rads) = match self.dems {
            DriveDems::Steered {
                drv_rate_degs,
                str_pos_deg,
            } => {
                let speed_mms = drv_rate_degs * mm_per_deg;
                let steer_deg = clamp_abs(
                    self.vehicle.steer_sign() * str_pos_deg + self.sim.steer_bias_deg,
                    self.vehicle.max_steer_angle_deg,
                );
                (
                    speed_mms,
                    speed_mms * steer_deg.to_radians().tan() / self.vehicle.wheelbase_mm,
                )
            }
            DriveDems::Differential {
                left_drv_rate_degs,
                right_drv_rate_degs,
            } => {
                let left_mms = left_drv_rate_degs * mm_per_deg;
                let right_mms = right_drv_rate_degs * mm_per_deg;
                (
                    (left_mms + right_mms) / 2.0,
                    (right_mms - left_mms) / self.vehicle.track_width_mm,
                )
            }
            DriveDems::Hold => (0.0, 0.0),
        };

        // Midpoint heading for the position update
        let heading_rad = self.heading_deg.to_radians() + yaw_rads * dt_s / 2.0;
        self.position_mm +=
            speed_mms * dt_s * Vector2::new(heading_rad.cos(), heading_rad.sin());
        self.heading_deg += (yaw_rads * dt_s).to_degrees();

        self.left_drv_deg += (speed_mms - yaw_rads * half_track_mm) * dt_s / mm_per_deg;
        self.right_drv_deg += (speed_mms + yaw_rads * half_track_mm) * dt_s / mm_per_deg;
    }
}

impl Vehicle for SimVehicle {
    fn time_s(&self) -> f64 {
        self.time_s
    }

    fn read_sens(&mut self) -> Result<DriveSensData, VehicleError> {
        Ok(DriveSensData {
            left_drv_deg: self.left_drv_deg,
            right_drv_deg: self.right_drv_deg,
            gyro_deg: self.vehicle.gyro_sign() * self.heading_deg
                + self.sim.gyro_drift_dps * self.time_s,
        })
    }

    fn send_dems(&mut self, dems: &DriveDems) -> Result<(), VehicleError> {
        let finite = match *dems {
            DriveDems::Steered {
                drv_rate_degs,
                str_pos_deg,
            } => drv_rate_degs.is_finite() && str_pos_deg.is_finite(),
            DriveDems::Differential {
                left_drv_rate_degs,
                right_drv_rate_degs,
            } => left_drv_rate_degs.is_finite() && right_drv_rate_degs.is_finite(),
            DriveDems::Hold => true,
        };
        if !finite {
            return Err(VehicleError::ActuatorFault(format!(
                "Non-finite demand {:?}",
                dems
            )));
        }

        trace!("Sim demand at {:.3} s: {:?}", self.time_s, dems);
        self.dems = *dems;
        Ok(())
    }

    fn wait(&mut self, duration_s: f64) {
        if !(duration_s > 0.0) {
            return;
        }

        let steps = (duration_s / self.sim.max_step_s).ceil().max(1.0) as usize;
        let dt_s = duration_s / steps as f64;
        for i in 0..steps {
            let now_s = self.time_s + i as f64 * dt_s;
            if !self.jammed && self.sim.jam_at_s.map_or(false, |t| now_s >= t) {
                self.jam();
            }
            self.step(dt_s);
        }
        self.time_s += duration_s;

        if self.sim.realtime {
            thread::sleep(Duration::from_secs_f64(duration_s));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> SimVehicle {
        SimVehicle::new(
            util::params::from_str(include_str!("../../params/vehicle.toml")).unwrap(),
            SimParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_straight_drive() {
        let mut sim = sim();
        let rate = sim.vehicle.speed_to_motor_rate(500.0);
        sim.send_dems(&DriveDems::Steered {
            drv_rate_degs: rate,
            str_pos_deg: 0.0,
        })
        .unwrap();
        sim.wait(2.0);

        assert!((sim.position_mm() - Vector2::new(1000.0, 0.0)).norm() < 1e-6);
        assert!((sim.time_s() - 2.0).abs() < 1e-12);

        let sens = sim.read_sens().unwrap();
        assert!((sens.left_drv_deg - 2.0 * rate).abs() < 1e-6);
        assert!((sens.right_drv_deg - 2.0 * rate).abs() < 1e-6);
    }

    #[test]
    fn test_left_turn_signs() {
        let mut sim = sim();
        sim.send_dems(&DriveDems::Steered {
            drv_rate_degs: sim.vehicle.speed_to_motor_rate(300.0),
            str_pos_deg: 10.0,
        })
        .unwrap();
        sim.wait(1.0);

        // Left turn is counter-clockwise, the clockwise positive gyro reads negative
        assert!(sim.heading_deg() > 0.0);
        assert!(sim.position_mm()[1] > 0.0);
        assert!(sim.read_sens().unwrap().gyro_deg < 0.0);

        let mut sim = self::sim();
        sim.send_dems(&DriveDems::Differential {
            left_drv_rate_degs: sim.vehicle.speed_to_motor_rate(200.0),
            right_drv_rate_degs: sim.vehicle.speed_to_motor_rate(400.0),
        })
        .unwrap();
        sim.wait(1.0);
        let expected = (200.0 / sim.vehicle.track_width_mm).to_degrees();
        assert!((sim.heading_deg() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_hold_and_jam() {
        let mut sim = sim();
        sim.send_dems(&DriveDems::Hold).unwrap();
        sim.wait(1.0);
        assert_eq!(sim.position_mm(), Vector2::zeros());

        sim.send_dems(&DriveDems::Steered {
            drv_rate_degs: 1000.0,
            str_pos_deg: 0.0,
        })
        .unwrap();
        sim.jam();
        sim.wait(1.0);
        assert_eq!(sim.position_mm(), Vector2::zeros());
        assert_eq!(sim.read_sens().unwrap().left_drv_deg, 0.0);
    }

    #[test]
    fn test_scheduled_jam() {
        let mut sim = SimVehicle::new(
            util::params::from_str(include_str!("../../params/vehicle.toml")).unwrap(),
            SimParams {
                jam_at_s: Some(1.0),
                ..Default::default()
            },
        )
        .unwrap();
        sim.send_dems(&DriveDems::Steered {
            drv_rate_degs: sim.vehicle.speed_to_motor_rate(500.0),
            str_pos_deg: 0.0,
        })
        .unwrap();
        sim.wait(3.0);

        // Within one integration step of the jam time
        assert!((sim.position_mm()[0] - 500.0).abs() < 5.0);
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut sim = sim();
        assert!(matches!(
            sim.send_dems(&DriveDems::Steered {
                drv_rate_degs: f64::NAN,
                str_pos_deg: 0.0
            }),
            Err(VehicleError::ActuatorFault(_))
        ));
    }

    #[test]
    fn test_invalid_step() {
        for step in [0.0, -0.01, f64::NAN, f64::INFINITY].iter() {
            let res = SimVehicle::new(
                util::params::from_str(include_str!("../../params/vehicle.toml")).unwrap(),
                SimParams {
                    max_step_s: *step,
                    ..Default::default()
                },
            );
            assert!(matches!(res, Err(VehicleError::InvalidConfig(_))), "step {}", step);
        }
    }

    #[test]
    fn test_sim_params_file() {
        let params: SimParams = util::params::from_str(include_str!("../../params/sim.toml")).unwrap();
        assert!(params.validate().is_ok());
        assert!(!params.realtime);
        assert_eq!(params.jam_at_s, None);
    }

    #[test]
    fn test_inverted_actuators() {
        let mut vehicle: VehicleParams =
            util::params::from_str(include_str!("../../params/vehicle.toml")).unwrap();
        vehicle.invert_drive = true;
        vehicle.invert_steering = true;
        let mut sim = SimVehicle::new(vehicle, SimParams::default()).unwrap();

        // Negative demands drive forward and turn left on the inverted hardware
        let rate = sim.vehicle.speed_to_motor_rate(300.0);
        assert!(rate < 0.0);
        sim.send_dems(&DriveDems::Steered {
            drv_rate_degs: rate,
            str_pos_deg: sim.vehicle.steer_angle_to_position(10.0),
        })
        .unwrap();
        sim.wait(1.0);

        assert!(sim.position_mm()[0] > 0.0);
        assert!(sim.position_mm()[1] > 0.0);
        assert!(sim.heading_deg() > 0.0);

        // and the encoders count in the motors' own direction
        assert!(sim.read_sens().unwrap().left_drv_deg < 0.0);
    }
}
