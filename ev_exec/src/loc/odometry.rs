//! Dead reckoning odometry

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::drive::DriveSensData;
use log::{debug, trace};
use nalgebra::Vector2;
use serde::Serialize;
use util::module::State;

use super::{LocError, Pose};
use crate::params::VehicleParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The odometry pose estimator.
pub struct Odometry {
    /// Forward travel per motor degree, negative for inverted drive motors
    mm_per_motor_deg: f64,
    gyro_sign: f64,

    /// Gyro drift rate measured during calibration.
    ///
    /// Units: degrees/second
    drift_rate_dps: f64,

    /// Sensor values and time at the last reset. `None` until the first reset.
    reset: Option<ResetPoint>,

    /// Average wheel travel at the previous update
    prev_wheel_mm: f64,

    pose: Pose,
}

/// Input to the odometry each cycle.
#[derive(Debug, Copy, Clone)]
pub struct OdomInput {
    /// Monotonic time of the sensor reading.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Raw sensor data
    pub sens: DriveSensData,
}

/// Odometry status report.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct StatusReport {
    /// Gyro angle since reset before drift correction, in the software's sign convention.
    pub uncorrected_heading_deg: f64,

    /// Drift correction removed from the heading this cycle.
    pub drift_correction_deg: f64,

    /// Signed distance covered since the previous update.
    pub delta_mm: f64,
}

#[derive(Debug, Copy, Clone)]
struct ResetPoint {
    time_s: f64,
    sens: DriveSensData,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Odometry {
    pub fn new(vehicle_params: &VehicleParams) -> Self {
        Self {
            mm_per_motor_deg: vehicle_params.drive_sign() * vehicle_params.mm_per_motor_deg(),
            gyro_sign: vehicle_params.gyro_sign(),
            drift_rate_dps: 0.0,
            reset: None,
            prev_wheel_mm: 0.0,
            pose: Pose::default(),
        }
    }

    /// Set the gyro drift rate, normally the result of [`super::calibrate_drift`].
    pub fn set_drift_rate(&mut self, drift_rate_dps: f64) {
        self.drift_rate_dps = drift_rate_dps;
    }

    pub fn drift_rate_dps(&self) -> f64 {
        self.drift_rate_dps
    }

    /// Zero the pose at the given time, taking the given sensor readings as the new zero point.
    ///
    /// Must be called at the start of every run, before the first call to `proc`.
    pub fn reset(&mut self, time_s: f64, sens: &DriveSensData) {
        self.reset = Some(ResetPoint {
            time_s,
            sens: *sens,
        });
        self.prev_wheel_mm = 0.0;
        self.pose = Pose::default();

        debug!("Odometry reset at {:.3} s", time_s);
    }

    /// The most recently estimated pose.
    pub fn pose(&self) -> Pose {
        self.pose
    }
}

impl State for Odometry {
    type InputData = OdomInput;
    type OutputData = Pose;
    type StatusReport = StatusReport;
    type ProcError = LocError;

    /// Integrate the new sensor readings into the pose.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let reset = self.reset.ok_or(LocError::NotReset)?;
        let sens = &input_data.sens;

        // ---- HEADING ----

        let elapsed_s = input_data.time_s - reset.time_s;
        let gyro_deg = sens.gyro_deg - reset.sens.gyro_deg;
        let drift_deg = self.drift_rate_dps * elapsed_s;

        let heading_deg = self.gyro_sign * (gyro_deg - drift_deg);

        // ---- DISTANCE ----

        let avg_wheel_deg = ((sens.left_drv_deg - reset.sens.left_drv_deg)
            + (sens.right_drv_deg - reset.sens.right_drv_deg))
            / 2.0;
        let wheel_mm = avg_wheel_deg * self.mm_per_motor_deg;
        let delta_mm = wheel_mm - self.prev_wheel_mm;
        self.prev_wheel_mm = wheel_mm;

        // Project the step along the current heading
        let heading_rad = heading_deg.to_radians();
        self.pose.position_mm += delta_mm * Vector2::new(heading_rad.cos(), heading_rad.sin());
        self.pose.heading_deg = heading_deg;

        // Travelled distance is the furthest the wheels have got, so a brief roll back does not
        // reduce progress
        self.pose.distance_mm = self.pose.distance_mm.max(wheel_mm);

        trace!(
            "Pose: ({:.1}, {:.1}) mm, {:.2} deg, {:.1} mm travelled",
            self.pose.x_mm(),
            self.pose.y_mm(),
            self.pose.heading_deg,
            self.pose.distance_mm
        );

        Ok((
            self.pose,
            StatusReport {
                uncorrected_heading_deg: self.gyro_sign * gyro_deg,
                drift_correction_deg: drift_deg,
                delta_mm,
            },
        ))
    }
}
