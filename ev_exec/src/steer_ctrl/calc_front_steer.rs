//! Front steer demand calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

use super::*;
use comms_if::eqpt::drive::DriveDems;
use util::maths::clamp_abs;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SteerCtrl {
    /// Calculate the front steer demand.
    ///
    /// The PID output is the steering angle, positive to the left, clamped to the actuator's
    /// range. Both drive motors run at the rate for the target speed. Demands are given in the
    /// actuators' own directions.
    pub(crate) fn calc_front_steer(
        &self,
        speed_mms: f64,
        pid_output: f64,
        report: &mut StatusReport,
    ) -> DriveDems {
        let steer_deg = clamp_abs(pid_output, self.vehicle.max_steer_angle_deg);
        report.saturated = steer_deg != pid_output;

        let drv_rate_degs = self.vehicle.speed_to_motor_rate(speed_mms);

        trace!(
            "Front steer: {:.2} deg at {:.1} deg/s",
            steer_deg,
            drv_rate_degs
        );

        DriveDems::Steered {
            drv_rate_degs,
            str_pos_deg: self.vehicle.steer_angle_to_position(steer_deg),
        }
    }
}
