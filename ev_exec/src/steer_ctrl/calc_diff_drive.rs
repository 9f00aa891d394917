//! Differential drive demand calculations

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
    /// Calculate the differential demand.
    ///
    /// The PID output is a turn rate correction in degrees/second. The rate needed to follow the
    /// path curvature at the target speed is added to it if feedforward is enabled.
    pub(crate) fn calc_diff_drive(
        &self,
        speed_mms: f64,
        curvature_mm: f64,
        pid_output: f64,
        report: &mut StatusReport,
    ) -> DriveDems {
        let feedforward_dps = if self.params.curvature_feedforward {
            (speed_mms * curvature_mm).to_degrees()
        } else {
            0.0
        };
        let omega_dps = pid_output + feedforward_dps;

        let (left_mms, right_mms) = mix_differential(
            speed_mms,
            omega_dps,
            self.vehicle.track_width_mm,
            self.params.max_wheel_speed_diff_mms,
            self.max_speed_mms,
        );

        let raw_diff_mms = self.vehicle.track_width_mm / 2.0 * omega_dps.to_radians();
        report.saturated = raw_diff_mms.abs() > self.params.max_wheel_speed_diff_mms / 2.0
            || speed_mms + raw_diff_mms.abs() > self.max_speed_mms
            || speed_mms - raw_diff_mms.abs() < 0.0;

        trace!(
            "Differential: omega {:.2} deg/s (ff {:.2}), left {:.1} mm/s, right {:.1} mm/s",
            omega_dps,
            feedforward_dps,
            left_mms,
            right_mms
        );

        DriveDems::Differential {
            left_drv_rate_degs: self.vehicle.speed_to_motor_rate(left_mms),
            right_drv_rate_degs: self.vehicle.speed_to_motor_rate(right_mms),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Mix a forward speed and turn rate into left and right wheel speeds.
///
/// The difference between the wheels is limited to `max_diff_mms`. If either wheel would exceed
/// `max_speed_mms` both are slowed by the same amount, preserving the turn, and neither wheel is
/// ever commanded backwards.
///
/// Units: millimeters/second, degrees/second and millimeters in, millimeters/second out
pub fn mix_differential(
    base_mms: f64,
    omega_dps: f64,
    track_width_mm: f64,
    max_diff_mms: f64,
    max_speed_mms: f64,
) -> (f64, f64) {
    let diff_mms = clamp_abs(
        track_width_mm / 2.0 * omega_dps.to_radians(),
        max_diff_mms / 2.0,
    );

    let mut left_mms = base_mms - diff_mms;
    let mut right_mms = base_mms + diff_mms;

    let excess_mms = left_mms.max(right_mms) - max_speed_mms;
    if excess_mms > 0.0 {
        left_mms -= excess_mms;
        right_mms -= excess_mms;
    }

    (left_mms.max(0.0), right_mms.max(0.0))
}
