//! Steering control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use serde::Serialize;

// Internal
use super::*;
use crate::{loc::Pose, params::VehicleParams, traj_ctrl::TrajDems};
use comms_if::eqpt::drive::DriveDems;
use util::{maths::get_ang_dist_deg, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Steering control module state
pub struct SteerCtrl {
    pub(crate) params: Params,
    pub(crate) vehicle: VehicleParams,

    /// Maximum forward speed of either side in differential mode
    ///
    /// Units: millimeters/second
    pub(crate) max_speed_mms: f64,

    mode: SteerCtrlMode,

    pid: PidController,

    /// Time of the previous processed cycle
    prev_time_s: f64,

    /// The most recently issued demand
    last_dems: DriveDems,
}

/// Input data to steering control.
#[derive(Debug, Copy, Clone)]
pub struct InputData {
    /// Time since the start of the run.
    ///
    /// Units: seconds
    pub time_s: f64,

    pub pose: Pose,

    pub traj_dems: TrajDems,
}

/// Steering control status report
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct StatusReport {
    /// Target heading minus current heading, wrapped into `[-180, 180)`
    ///
    /// Units: degrees
    pub heading_error_deg: f64,

    /// Raw PID output before any limits
    pub pid_output: f64,

    /// True if the demand was limited, by the steering range or the wheel speed difference
    pub saturated: bool,

    /// True if this cycle was skipped because time did not advance
    pub skipped: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SteerCtrlMode {
    /// Not yet armed, processing is an error
    Idle,

    /// Armed, no cycle processed yet
    Armed,

    /// Processing demands
    Tracking,

    /// Run over, only hold is demanded
    Stopped,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SteerCtrl {
    pub fn new(
        params: &Params,
        vehicle: &VehicleParams,
        max_speed_mms: f64,
    ) -> Result<Self, SteerCtrlError> {
        if !(vehicle.max_steer_angle_deg > 0.0) {
            return Err(SteerCtrlError::InvalidParam(format!(
                "max_steer_angle_deg must be positive, got {}",
                vehicle.max_steer_angle_deg
            )));
        }
        if params.mode == SteerMode::Differential && !(vehicle.track_width_mm > 0.0) {
            return Err(SteerCtrlError::InvalidParam(format!(
                "track_width_mm must be positive, got {}",
                vehicle.track_width_mm
            )));
        }

        let pid = PidController::from_params(params.active_pid())?;

        Ok(Self {
            params: params.clone(),
            vehicle: vehicle.clone(),
            max_speed_mms,
            mode: SteerCtrlMode::Idle,
            pid,
            prev_time_s: 0.0,
            last_dems: DriveDems::Hold,
        })
    }

    /// Arm the controller at the start of a run, clearing all PID state.
    pub fn arm(&mut self, time_s: f64) {
        self.pid.reset();
        self.prev_time_s = time_s;
        self.last_dems = DriveDems::Hold;
        self.mode = SteerCtrlMode::Armed;

        info!("SteerCtrl armed in {:?} mode", self.params.mode);
    }

    /// Stop the controller, returning the hold demand. All following cycles also demand hold.
    pub fn stop(&mut self) -> DriveDems {
        self.mode = SteerCtrlMode::Stopped;
        self.last_dems = DriveDems::Hold;
        self.last_dems
    }

    pub fn mode(&self) -> SteerCtrlMode {
        self.mode
    }

    pub fn steer_mode(&self) -> SteerMode {
        self.params.mode
    }
}

impl State for SteerCtrl {
    type InputData = InputData;
    type OutputData = DriveDems;
    type StatusReport = StatusReport;
    type ProcError = SteerCtrlError;

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut report = StatusReport::default();

        match self.mode {
            SteerCtrlMode::Idle => return Err(SteerCtrlError::NotArmed),
            SteerCtrlMode::Stopped => return Ok((DriveDems::Hold, report)),
            SteerCtrlMode::Armed | SteerCtrlMode::Tracking => (),
        }

        report.heading_error_deg =
            get_ang_dist_deg(input_data.pose.heading_deg, input_data.traj_dems.heading_deg);

        let dt_s = input_data.time_s - self.prev_time_s;
        let pid_output = match self.pid.update(report.heading_error_deg, dt_s) {
            Some(o) => o,
            None => {
                debug!("SteerCtrl: dt = {:.4} s, reissuing previous demand", dt_s);
                report.skipped = true;
                return Ok((self.last_dems, report));
            }
        };
        report.pid_output = pid_output;

        self.prev_time_s = input_data.time_s;
        self.mode = SteerCtrlMode::Tracking;

        let dems = match self.params.mode {
            SteerMode::FrontSteer => {
                self.calc_front_steer(input_data.traj_dems.speed_mms, pid_output, &mut report)
            }
            SteerMode::Differential => self.calc_diff_drive(
                input_data.traj_dems.speed_mms,
                input_data.traj_dems.curvature_mm,
                pid_output,
                &mut report,
            ),
        };

        self.last_dems = dems;

        Ok((dems, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    fn params() -> Params {
        util::params::from_str(include_str!("../../../params/steer_ctrl.toml")).unwrap()
    }

    fn vehicle() -> VehicleParams {
        util::params::from_str(include_str!("../../../params/vehicle.toml")).unwrap()
    }

    fn input(time_s: f64, heading_deg: f64, target_deg: f64) -> InputData {
        InputData {
            time_s,
            pose: Pose {
                position_mm: Vector2::zeros(),
                heading_deg,
                distance_mm: 0.0,
            },
            traj_dems: TrajDems {
                speed_mms: 500.0,
                heading_deg: target_deg,
                curvature_mm: 0.0,
            },
        }
    }

    #[test]
    fn test_state_machine() {
        let mut steer_ctrl = SteerCtrl::new(&params(), &vehicle(), 1400.0).unwrap();
        assert_eq!(steer_ctrl.mode(), SteerCtrlMode::Idle);
        assert!(matches!(
            steer_ctrl.proc(&input(0.01, 0.0, 0.0)),
            Err(SteerCtrlError::NotArmed)
        ));

        steer_ctrl.arm(0.0);
        assert_eq!(steer_ctrl.mode(), SteerCtrlMode::Armed);

        let (dems, _) = steer_ctrl.proc(&input(0.01, 0.0, 0.0)).unwrap();
        assert_eq!(steer_ctrl.mode(), SteerCtrlMode::Tracking);
        assert!(dems.is_moving());

        assert_eq!(steer_ctrl.stop(), DriveDems::Hold);
        let (dems, _) = steer_ctrl.proc(&input(0.02, 0.0, 10.0)).unwrap();
        assert_eq!(dems, DriveDems::Hold);
    }

    #[test]
    fn test_front_steer_direction() {
        let mut steer_ctrl = SteerCtrl::new(&params(), &vehicle(), 1400.0).unwrap();
        steer_ctrl.arm(0.0);

        // Target to the left, steer left
        let (dems, report) = steer_ctrl.proc(&input(0.01, 0.0, 2.0)).unwrap();
        match dems {
            DriveDems::Steered { str_pos_deg, drv_rate_degs } => {
                assert!(str_pos_deg > 0.0);
                assert!((drv_rate_degs - vehicle().speed_to_motor_rate(500.0)).abs() < 1e-9);
            }
            d => panic!("Expected steered demand, got {:?}", d),
        }
        assert_eq!(report.heading_error_deg, 2.0);

        // Large error, clamped to the actuator range
        let (dems, report) = steer_ctrl.proc(&input(0.02, 0.0, -90.0)).unwrap();
        assert_eq!(
            dems,
            DriveDems::Steered {
                drv_rate_degs: vehicle().speed_to_motor_rate(500.0),
                str_pos_deg: -45.0
            }
        );
        assert!(report.saturated);
    }

    #[test]
    fn test_heading_error_wraps() {
        let mut steer_ctrl = SteerCtrl::new(&params(), &vehicle(), 1400.0).unwrap();
        steer_ctrl.arm(0.0);

        // 170 to -170 is a 20 degree left turn, not 340 right
        let (_, report) = steer_ctrl.proc(&input(0.01, 170.0, -170.0)).unwrap();
        assert!((report.heading_error_deg - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_positive_dt_reissues() {
        let mut steer_ctrl = SteerCtrl::new(&params(), &vehicle(), 1400.0).unwrap();
        steer_ctrl.arm(0.0);

        let (first, _) = steer_ctrl.proc(&input(0.01, 0.0, 3.0)).unwrap();
        let (again, report) = steer_ctrl.proc(&input(0.01, 0.0, -30.0)).unwrap();
        assert!(report.skipped);
        assert_eq!(first, again);

        let (_, report) = steer_ctrl.proc(&input(0.005, 0.0, -30.0)).unwrap();
        assert!(report.skipped);
    }

    #[test]
    fn test_arm_resets() {
        let mut steer_ctrl = SteerCtrl::new(&params(), &vehicle(), 1400.0).unwrap();
        steer_ctrl.arm(0.0);
        let (first, _) = steer_ctrl.proc(&input(0.015625, 0.0, 1.0)).unwrap();
        for i in 2..50 {
            steer_ctrl.proc(&input(i as f64 * 0.015625, 0.0, 1.0)).unwrap();
        }

        // Same time step after re-arming gives the same first demand
        steer_ctrl.arm(8.0);
        let (rearmed, _) = steer_ctrl.proc(&input(8.015625, 0.0, 1.0)).unwrap();
        assert_eq!(first, rearmed);
    }

    #[test]
    fn test_differential_mode() {
        let mut params = params();
        params.mode = SteerMode::Differential;
        let mut steer_ctrl = SteerCtrl::new(&params, &vehicle(), 1400.0).unwrap();
        steer_ctrl.arm(0.0);

        // Target to the left, right wheel faster
        let (dems, _) = steer_ctrl.proc(&input(0.01, 0.0, 5.0)).unwrap();
        match dems {
            DriveDems::Differential {
                left_drv_rate_degs,
                right_drv_rate_degs,
            } => assert!(right_drv_rate_degs > left_drv_rate_degs),
            d => panic!("Expected differential demand, got {:?}", d),
        }
    }

    fn wheel_speeds(dems: DriveDems) -> (f64, f64) {
        match dems {
            DriveDems::Differential {
                left_drv_rate_degs,
                right_drv_rate_degs,
            } => {
                let mm_per_deg = vehicle().mm_per_motor_deg();
                (left_drv_rate_degs * mm_per_deg, right_drv_rate_degs * mm_per_deg)
            }
            d => panic!("Expected differential demand, got {:?}", d),
        }
    }

    #[test]
    fn test_curvature_feedforward() {
        // On heading, on a left hand curve of radius 2 m
        let mut on_curve = input(0.01, 0.0, 0.0);
        on_curve.traj_dems.curvature_mm = 1.0 / 2000.0;

        let mut params = params();
        params.mode = SteerMode::Differential;
        params.curvature_feedforward = true;
        let mut steer_ctrl = SteerCtrl::new(&params, &vehicle(), 1400.0).unwrap();
        steer_ctrl.arm(0.0);

        // No heading error so the turn comes from the curvature alone: 500 mm/s * 1/2000 mm
        // = 0.25 rad/s, giving +-15 mm/s across the 120 mm track
        let (dems, report) = steer_ctrl.proc(&on_curve).unwrap();
        assert_eq!(report.pid_output, 0.0);
        let (left, right) = wheel_speeds(dems);
        assert!((left - 485.0).abs() < 1e-9, "left {}", left);
        assert!((right - 515.0).abs() < 1e-9, "right {}", right);

        params.curvature_feedforward = false;
        let mut steer_ctrl = SteerCtrl::new(&params, &vehicle(), 1400.0).unwrap();
        steer_ctrl.arm(0.0);

        let (dems, _) = steer_ctrl.proc(&on_curve).unwrap();
        let (left, right) = wheel_speeds(dems);
        assert!((left - 500.0).abs() < 1e-9);
        assert!((right - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_actuators() {
        let mut inverted = vehicle();
        inverted.invert_drive = true;
        inverted.invert_steering = true;

        let mut normal_ctrl = SteerCtrl::new(&params(), &vehicle(), 1400.0).unwrap();
        let mut inverted_ctrl = SteerCtrl::new(&params(), &inverted, 1400.0).unwrap();
        normal_ctrl.arm(0.0);
        inverted_ctrl.arm(0.0);

        let (normal, _) = normal_ctrl.proc(&input(0.01, 0.0, 2.0)).unwrap();
        let (flipped, _) = inverted_ctrl.proc(&input(0.01, 0.0, 2.0)).unwrap();
        match (normal, flipped) {
            (
                DriveDems::Steered {
                    drv_rate_degs,
                    str_pos_deg,
                },
                DriveDems::Steered {
                    drv_rate_degs: flipped_rate,
                    str_pos_deg: flipped_pos,
                },
            ) => {
                assert!(drv_rate_degs > 0.0 && str_pos_deg > 0.0);
                assert_eq!(flipped_rate, -drv_rate_degs);
                assert_eq!(flipped_pos, -str_pos_deg);
            }
            d => panic!("Expected steered demands, got {:?}", d),
        }

        // Differential rates flip too
        let mut params = params();
        params.mode = SteerMode::Differential;
        let mut inverted_ctrl = SteerCtrl::new(&params, &inverted, 1400.0).unwrap();
        inverted_ctrl.arm(0.0);
        match inverted_ctrl.proc(&input(0.01, 0.0, 5.0)).unwrap().0 {
            DriveDems::Differential {
                left_drv_rate_degs,
                right_drv_rate_degs,
            } => assert!(right_drv_rate_degs < left_drv_rate_degs && left_drv_rate_degs < 0.0),
            d => panic!("Expected differential demand, got {:?}", d),
        }
    }
}
