//! Trajectory control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use super::*;
use crate::loc::Pose;
use comms_if::tc::run::RunConfig;
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct TrajCtrl {
    params: Params,

    /// Executing mode
    mode: TrajCtrlMode,

    /// The reference path
    path: Path,

    /// The speed profile along the path
    profile: SpeedProfile,

    target_time_s: f64,
}

/// Input data to trajectory control.
#[derive(Debug, Copy, Clone)]
pub struct InputData {
    /// Time since the start of the run.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Current pose estimate
    pub pose: Pose,
}

/// Demands passed from trajectory control to steering control.
#[derive(Debug, Copy, Clone, Default, Serialize, PartialEq)]
pub struct TrajDems {
    /// Forward speed demand
    ///
    /// Units: millimeters/second
    pub speed_mms: f64,

    /// Heading demand, counter-clockwise positive
    ///
    /// Units: degrees
    pub heading_deg: f64,

    /// Path curvature under the vehicle, positive turning left
    ///
    /// Units: 1/millimeters
    pub curvature_mm: f64,
}

/// The status report containing monitoring quantities.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// The current pure pursuit point
    pub lookahead_mm: Vector2<f64>,

    /// Distance left to travel along the path
    pub dist_remaining_mm: f64,

    /// Straight line distance to the end point
    pub dist_to_end_mm: f64,

    /// True once the full path length has been travelled
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur in trajectory control.
#[derive(Debug, thiserror::Error)]
pub enum TrajCtrlError {
    #[error("Could not build the path: {0}")]
    PathError(#[from] PathError),

    #[error("Could not build the speed profile: {0}")]
    ProfileError(#[from] ProfileError),

    #[error("Pose contains non-finite values: {0:?}")]
    InvalidPose(Pose),
}

/// The possible modes of execution of TrajCtrl.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum TrajCtrlMode {
    FollowPath,
    Finished,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajCtrl {
    /// Build the path and speed profile for a run.
    ///
    /// Any failure here is fatal to starting the run, and is raised before the vehicle moves.
    pub fn new(run_config: &RunConfig, params: &Params) -> Result<Self, TrajCtrlError> {
        let path = Path::new(run_config, params)?;
        let profile = SpeedProfile::new(
            params.profile,
            path.total_length_mm(),
            run_config.target_time_s,
            params,
        )?;

        info!(
            "TrajCtrl ready: {:?} profile over {:.1} mm in {:.1} s",
            params.profile,
            path.total_length_mm(),
            run_config.target_time_s
        );

        Ok(Self {
            params: params.clone(),
            mode: TrajCtrlMode::FollowPath,
            path,
            profile,
            target_time_s: run_config.target_time_s,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_length_mm(&self) -> f64 {
        self.path.total_length_mm()
    }

    pub fn target_time_s(&self) -> f64 {
        self.target_time_s
    }

    pub fn is_finished(&self) -> bool {
        self.mode == TrajCtrlMode::Finished
    }

    /// Pure pursuit heading from the pose to the lookahead point.
    ///
    /// Zero once the vehicle is within the target tolerance of the end, or level with or past the
    /// lookahead point.
    fn heading_to(&self, pose: &Pose, lookahead_mm: &Vector2<f64>) -> f64 {
        let to_end = self.path.end_point() - pose.position_mm;
        let to_point = lookahead_mm - pose.position_mm;

        if to_end.norm() <= self.params.target_tolerance_mm || to_point[0] <= 0.0 {
            0.0
        } else {
            to_point[1].atan2(to_point[0]).to_degrees()
        }
    }
}

impl State for TrajCtrl {
    type InputData = InputData;
    type OutputData = TrajDems;
    type StatusReport = StatusReport;
    type ProcError = TrajCtrlError;

    /// Process trajectory control.
    ///
    /// Processing involves:
    ///  1. Checking whether the full path length has been travelled
    ///  1. Finding the lookahead point and the heading to it
    ///  1. Getting the target speed from the profile
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let pose = &input_data.pose;
        if !(pose.x_mm().is_finite() && pose.y_mm().is_finite() && pose.heading_deg.is_finite()) {
            return Err(TrajCtrlError::InvalidPose(*pose));
        }

        let mut report = StatusReport {
            dist_remaining_mm: (self.path.total_length_mm() - pose.distance_mm).max(0.0),
            dist_to_end_mm: (self.path.end_point() - pose.position_mm).norm(),
            ..Default::default()
        };

        if self.mode == TrajCtrlMode::FollowPath
            && pose.distance_mm >= self.path.total_length_mm()
        {
            info!(
                "Path complete at {:.2} s, {:.1} mm travelled",
                input_data.time_s, pose.distance_mm
            );
            self.mode = TrajCtrlMode::Finished;
        }

        if self.mode == TrajCtrlMode::Finished {
            report.finished = true;
            report.lookahead_mm = self.path.end_point();
            return Ok((TrajDems::default(), report));
        }

        let lookahead = self.path.lookahead_point(pose, self.params.lookahead_mm);
        report.lookahead_mm = lookahead;

        let dems = TrajDems {
            speed_mms: self
                .profile
                .target_speed_mms(input_data.time_s, pose.distance_mm),
            heading_deg: self.heading_to(pose, &lookahead),
            curvature_mm: self.path.curvature(pose.x_mm()),
        };

        debug!(
            "TrajCtrl: lookahead ({:.1}, {:.1}), demands {:?}",
            lookahead[0], lookahead[1], dems
        );

        Ok((dems, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comms_if::tc::run::RunMode;

    fn params() -> Params {
        util::params::from_str(include_str!("../../../params/traj_ctrl.toml")).unwrap()
    }

    fn config(mode: RunMode) -> RunConfig {
        RunConfig {
            mode,
            target_distance_m: 8.0,
            target_time_s: 12.0,
            bonus_gap_m: 0.5,
        }
    }

    fn input(time_s: f64, x_mm: f64, y_mm: f64, distance_mm: f64) -> InputData {
        InputData {
            time_s,
            pose: Pose {
                position_mm: Vector2::new(x_mm, y_mm),
                heading_deg: 0.0,
                distance_mm,
            },
        }
    }

    #[test]
    fn test_straight_heading_correction() {
        let mut traj_ctrl = TrajCtrl::new(&config(RunMode::Straight), &params()).unwrap();

        // Left of the line, steer right (negative heading)
        let (dems, _) = traj_ctrl.proc(&input(1.0, 1000.0, 100.0, 1000.0)).unwrap();
        assert!(dems.heading_deg < 0.0);
        let expected = (-100.0f64).atan2(300.0).to_degrees();
        assert!((dems.heading_deg - expected).abs() < 1e-9);

        // Right of the line, steer left
        let (dems, _) = traj_ctrl.proc(&input(1.1, 1000.0, -100.0, 1000.0)).unwrap();
        assert!(dems.heading_deg > 0.0);
        assert!(dems.speed_mms > 0.0);
    }

    #[test]
    fn test_bonus_follows_curve() {
        let mut traj_ctrl = TrajCtrl::new(&config(RunMode::Bonus), &params()).unwrap();

        // On the centreline at the start, head left into the lane change
        let (dems, report) = traj_ctrl.proc(&input(0.1, 0.0, 0.0, 0.0)).unwrap();
        assert!(dems.heading_deg > 0.0);
        assert!(dems.curvature_mm > 0.0);
        assert!((report.lookahead_mm[1] - traj_ctrl.path().y_at(300.0)).abs() < 1e-9);

        // On the return arc, head right
        let x = 6000.0;
        let y = traj_ctrl.path().y_at(x);
        let (dems, _) = traj_ctrl.proc(&input(8.0, x, y, 6050.0)).unwrap();
        assert!(dems.heading_deg < 0.0);
        assert!(dems.curvature_mm < 0.0);
    }

    #[test]
    fn test_heading_zero_near_end() {
        let mut traj_ctrl = TrajCtrl::new(&config(RunMode::Straight), &params()).unwrap();

        let (dems, _) = traj_ctrl.proc(&input(11.0, 8190.0, 5.0, 8190.0)).unwrap();
        assert_eq!(dems.heading_deg, 0.0);
    }

    #[test]
    fn test_finishes_on_length() {
        let mut traj_ctrl = TrajCtrl::new(&config(RunMode::Straight), &params()).unwrap();
        assert!(!traj_ctrl.is_finished());

        let (dems, report) = traj_ctrl
            .proc(&input(12.0, 8200.0, 0.0, traj_ctrl.total_length_mm()))
            .unwrap();
        assert!(report.finished);
        assert!(traj_ctrl.is_finished());
        assert_eq!(dems, TrajDems::default());
        assert_eq!(report.dist_remaining_mm, 0.0);

        // Stays finished
        let (_, report) = traj_ctrl.proc(&input(12.1, 8200.0, 0.0, 0.0)).unwrap();
        assert!(report.finished);
    }

    #[test]
    fn test_construction_errors() {
        let mut bad_gap = config(RunMode::Bonus);
        bad_gap.bonus_gap_m = 1.0;
        assert!(matches!(
            TrajCtrl::new(&bad_gap, &params()),
            Err(TrajCtrlError::PathError(PathError::InvalidBonusGeometry { .. }))
        ));

        let mut params = params();
        params.profile = ProfileKind::SCurve;
        let mut too_fast = config(RunMode::Straight);
        too_fast.target_time_s = 3.0;
        assert!(matches!(
            TrajCtrl::new(&too_fast, &params),
            Err(TrajCtrlError::ProfileError(_))
        ));
    }

    #[test]
    fn test_invalid_pose() {
        let mut traj_ctrl = TrajCtrl::new(&config(RunMode::Straight), &params()).unwrap();
        assert!(matches!(
            traj_ctrl.proc(&input(1.0, f64::NAN, 0.0, 0.0)),
            Err(TrajCtrlError::InvalidPose(_))
        ));
    }
}
