//! Run manager state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;

// Internal
use super::*;
use crate::{
    loc::{OdomInput, Odometry, Pose},
    params::VehicleParams,
    steer_ctrl::{self, SteerCtrl},
    traj_ctrl::{self, TrajCtrl, TrajDems},
    vehicle::Vehicle,
};
use comms_if::{
    eqpt::drive::{DriveDems, DriveSensData},
    tc::run::RunConfig,
};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Manages a single run.
pub struct RunMgr {
    params: Params,
    run_config: RunConfig,

    odom: Odometry,
    traj_ctrl: TrajCtrl,
    steer_ctrl: SteerCtrl,

    stall_guard: StallGuard,
    timeout_guard: TimeoutGuard,

    archive: RunArchive,
    events: Vec<EventRecord>,

    /// Time of the last telemetry record
    last_tm_s: Option<f64>,
}

/// Everything computed in one control cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TickOutput {
    pub pose: Pose,
    pub traj_dems: TrajDems,
    pub drive_dems: DriveDems,

    /// Distance left along the path
    ///
    /// Units: millimeters
    pub dist_remaining_mm: f64,

    /// True once the path has been completed. The drive demand is then a hold.
    pub finished: bool,
}

/// The result of a run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunSummary {
    pub outcome: RunOutcome,

    /// Distance travelled along the ground
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Time from the start of the control loop to the end of the run
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Run time minus the target time
    ///
    /// Units: seconds
    pub time_error_s: f64,

    /// Estimated final position
    pub final_x_mm: f64,
    pub final_y_mm: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum RunOutcome {
    /// The full path length was travelled
    Complete,

    /// Stopped by the stall guard, did not finish
    Stalled,

    /// Stopped by the timeout guard, did not finish
    TimedOut,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RunMgr {
    /// Build the controllers for a run.
    ///
    /// The path and speed profile are solved here, so an infeasible run is rejected before the
    /// vehicle moves.
    pub fn new(
        run_config: &RunConfig,
        params: &Params,
        traj_params: &traj_ctrl::Params,
        steer_params: &steer_ctrl::Params,
        vehicle_params: &VehicleParams,
    ) -> Result<Self, RunError> {
        if !(params.cycle_period_s > 0.0) {
            return Err(RunError::InvalidParam(format!(
                "cycle_period_s must be positive, got {}",
                params.cycle_period_s
            )));
        }

        let traj_ctrl = TrajCtrl::new(run_config, traj_params)?;
        let steer_ctrl = SteerCtrl::new(steer_params, vehicle_params, traj_params.max_speed_mms)?;

        Ok(Self {
            params: params.clone(),
            run_config: *run_config,
            odom: Odometry::new(vehicle_params),
            traj_ctrl,
            steer_ctrl,
            stall_guard: StallGuard::new(params.stall_threshold_mm, params.stall_window_s),
            timeout_guard: TimeoutGuard::new(run_config.target_time_s, params.timeout_factor),
            archive: RunArchive::disabled(),
            events: Vec::new(),
            last_tm_s: None,
        })
    }

    /// Archive telemetry and events for this run.
    pub fn with_archive(mut self, archive: RunArchive) -> Self {
        self.archive = archive;
        self
    }

    /// Set the gyro drift rate measured by calibration.
    pub fn set_drift_rate(&mut self, drift_rate_dps: f64) {
        self.odom.set_drift_rate(drift_rate_dps);
    }

    pub fn traj_ctrl(&self) -> &TrajCtrl {
        &self.traj_ctrl
    }

    /// Events raised so far in this run.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Prepare for the control loop, zeroing the pose on the given sensor readings.
    pub fn start(&mut self, sens: &DriveSensData) -> Result<(), RunError> {
        self.odom.reset(0.0, sens);
        self.steer_ctrl.arm(0.0);
        self.stall_guard.reset(0.0, 0.0);
        self.last_tm_s = None;
        self.event(0.0, RunEvent::Start)
    }

    /// Process one control cycle.
    ///
    /// `time_s` is the time since the run started.
    pub fn tick(&mut self, time_s: f64, sens: &DriveSensData) -> Result<TickOutput, RunError> {
        let (pose, _) = self.odom.proc(&OdomInput {
            time_s,
            sens: *sens,
        })?;

        let (traj_dems, traj_report) = self
            .traj_ctrl
            .proc(&traj_ctrl::InputData { time_s, pose })?;

        let drive_dems = if traj_report.finished {
            self.steer_ctrl.stop()
        } else {
            let (dems, steer_report) = self.steer_ctrl.proc(&steer_ctrl::InputData {
                time_s,
                pose,
                traj_dems,
            })?;
            debug!(
                "Heading error {:.2} deg, demand {:?}",
                steer_report.heading_error_deg, dems
            );
            dems
        };

        Ok(TickOutput {
            pose,
            traj_dems,
            drive_dems,
            dist_remaining_mm: traj_report.dist_remaining_mm,
            finished: traj_report.finished,
        })
    }

    /// Execute the run on the vehicle, blocking until it ends.
    pub fn run<V: Vehicle>(&mut self, vehicle: &mut V) -> Result<RunSummary, RunError> {
        self.event(0.0, RunEvent::Ready)?;

        let t0_s = vehicle.time_s();
        let sens = vehicle.read_sens()?;
        self.start(&sens)?;

        info!(
            "Run started: {} mode, {:.2} m in {:.2} s",
            self.run_config.mode, self.run_config.target_distance_m, self.run_config.target_time_s
        );

        let mut elapsed_s;
        let mut last_pose;

        let outcome = loop {
            let cycle_start_s = vehicle.time_s();
            elapsed_s = cycle_start_s - t0_s;

            let sens = vehicle.read_sens()?;
            let out = self.tick(elapsed_s, &sens)?;
            last_pose = out.pose;

            if out.finished {
                break RunOutcome::Complete;
            }

            vehicle.send_dems(&out.drive_dems)?;

            self.write_tm(elapsed_s, &out, false)?;

            if self.stall_guard.check(elapsed_s, out.pose.distance_mm) {
                self.event(elapsed_s, RunEvent::StallDetected)?;
                break RunOutcome::Stalled;
            }

            if self.timeout_guard.check(elapsed_s) {
                self.event(elapsed_s, RunEvent::TimeoutGuard)?;
                break RunOutcome::TimedOut;
            }

            // Wait out the remainder of the cycle
            let cycle_used_s = vehicle.time_s() - cycle_start_s;
            if cycle_used_s > self.params.cycle_period_s {
                warn!(
                    "Cycle overran: {:.4} s used of {:.4} s",
                    cycle_used_s, self.params.cycle_period_s
                );
            }
            vehicle.wait(self.params.cycle_period_s - cycle_used_s);
        };

        let hold = self.steer_ctrl.stop();
        vehicle.send_dems(&hold)?;

        self.write_tm(
            elapsed_s,
            &TickOutput {
                pose: last_pose,
                traj_dems: TrajDems::default(),
                drive_dems: hold,
                dist_remaining_mm: (self.traj_ctrl.total_length_mm() - last_pose.distance_mm)
                    .max(0.0),
                finished: outcome == RunOutcome::Complete,
            },
            true,
        )?;
        self.event(elapsed_s, RunEvent::Complete)?;

        let summary = RunSummary {
            outcome,
            distance_m: last_pose.distance_mm / 1000.0,
            time_s: elapsed_s,
            time_error_s: elapsed_s - self.run_config.target_time_s,
            final_x_mm: last_pose.x_mm(),
            final_y_mm: last_pose.y_mm(),
        };

        info!(
            "Run ended: {:?}, {:.3} m in {:.2} s (time error {:+.2} s)",
            summary.outcome, summary.distance_m, summary.time_s, summary.time_error_s
        );

        Ok(summary)
    }

    fn event(&mut self, time_s: f64, event: RunEvent) -> Result<(), RunError> {
        let record = EventRecord { time_s, event };
        self.events.push(record);
        self.archive.write_event(&record)?;
        Ok(())
    }

    /// Write a telemetry record if one is due, or always if `force` is set.
    fn write_tm(&mut self, time_s: f64, out: &TickOutput, force: bool) -> Result<(), RunError> {
        let due = self
            .last_tm_s
            .map_or(true, |t| time_s - t >= self.params.tm_interval_s);
        if !(due || force) {
            return Ok(());
        }
        self.last_tm_s = Some(time_s);

        let record = TmRecord {
            time_s,
            x_mm: out.pose.x_mm(),
            y_mm: out.pose.y_mm(),
            heading_deg: out.pose.heading_deg,
            distance_mm: out.pose.distance_mm,
            speed_dem_mms: out.traj_dems.speed_mms,
            heading_dem_deg: out.traj_dems.heading_deg,
            curvature_dem_mm: out.traj_dems.curvature_mm,
            drift_rate_dps: self.odom.drift_rate_dps(),
            target_distance_mm: self.traj_ctrl.path().target_mm(),
            bonus_gap_m: self.run_config.bonus_gap_m,
        };

        info!(
            "t = {:.2} s, pos = ({:.0}, {:.0}) mm, head = {:.1} deg, dist = {:.0} mm, v_dem = {:.0} mm/s",
            record.time_s,
            record.x_mm,
            record.y_mm,
            record.heading_deg,
            record.distance_mm,
            record.speed_dem_mms
        );

        self.archive.write_tm(&record)?;
        Ok(())
    }
}
