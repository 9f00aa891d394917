//! Main EV executable entry point.
//!
//! # Architecture
//!
//! One execution is one run:
//!
//!     - Load parameters and the run configuration
//!     - Validate the run configuration against the event bounds
//!     - Build the run, solving the path and speed profile
//!     - Calibrate the gyro drift with the vehicle stationary
//!     - Execute the run control loop until complete, stalled or timed out
//!     - Save the run summary in the session directory
//!
//! The run configuration comes from `run.toml` unless one is given on the command line, for
//! example `ev_exec bonus 8.0 12.0 0.5`. `--mode` switches the mode of the configured run, for
//! example `ev_exec --mode bonus` drives the bonus path with the distance, time and gap from
//! `run.toml`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{error, info, warn};
use structopt::StructOpt;

// Internal
use comms_if::tc::run::{RunCmd, RunConfig, RunMode};
use ev_lib::{
    loc::calibrate_drift,
    params::VehicleParams,
    run_mgr::{self, validate_run_config, RunArchive, RunMgr},
    sim_client::{SimParams, SimVehicle},
    steer_ctrl, traj_ctrl,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "ev_exec", about = "Drive a single EV run")]
struct ExecArgs {
    /// Run to execute, overriding run.toml
    #[structopt(subcommand)]
    run: Option<RunCmd>,

    /// Override the run mode (straight or bonus)
    #[structopt(long)]
    mode: Option<RunMode>,

    /// Run the simulated vehicle in real time
    #[structopt(long)]
    realtime: bool,

    /// Skip gyro drift calibration
    #[structopt(long)]
    no_calib: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = ExecArgs::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("ev_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Info, Some(&session)).wrap_err("Failed to initialise logging")?;

    info!("EV Motion Control Executable\n");
    info!(
        "Software root: {:?}",
        host::get_ev_sw_root().wrap_err("Failed to get the software root")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let vehicle_params: VehicleParams =
        util::params::load("vehicle.toml").wrap_err("Could not load vehicle params")?;
    let traj_params: traj_ctrl::Params =
        util::params::load("traj_ctrl.toml").wrap_err("Could not load trajectory params")?;
    let steer_params: steer_ctrl::Params =
        util::params::load("steer_ctrl.toml").wrap_err("Could not load steering params")?;
    let run_mgr_params: run_mgr::Params =
        util::params::load("run_mgr.toml").wrap_err("Could not load run manager params")?;

    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load simulation params")?;

    let mut run_config: RunConfig = match args.run {
        Some(cmd) => cmd.into(),
        None => util::params::load("run.toml").wrap_err("Could not load the run configuration")?,
    };
    if let Some(mode) = args.mode {
        run_config.mode = mode;
    }

    info!("Parameters loaded");
    info!("Run configuration: {:?}", run_config);

    // ---- VALIDATE ----

    let report = validate_run_config(&run_config, &run_mgr_params.validation, &traj_params);
    for w in report.warnings.iter() {
        warn!("{}", w);
    }
    for e in report.errors.iter() {
        if e.fixable {
            warn!("Run configuration out of bounds, continuing: {}", e);
        } else {
            error!("Invalid configuration: {}", e);
        }
    }
    if report.has_fatal() {
        return Err(eyre!(
            "The configuration has {} fatal error(s), see the log for details",
            report.errors.iter().filter(|e| !e.fixable).count()
        ));
    }

    // ---- BUILD RUN ----

    let mut run_mgr = RunMgr::new(
        &run_config,
        &run_mgr_params,
        &traj_params,
        &steer_params,
        &vehicle_params,
    )
    .wrap_err("Failed to build the run")?
    .with_archive(RunArchive::new(&session).wrap_err("Failed to open the run archives")?);

    let mut vehicle = SimVehicle::new(
        vehicle_params,
        SimParams {
            realtime: sim_params.realtime || args.realtime,
            ..sim_params
        },
    )
    .wrap_err("Invalid simulation params")?;

    // ---- CALIBRATE ----

    if run_mgr_params.calibrate_before_run && !args.no_calib {
        let mut next_report = 0.25;
        let mut progress = |fraction: f64| {
            if fraction >= next_report {
                info!("Calibration {:.0} % complete", fraction * 100.0);
                next_report += 0.25;
            }
        };

        let drift_rate_dps = calibrate_drift(
            &mut vehicle,
            run_mgr_params.calib_duration_s,
            run_mgr_params.calib_period_s,
            Some(&mut progress),
        )
        .wrap_err("Gyro calibration failed")?;

        run_mgr.set_drift_rate(drift_rate_dps);
    } else {
        warn!("Gyro calibration skipped, heading will not be drift corrected");
    }

    // ---- RUN ----

    let summary = run_mgr.run(&mut vehicle).wrap_err("Run failed")?;

    session.save("run_config.json", run_config);
    session.save("run_summary.json", summary);

    session.exit();

    Ok(())
}
