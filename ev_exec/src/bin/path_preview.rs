//! # Path Preview
//!
//! Samples the reference path and speed profile of a run into a CSV file for plotting, without
//! driving anything. Parameters are loaded from `$EV_SW_ROOT/params` as for a real run.
//!
//! ```text
//! path_preview --output bonus.csv bonus 8.0 12.0 0.5
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Result};
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use structopt::StructOpt;

use comms_if::tc::run::{RunCmd, RunConfig};
use ev_lib::traj_ctrl::{self, Path, SpeedProfile};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "path_preview", about = "Sample a run's path and speed profile to CSV")]
struct Args {
    /// Output CSV file
    #[structopt(short, long, parse(from_os_str), default_value = "path_preview.csv")]
    output: PathBuf,

    /// Number of samples along the path
    #[structopt(short, long, default_value = "500")]
    samples: usize,

    #[structopt(subcommand)]
    run: RunCmd,
}

/// A sample of the path at one X position and of the profile at the matching fraction of the
/// target time.
#[derive(Debug, Serialize)]
struct Sample {
    x_mm: f64,
    y_mm: f64,
    heading_deg: f64,
    curvature_mm: f64,
    time_s: f64,
    speed_mms: f64,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;
    logger_init(LevelFilter::Info, None).wrap_err("Failed to initialise logging")?;

    let args = Args::from_args();
    let run_config: RunConfig = args.run.into();

    let traj_params: traj_ctrl::Params =
        util::params::load("traj_ctrl.toml").wrap_err("Could not load trajectory params")?;

    let path = Path::new(&run_config, &traj_params).wrap_err("Could not build the path")?;
    let mut profile = SpeedProfile::new(
        traj_params.profile,
        path.total_length_mm(),
        run_config.target_time_s,
        &traj_params,
    )
    .wrap_err("Could not build the speed profile")?;

    if let Path::Bonus(bonus) = &path {
        info!(
            "Bonus lane change: peak offset {:.1} mm at x = {:.1} mm, return arc radius {:.1} mm",
            bonus.sagitta_mm(),
            bonus.mid_x_mm(),
            bonus.radius_mm()
        );
    }

    let mut archiver = Archiver::at(&args.output).wrap_err("Could not open the output file")?;

    let samples = args.samples.max(2);
    for i in 0..samples {
        let fraction = i as f64 / (samples - 1) as f64;
        let x_mm = fraction * path.target_mm();
        let time_s = fraction * run_config.target_time_s;

        // The closed loop profile is previewed assuming the vehicle tracks it exactly, so the
        // distance fed back is the fraction of the path length
        let speed_mms = profile.target_speed_mms(time_s, fraction * path.total_length_mm());

        archiver
            .serialise(Sample {
                x_mm,
                y_mm: path.y_at(x_mm),
                heading_deg: path.slope_at(x_mm).atan().to_degrees(),
                curvature_mm: path.curvature(x_mm),
                time_s,
                speed_mms,
            })
            .wrap_err("Could not write a sample")?;
    }

    info!(
        "Wrote {} samples of a {:.1} mm path to {:?}",
        samples,
        path.total_length_mm(),
        args.output
    );

    Ok(())
}
