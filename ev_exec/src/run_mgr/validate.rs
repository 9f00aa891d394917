//! Run configuration validation
//!
//! Validation is pure: it only reports problems and never changes the configuration. Each error
//! says whether it is fixable, meaning a single value is outside the event bounds and the operator
//! can correct it, or fatal, meaning the physical limits themselves make any run impossible.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use serde::Serialize;

use super::ValidationParams;
use crate::traj_ctrl;
use comms_if::tc::run::{RunConfig, RunMode};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A problem with a run configuration.
#[derive(Debug, Clone, Serialize, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ConfigError {
    pub message: String,

    /// The configuration or parameter key at fault, if there is a single one
    pub key: Option<&'static str>,

    pub fixable: bool,
}

/// Errors and warnings from validating a run configuration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ValidationReport {
    /// True if there is at least one error which cannot be fixed by changing the configuration.
    pub fn has_fatal(&self) -> bool {
        self.errors.iter().any(|e| !e.fixable)
    }

    fn fixable(&mut self, key: &'static str, message: String) {
        self.errors.push(ConfigError {
            message,
            key: Some(key),
            fixable: true,
        });
    }

    fn fatal(&mut self, key: &'static str, message: String) {
        self.errors.push(ConfigError {
            message,
            key: Some(key),
            fixable: false,
        });
    }

    fn check_range(&mut self, key: &'static str, value: f64, min: f64, max: f64, units: &str) {
        if !value.is_finite() {
            self.fatal(key, format!("{} must be a finite number, got {}", key, value));
        } else if value < min || value > max {
            self.fixable(
                key,
                format!(
                    "{} = {} {} is outside the allowed range [{}, {}] {}",
                    key, value, units, min, max, units
                ),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Check a run configuration against the event bounds and the vehicle's physical limits.
pub fn validate_run_config(
    run_config: &RunConfig,
    bounds: &ValidationParams,
    traj_params: &traj_ctrl::Params,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !bounds.enabled {
        warn!("Run configuration validation is disabled");
        return report;
    }

    for &(key, value) in [
        ("max_speed_mms", traj_params.max_speed_mms),
        ("max_accel_mms2", traj_params.max_accel_mms2),
        ("max_decel_mms2", traj_params.max_decel_mms2),
    ]
    .iter()
    {
        if !(value > 0.0) {
            report.fatal(key, format!("{} must be positive, got {}", key, value));
        }
    }

    report.check_range(
        "target_distance_m",
        run_config.target_distance_m,
        bounds.min_target_distance_m,
        bounds.max_target_distance_m,
        "m",
    );
    report.check_range(
        "target_time_s",
        run_config.target_time_s,
        bounds.min_target_time_s,
        bounds.max_target_time_s,
        "s",
    );

    match run_config.mode {
        RunMode::Bonus => report.check_range(
            "bonus_gap_m",
            run_config.bonus_gap_m,
            bounds.min_bonus_gap_m,
            bounds.max_bonus_gap_m,
            "m",
        ),
        RunMode::Straight => {
            if run_config.bonus_gap_m != 0.0 {
                report.warnings.push(format!(
                    "bonus_gap_m = {} is ignored in {} mode",
                    run_config.bonus_gap_m, run_config.mode
                ));
            }
        }
    }

    report
}
