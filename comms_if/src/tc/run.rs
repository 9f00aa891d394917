//! # Run Configuration Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use structopt::StructOpt;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The configuration of a single run.
///
/// This is immutable once the run has started. It must be validated against the event bounds
/// before being used to build a run.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// The run mode, which selects the path to drive.
    pub mode: RunMode,

    /// The target distance to stop at.
    ///
    /// Units: meters
    pub target_distance_m: f64,

    /// The target time to complete the run in.
    ///
    /// Units: seconds
    pub target_time_s: f64,

    /// The gap between the outer can's inside edge and the inner can's outside edge, only used in
    /// bonus mode.
    ///
    /// Units: meters
    #[serde(default)]
    pub bonus_gap_m: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Available run modes.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunMode {
    /// Drive a straight line to the target.
    Straight,

    /// Drive the bonus lane-change manouvre between the cans, returning to the centreline at the
    /// target.
    Bonus,
}

/// A run command given on the command line.
#[derive(Debug, Copy, Clone, StructOpt)]
pub enum RunCmd {
    /// Drive straight to the target distance.
    #[structopt(name = "straight")]
    Straight {
        /// The target distance in meters.
        target_distance_m: f64,

        /// The target time in seconds.
        target_time_s: f64,
    },

    /// Drive the bonus manouvre between the cans.
    #[structopt(name = "bonus")]
    Bonus {
        /// The target distance in meters.
        target_distance_m: f64,

        /// The target time in seconds.
        target_time_s: f64,

        /// The gap between the cans in meters.
        bonus_gap_m: f64,
    },
}

/// Error parsing a run mode from a string.
#[derive(Debug, Error)]
#[error("Unrecognised run mode \"{0}\", expected STRAIGHT or BONUS")]
pub struct ParseRunModeError(String);

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl FromStr for RunMode {
    type Err = ParseRunModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STRAIGHT" => Ok(RunMode::Straight),
            "BONUS" => Ok(RunMode::Bonus),
            _ => Err(ParseRunModeError(s.to_string())),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Straight => write!(f, "STRAIGHT"),
            RunMode::Bonus => write!(f, "BONUS"),
        }
    }
}

impl From<RunCmd> for RunConfig {
    fn from(cmd: RunCmd) -> Self {
        match cmd {
            RunCmd::Straight {
                target_distance_m,
                target_time_s,
            } => RunConfig {
                mode: RunMode::Straight,
                target_distance_m,
                target_time_s,
                bonus_gap_m: 0.0,
            },
            RunCmd::Bonus {
                target_distance_m,
                target_time_s,
                bonus_gap_m,
            } => RunConfig {
                mode: RunMode::Bonus,
                target_distance_m,
                target_time_s,
                bonus_gap_m,
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_run_config_json() {
        let cfg: RunConfig = serde_json::from_str(
            r#"{"mode": "BONUS", "target_distance_m": 8.0, "target_time_s": 12.0, "bonus_gap_m": 0.3}"#,
        )
        .unwrap();

        assert_eq!(cfg.mode, RunMode::Bonus);
        assert_eq!(cfg.bonus_gap_m, 0.3);

        // Gap is optional for straight runs
        let cfg: RunConfig = serde_json::from_str(
            r#"{"mode": "STRAIGHT", "target_distance_m": 7.0, "target_time_s": 10.0}"#,
        )
        .unwrap();

        assert_eq!(cfg.mode, RunMode::Straight);
        assert_eq!(cfg.bonus_gap_m, 0.0);

        assert!(serde_json::from_str::<RunConfig>(
            r#"{"mode": "ZIGZAG", "target_distance_m": 7.0, "target_time_s": 10.0}"#
        )
        .is_err());
    }

    #[test]
    fn test_run_mode_from_str() {
        assert_eq!("bonus".parse::<RunMode>().unwrap(), RunMode::Bonus);
        assert_eq!("STRAIGHT".parse::<RunMode>().unwrap(), RunMode::Straight);
        assert!("sideways".parse::<RunMode>().is_err());
    }

    #[test]
    fn test_run_cmd_into_config() {
        let cmd = RunCmd::from_iter_safe(&["run", "bonus", "8.0", "12.0", "0.25"]).unwrap();
        let cfg = RunConfig::from(cmd);

        assert_eq!(cfg.mode, RunMode::Bonus);
        assert_eq!(cfg.target_distance_m, 8.0);
        assert_eq!(cfg.target_time_s, 12.0);
        assert_eq!(cfg.bonus_gap_m, 0.25);
    }
}
