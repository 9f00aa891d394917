//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root.
pub const SW_ROOT_ENV_VAR: &str = "EV_SW_ROOT";

/// Get the software root directory (the directory containing `params` and
/// `sessions`) from the `EV_SW_ROOT` environment variable.
pub fn get_ev_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
