//! # Trajectory control module
//!
//! Trajectory control is responsible for deciding where the vehicle should be heading and how
//! fast it should be going. It owns two things, both built once at the start of a run:
//!
//! - The reference [`Path`], either a straight line to the target or the bonus lane change around
//!   the cans. A pure pursuit lookahead point on the path gives the target heading.
//! - The [`SpeedProfile`], which gives the target speed from the elapsed time and distance
//!   travelled so that the vehicle stops at the target distance at the target time.
//!
//! The path curvature under the vehicle is also passed on so that steering control can use it as
//! a feedforward term.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod path;
pub mod profile;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::{Params, ProfileKind};
pub use path::*;
pub use profile::*;
pub use state::*;
