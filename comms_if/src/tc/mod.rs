//! # Run configuration module
//!
//! Provides the run configuration accepted from the user interface or
//! configuration collaborator.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod run;
