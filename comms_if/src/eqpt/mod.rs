//! # Equipment Interface
//!
//! This module defines the interface structures exchanged with the vehicle's equipment.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod drive;
