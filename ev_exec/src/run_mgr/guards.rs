//! Run termination guards

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, warn};
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Detects the vehicle failing to make progress.
///
/// Once per window the distance travelled since the previous check is compared against a
/// threshold.
#[derive(Debug, Clone, Serialize)]
pub struct StallGuard {
    threshold_mm: f64,
    window_s: f64,

    /// Time and distance at the start of the current window
    ref_time_s: f64,
    ref_distance_mm: f64,
}

/// Stops a run which has taken too long.
#[derive(Debug, Clone, Serialize)]
pub struct TimeoutGuard {
    limit_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StallGuard {
    pub fn new(threshold_mm: f64, window_s: f64) -> Self {
        Self {
            threshold_mm,
            window_s,
            ref_time_s: 0.0,
            ref_distance_mm: 0.0,
        }
    }

    /// Start a new window at the given time and distance.
    pub fn reset(&mut self, time_s: f64, distance_mm: f64) {
        self.ref_time_s = time_s;
        self.ref_distance_mm = distance_mm;
    }

    /// Returns true if the vehicle has stalled.
    pub fn check(&mut self, time_s: f64, distance_mm: f64) -> bool {
        if time_s - self.ref_time_s < self.window_s {
            return false;
        }

        let moved_mm = (distance_mm - self.ref_distance_mm).abs();
        if moved_mm < self.threshold_mm {
            warn!(
                "Stall detected: {:.1} mm travelled in {:.2} s",
                moved_mm,
                time_s - self.ref_time_s
            );
            return true;
        }

        debug!("Stall check passed, {:.1} mm travelled", moved_mm);
        self.reset(time_s, distance_mm);
        false
    }
}

impl TimeoutGuard {
    pub fn new(target_time_s: f64, timeout_factor: f64) -> Self {
        Self {
            limit_s: target_time_s * timeout_factor,
        }
    }

    pub fn limit_s(&self) -> f64 {
        self.limit_s
    }

    /// Returns true if the run has timed out.
    pub fn check(&self, elapsed_s: f64) -> bool {
        if elapsed_s >= self.limit_s {
            warn!(
                "Run timed out after {:.2} s (limit {:.2} s)",
                elapsed_s, self.limit_s
            );
            true
        } else {
            false
        }
    }
}
