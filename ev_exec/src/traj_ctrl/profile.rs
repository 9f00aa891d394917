//! # Speed profiles
//!
//! Two models are provided behind [`SpeedProfile`]:
//!
//! - [`SpeedCtrl`], the default, recomputes a rate limited target speed every cycle from the
//!   remaining distance and time, so it corrects for any slip or lag accumulated so far.
//! - [`SCurveProfile`] solves a smooth trapezoid once at construction and then plays it back as a
//!   pure function of time, ignoring the distance actually travelled.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, trace};
use serde::Serialize;
use std::f64::consts::PI;

use super::{Params, ProfileKind};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Closed loop speed controller.
#[derive(Debug, Clone, Serialize)]
pub struct SpeedCtrl {
    target_dist_mm: f64,
    target_time_s: f64,

    max_speed_mms: f64,
    max_accel_mms2: f64,
    max_decel_mms2: f64,
    creep_speed_mms: f64,
    min_crawl_speed_mms: f64,
    tolerance_mm: f64,

    /// Time of the previous update
    last_time_s: f64,

    /// Speed commanded at the previous update
    last_speed_mms: f64,
}

/// Closed form speed profile using half-cosine acceleration and deceleration phases with a
/// constant speed cruise between them.
#[derive(Debug, Clone, Serialize)]
pub struct SCurveProfile {
    total_time_s: f64,

    /// Peak (cruise) speed
    ///
    /// Units: millimeters/second
    peak_speed_mms: f64,

    /// Duration of the acceleration phase
    t_acc_s: f64,

    /// Duration of the cruise phase
    t_cruise_s: f64,

    /// Duration of the deceleration phase
    t_dec_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The speed profile used for a run.
#[derive(Debug, Clone, Serialize)]
pub enum SpeedProfile {
    Dynamic(SpeedCtrl),

    /// Closed form profile, raised to the creep speed if the path is still unfinished once the
    /// profile has run out.
    SCurve {
        profile: SCurveProfile,
        target_dist_mm: f64,
        creep_speed_mms: f64,
    },
}

/// Errors raised while building a speed profile. These are all construction time errors, a
/// profile that builds will always produce a speed.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Speed and acceleration limits must be positive")]
    InvalidLimits,

    #[error("Target distance ({0} mm) and time ({1} s) must be positive")]
    InvalidTarget(f64, f64),

    #[error("Profile infeasible with the given acceleration limits and time (discriminant {0})")]
    Infeasible(f64),

    #[error("No positive peak speed satisfies the constraints")]
    NoPositiveRoot,

    #[error("Peak speed {peak_mms:.1} mm/s exceeds the configured maximum {max_mms:.1} mm/s")]
    PeakExceedsMax { peak_mms: f64, max_mms: f64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SpeedProfile {
    /// Build the profile model selected in the parameters.
    pub fn new(
        kind: ProfileKind,
        target_dist_mm: f64,
        target_time_s: f64,
        params: &Params,
    ) -> Result<Self, ProfileError> {
        match kind {
            ProfileKind::Dynamic => Ok(SpeedProfile::Dynamic(SpeedCtrl::new(
                target_dist_mm,
                target_time_s,
                params,
            )?)),
            ProfileKind::SCurve => Ok(SpeedProfile::SCurve {
                profile: SCurveProfile::new(
                    target_dist_mm,
                    target_time_s,
                    params.max_accel_mms2,
                    params.max_decel_mms2,
                    Some(params.max_speed_mms),
                )?,
                target_dist_mm,
                creep_speed_mms: params.creep_speed_mms,
            }),
        }
    }

    /// Get the target speed for the current time and distance travelled.
    ///
    /// Units: seconds and millimeters in, millimeters/second out
    pub fn target_speed_mms(&mut self, time_s: f64, distance_mm: f64) -> f64 {
        match self {
            SpeedProfile::Dynamic(c) => c.target_speed_mms(time_s, distance_mm),
            SpeedProfile::SCurve {
                profile,
                target_dist_mm,
                creep_speed_mms,
            } => {
                let speed_mms = profile.velocity_at(time_s);
                if time_s >= profile.total_time_s() && distance_mm < *target_dist_mm {
                    speed_mms.max(*creep_speed_mms)
                } else {
                    speed_mms
                }
            }
        }
    }
}

impl SpeedCtrl {
    pub fn new(target_dist_mm: f64, target_time_s: f64, params: &Params) -> Result<Self, ProfileError> {
        check_limits(
            params.max_accel_mms2,
            params.max_decel_mms2,
            Some(params.max_speed_mms),
        )?;
        check_target(target_dist_mm, target_time_s)?;

        Ok(Self {
            target_dist_mm,
            target_time_s,
            max_speed_mms: params.max_speed_mms,
            max_accel_mms2: params.max_accel_mms2,
            max_decel_mms2: params.max_decel_mms2,
            creep_speed_mms: params.creep_speed_mms,
            min_crawl_speed_mms: params.min_crawl_speed_mms,
            tolerance_mm: params.target_tolerance_mm,
            last_time_s: 0.0,
            last_speed_mms: 0.0,
        })
    }

    /// Compute the speed demand for this cycle.
    ///
    /// Time must increase between calls. If it does not the previous demand is returned and the
    /// controller state is left untouched.
    pub fn target_speed_mms(&mut self, time_s: f64, distance_mm: f64) -> f64 {
        let dt = time_s - self.last_time_s;
        if dt <= 0.0 {
            return self.last_speed_mms;
        }
        self.last_time_s = time_s;

        let dist_remaining_mm = self.target_dist_mm - distance_mm;
        let time_remaining_s = self.target_time_s - time_s;

        // Average speed needed to arrive on time. Once overdue we creep in to finish accurately.
        let required_mms = if dist_remaining_mm <= 0.0 {
            0.0
        } else if time_remaining_s <= 0.0 {
            self.creep_speed_mms
        } else {
            dist_remaining_mm / time_remaining_s
        };

        // Fastest speed from which we can still stop in the remaining distance, v^2 = 2ad
        let safe_mms = if dist_remaining_mm > 0.0 {
            (2.0 * self.max_decel_mms2 * dist_remaining_mm).sqrt()
        } else {
            0.0
        };

        let mut target_mms = required_mms.min(safe_mms).min(self.max_speed_mms);

        if time_remaining_s <= 0.0
            && dist_remaining_mm > self.tolerance_mm
            && target_mms < self.min_crawl_speed_mms
        {
            target_mms = target_mms.max(self.creep_speed_mms);
        }

        // Rate limit the change from the previous demand
        let speed_mms = if target_mms > self.last_speed_mms {
            target_mms.min(self.last_speed_mms + self.max_accel_mms2 * dt)
        } else {
            target_mms.max(self.last_speed_mms - self.max_decel_mms2 * dt)
        };

        trace!(
            "SpeedCtrl: required {:.1}, safe {:.1}, demand {:.1} mm/s",
            required_mms,
            safe_mms,
            speed_mms
        );

        self.last_speed_mms = speed_mms;
        speed_mms
    }
}

impl SCurveProfile {
    /// Solve the profile covering `distance_mm` in exactly `total_time_s`.
    ///
    /// A half-cosine ramp to speed `v` with acceleration limit `a` lasts `v*pi/(2a)` and covers
    /// half the distance a constant `v` would, so the total distance is
    /// `v*T - (pi/4)(1/a + 1/d) v^2`. The peak speed is the smaller positive root of that
    /// quadratic.
    pub fn new(
        distance_mm: f64,
        total_time_s: f64,
        max_accel_mms2: f64,
        max_decel_mms2: f64,
        max_speed_mms: Option<f64>,
    ) -> Result<Self, ProfileError> {
        check_limits(max_accel_mms2, max_decel_mms2, max_speed_mms)?;
        check_target(distance_mm, total_time_s)?;

        let a_term = (PI / 4.0) * (1.0 / max_accel_mms2 + 1.0 / max_decel_mms2);
        let discriminant = total_time_s.powi(2) - 4.0 * a_term * distance_mm;
        if discriminant < 0.0 {
            return Err(ProfileError::Infeasible(discriminant));
        }

        let root = discriminant.sqrt();
        let peak_speed_mms = [
            (total_time_s - root) / (2.0 * a_term),
            (total_time_s + root) / (2.0 * a_term),
        ]
        .iter()
        .copied()
        .filter(|v| *v > 0.0)
        .fold(None, |min: Option<f64>, v| Some(min.map_or(v, |m| m.min(v))))
        .ok_or(ProfileError::NoPositiveRoot)?;

        if let Some(max_mms) = max_speed_mms {
            if peak_speed_mms > max_mms {
                return Err(ProfileError::PeakExceedsMax {
                    peak_mms: peak_speed_mms,
                    max_mms,
                });
            }
        }

        let t_acc_s = peak_speed_mms * PI / (2.0 * max_accel_mms2);
        let t_dec_s = peak_speed_mms * PI / (2.0 * max_decel_mms2);
        let t_cruise_s = (total_time_s - t_acc_s - t_dec_s).max(0.0);

        info!(
            "Profile: v_max = {:.1} mm/s, t_acc = {:.2} s, t_cruise = {:.2} s, t_dec = {:.2} s",
            peak_speed_mms, t_acc_s, t_cruise_s, t_dec_s
        );

        Ok(Self {
            total_time_s,
            peak_speed_mms,
            t_acc_s,
            t_cruise_s,
            t_dec_s,
        })
    }

    /// Velocity at the given time. Zero outside `[0, total_time]`.
    ///
    /// Units: seconds in, millimeters/second out
    pub fn velocity_at(&self, t_s: f64) -> f64 {
        if t_s < 0.0 || t_s > self.total_time_s {
            return 0.0;
        }

        let start_dec_s = self.t_acc_s + self.t_cruise_s;

        if t_s < self.t_acc_s {
            let progress = t_s / self.t_acc_s;
            self.peak_speed_mms * (1.0 - (PI * progress).cos()) / 2.0
        } else if t_s < start_dec_s {
            self.peak_speed_mms
        } else {
            let progress = ((t_s - start_dec_s) / self.t_dec_s).min(1.0);
            self.peak_speed_mms * (1.0 + (PI * progress).cos()) / 2.0
        }
    }

    pub fn peak_speed_mms(&self) -> f64 {
        self.peak_speed_mms
    }

    pub fn total_time_s(&self) -> f64 {
        self.total_time_s
    }

    /// Times at which the acceleration phase ends and the deceleration phase starts.
    pub fn phase_boundaries_s(&self) -> (f64, f64) {
        (self.t_acc_s, self.t_acc_s + self.t_cruise_s)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_limits(
    max_accel_mms2: f64,
    max_decel_mms2: f64,
    max_speed_mms: Option<f64>,
) -> Result<(), ProfileError> {
    if !(max_accel_mms2 > 0.0) || !(max_decel_mms2 > 0.0) || max_speed_mms.map_or(false, |v| !(v > 0.0)) {
        return Err(ProfileError::InvalidLimits);
    }
    Ok(())
}

fn check_target(distance_mm: f64, time_s: f64) -> Result<(), ProfileError> {
    if !(distance_mm > 0.0) || !(time_s > 0.0) {
        return Err(ProfileError::InvalidTarget(distance_mm, time_s));
    }
    Ok(())
}
