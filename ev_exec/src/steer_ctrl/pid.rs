//! # PID controller
//!
//! Unlike a wall-clock controller the caller passes the time step in, so the controller behaves
//! identically in simulation and on the vehicle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{PidParams, SlidingWindow, SteerCtrlError};
use util::maths::clamp_abs;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: Integral,

    /// Absolute limit on the integral value
    integral_limit: Option<f64>,

    reset_on_sign_change: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How the integral of `error * dt` is kept.
#[derive(Debug, Serialize, Clone)]
pub enum Integral {
    /// Sum since the last reset
    Accumulating(f64),

    /// Sum over the most recent updates only
    Windowed(SlidingWindow),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains and an accumulating integral.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            prev_error: None,
            integral: Integral::Accumulating(0.0),
            integral_limit: None,
            reset_on_sign_change: false,
        }
    }

    /// Create a controller from parameters.
    pub fn from_params(params: &PidParams) -> Result<Self, SteerCtrlError> {
        let integral = match params.integral_window_len {
            Some(len) => Integral::Windowed(
                SlidingWindow::new(len).ok_or(SteerCtrlError::ZeroWindowLength)?,
            ),
            None => Integral::Accumulating(0.0),
        };

        Ok(Self {
            integral,
            integral_limit: params.integral_limit.map(f64::abs),
            reset_on_sign_change: params.reset_on_sign_change,
            ..Self::new(params.k_p, params.k_i, params.k_d)
        })
    }

    /// Clear the integral and the previous error.
    pub fn reset(&mut self) {
        self.prev_error = None;
        self.clear_integral();
    }

    /// The current integral value, after the limit has been applied.
    pub fn integral(&self) -> f64 {
        let raw = match &self.integral {
            Integral::Accumulating(sum) => *sum,
            Integral::Windowed(window) => window.sum(),
        };

        match self.integral_limit {
            Some(limit) => clamp_abs(raw, limit),
            None => raw,
        }
    }

    /// Get the value of the controller for the given error.
    ///
    /// Returns `None` without changing any state if `dt_s` is not positive. The derivative term
    /// is zero on the first update after a reset.
    pub fn update(&mut self, error: f64, dt_s: f64) -> Option<f64> {
        if !(dt_s > 0.0) {
            return None;
        }

        if self.reset_on_sign_change && self.prev_error.map_or(false, |e| e * error < 0.0) {
            self.clear_integral();
        }

        match &mut self.integral {
            Integral::Accumulating(sum) => {
                *sum += error * dt_s;
                // Stop wind up beyond the limit
                if let Some(limit) = self.integral_limit {
                    *sum = clamp_abs(*sum, limit);
                }
            }
            Integral::Windowed(window) => window.push(error * dt_s),
        }

        let deriv = match self.prev_error {
            Some(e) => (error - e) / dt_s,
            None => 0.0,
        };

        let integral = self.integral();
        let out = self.k_p * error + self.k_i * integral + self.k_d * deriv;

        trace!(
            "PID: e = {:.3}, i = {:.3}, d = {:.3}, out = {:.3}",
            error,
            integral,
            deriv,
            out
        );

        self.prev_error = Some(error);

        Some(out)
    }

    fn clear_integral(&mut self) {
        match &mut self.integral {
            Integral::Accumulating(sum) => *sum = 0.0,
            Integral::Windowed(window) => window.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proportional_first_update() {
        let mut pid = PidController::new(2.0, 0.0, 5.0);

        // No derivative kick on the first update
        assert_eq!(pid.update(3.0, 0.01), Some(6.0));

        // Derivative from then on
        let out = pid.update(4.0, 0.01).unwrap();
        assert!((out - (8.0 + 5.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_non_positive_dt() {
        let mut pid = PidController::new(1.0, 1.0, 1.0);
        pid.update(1.0, 0.1);
        let integral = pid.integral();

        assert_eq!(pid.update(5.0, 0.0), None);
        assert_eq!(pid.update(5.0, -0.1), None);
        assert_eq!(pid.integral(), integral);

        // Previous error untouched, so the derivative is relative to the first update
        let out = pid.update(1.0, 0.1).unwrap();
        assert!((out - (1.0 + 0.2)).abs() < 1e-9);
    }

    #[test]
    fn test_windowed_integral() {
        let mut pid = PidController::from_params(&PidParams {
            k_i: 1.0,
            integral_window_len: Some(5),
            ..Default::default()
        })
        .unwrap();

        for _ in 0..100 {
            pid.update(2.0, 0.1);
        }

        // Only the last five updates count
        assert!((pid.integral() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_integral_limit() {
        let mut pid = PidController::from_params(&PidParams {
            k_i: 1.0,
            integral_limit: Some(0.5),
            ..Default::default()
        })
        .unwrap();

        for _ in 0..100 {
            pid.update(2.0, 0.1);
        }
        assert_eq!(pid.integral(), 0.5);

        // No wind up, the integral comes off the limit straight away
        pid.update(-1.0, 0.1);
        assert!((pid.integral() - 0.4).abs() < 1e-9);

        let mut pid = PidController::from_params(&PidParams {
            k_i: 1.0,
            integral_window_len: Some(50),
            integral_limit: Some(0.5),
            ..Default::default()
        })
        .unwrap();
        for _ in 0..100 {
            pid.update(-2.0, 0.1);
        }
        assert_eq!(pid.integral(), -0.5);
    }

    #[test]
    fn test_sign_change_reset() {
        let mut pid = PidController::from_params(&PidParams {
            k_i: 1.0,
            integral_window_len: Some(50),
            reset_on_sign_change: true,
            ..Default::default()
        })
        .unwrap();

        for _ in 0..10 {
            pid.update(1.0, 0.1);
        }
        assert!((pid.integral() - 1.0).abs() < 1e-9);

        pid.update(-1.0, 0.1);
        assert!((pid.integral() + 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let mut pid = PidController::new(1.0, 1.0, 1.0);
        pid.update(1.0, 0.1);
        pid.update(2.0, 0.1);
        pid.reset();

        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.update(1.0, 0.1), Some(1.0 + 0.1));
    }

    #[test]
    fn test_zero_window() {
        assert!(matches!(
            PidController::from_params(&PidParams {
                integral_window_len: Some(0),
                ..Default::default()
            }),
            Err(SteerCtrlError::ZeroWindowLength)
        ));
    }
}
