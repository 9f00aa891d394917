//! # Path
//!
//! This module defines the reference paths the vehicle follows. Paths are expressed in the run
//! frame (origin at the start line, +X towards the target, +Y to the left) and are immutable once
//! built.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use nalgebra::Vector2;
use serde::Serialize;
use std::f64::consts::PI;

// Internal
use super::Params;
use crate::loc::Pose;
use comms_if::tc::run::{RunConfig, RunMode};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A straight line from the origin to the target along the X axis.
#[derive(Debug, Clone, Serialize)]
pub struct StraightPath {
    target_mm: f64,
}

/// The bonus lane change.
///
/// The first half is a cosine shaped lane change from the centreline out to the sagitta, peaking
/// at the midpoint with zero slope. The second half is a circular arc tangent to the first at the
/// midpoint which brings the vehicle back to the centreline at the target.
#[derive(Debug, Clone, Serialize)]
pub struct BonusPath {
    target_mm: f64,

    /// X position of the peak, half the target distance
    mid_x_mm: f64,

    /// Lateral offset of the peak
    sagitta_mm: f64,

    /// Radius of the return arc
    radius_mm: f64,

    /// Centre of the return arc
    centre_mm: Vector2<f64>,

    length_mm: f64,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// The reference path for a run.
#[derive(Debug, Clone, Serialize)]
pub enum Path {
    Straight(StraightPath),
    Bonus(BonusPath),
}

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Target distance must be positive, got {0} mm")]
    InvalidTarget(f64),

    #[error(
        "Bonus gap leaves no room to pass the inner can: lateral offset of the inner can centre \
        is {sagitta_mm:.1} mm, it must be positive. Reduce the bonus gap."
    )]
    InvalidBonusGeometry { sagitta_mm: f64 },

    #[error("At least one integration step is required to compute the path length")]
    NoIntegrationSteps,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Path {
    /// Build the path for the given run.
    ///
    /// The distance correction is added to the requested target distance first.
    pub fn new(run_config: &RunConfig, params: &Params) -> Result<Self, PathError> {
        let target_mm = (run_config.target_distance_m + params.distance_correction_m) * 1000.0;

        let path = match run_config.mode {
            RunMode::Straight => Path::Straight(StraightPath::new(target_mm)?),
            RunMode::Bonus => {
                let can_radius_m = params.can_diameter_m / 2.0;

                // Centre of the outer can, then step inwards across the gap and a full can to the
                // centre of the inner can
                let outer_centre_m = params.outer_can_inside_edge_m + can_radius_m;
                let inner_centre_m =
                    outer_centre_m - (run_config.bonus_gap_m + params.can_diameter_m);

                Path::Bonus(BonusPath::new(
                    target_mm,
                    inner_centre_m * 1000.0,
                    params.path_integration_steps,
                )?)
            }
        };

        info!(
            "Built {} path, target {:.0} mm, length {:.1} mm",
            run_config.mode,
            path.target_mm(),
            path.total_length_mm()
        );

        Ok(path)
    }

    /// The distance along the ground from the start to the target.
    ///
    /// Units: millimeters
    pub fn total_length_mm(&self) -> f64 {
        match self {
            Path::Straight(p) => p.target_mm,
            Path::Bonus(p) => p.length_mm,
        }
    }

    /// X coordinate of the target point.
    ///
    /// Units: millimeters
    pub fn target_mm(&self) -> f64 {
        match self {
            Path::Straight(p) => p.target_mm,
            Path::Bonus(p) => p.target_mm,
        }
    }

    /// Lateral position of the path at the given X.
    pub fn y_at(&self, x_mm: f64) -> f64 {
        match self {
            Path::Straight(_) => 0.0,
            Path::Bonus(p) => p.y_at(x_mm),
        }
    }

    /// Slope (dy/dx) of the path at the given X, zero outside the path.
    pub fn slope_at(&self, x_mm: f64) -> f64 {
        match self {
            Path::Straight(_) => 0.0,
            Path::Bonus(p) => p.slope_at(x_mm),
        }
    }

    /// Signed curvature of the path at the given X, positive turning left.
    ///
    /// X before the start is treated as the start, X beyond the target gives zero.
    ///
    /// Units: 1/millimeters
    pub fn curvature(&self, x_mm: f64) -> f64 {
        match self {
            Path::Straight(_) => 0.0,
            Path::Bonus(p) => p.curvature(x_mm),
        }
    }

    /// The pure pursuit point, the path evaluated one lookahead distance ahead of the vehicle's X
    /// position and clamped to the target.
    pub fn lookahead_point(&self, pose: &Pose, lookahead_mm: f64) -> Vector2<f64> {
        let x_mm = (pose.x_mm() + lookahead_mm).min(self.target_mm());
        Vector2::new(x_mm, self.y_at(x_mm))
    }

    /// The final point of the path.
    pub fn end_point(&self) -> Vector2<f64> {
        Vector2::new(self.target_mm(), 0.0)
    }
}

impl StraightPath {
    pub fn new(target_mm: f64) -> Result<Self, PathError> {
        if !(target_mm > 0.0) {
            return Err(PathError::InvalidTarget(target_mm));
        }
        Ok(Self { target_mm })
    }
}

impl BonusPath {
    /// Build a lane change to `target_mm` peaking at `sagitta_mm` from the centreline.
    ///
    /// `integration_steps` sets the number of uniform samples used to measure the length of the
    /// cosine segment.
    pub fn new(target_mm: f64, sagitta_mm: f64, integration_steps: usize) -> Result<Self, PathError> {
        if !(target_mm > 0.0) {
            return Err(PathError::InvalidTarget(target_mm));
        }
        if !(sagitta_mm > 0.0) {
            return Err(PathError::InvalidBonusGeometry { sagitta_mm });
        }
        if integration_steps == 0 {
            return Err(PathError::NoIntegrationSteps);
        }

        let mid_x_mm = target_mm / 2.0;
        let dx_mm = target_mm - mid_x_mm;

        // Circle through (mid, S) with a horizontal tangent there, which also passes through
        // (target, 0)
        let radius_mm = (dx_mm.powi(2) + sagitta_mm.powi(2)) / (2.0 * sagitta_mm);
        let centre_mm = Vector2::new(mid_x_mm, sagitta_mm - radius_mm);

        let mut path = Self {
            target_mm,
            mid_x_mm,
            sagitta_mm,
            radius_mm,
            centre_mm,
            length_mm: 0.0,
        };
        path.length_mm = path.length_with_steps(integration_steps);

        debug!(
            "Bonus path: sagitta {:.1} mm, arc radius {:.1} mm, length {:.1} mm",
            sagitta_mm, radius_mm, path.length_mm
        );

        Ok(path)
    }

    /// Path length using `steps` uniform samples over the cosine segment. The arc length is exact.
    pub fn length_with_steps(&self, steps: usize) -> f64 {
        let steps = steps.max(1);
        let step_mm = self.mid_x_mm / steps as f64;

        let mut cosine_mm = 0.0;
        let mut prev = Vector2::new(0.0, self.y_at(0.0));
        for i in 1..=steps {
            let x_mm = i as f64 * step_mm;
            let point = Vector2::new(x_mm, self.y_at(x_mm));
            cosine_mm += (point - prev).norm();
            prev = point;
        }

        let dx_mm = self.target_mm - self.mid_x_mm;
        let arc_mm = self.radius_mm * (dx_mm / self.radius_mm).min(1.0).asin();

        cosine_mm + arc_mm
    }

    pub fn sagitta_mm(&self) -> f64 {
        self.sagitta_mm
    }

    pub fn radius_mm(&self) -> f64 {
        self.radius_mm
    }

    pub fn mid_x_mm(&self) -> f64 {
        self.mid_x_mm
    }

    pub fn y_at(&self, x_mm: f64) -> f64 {
        let x_mm = x_mm.max(0.0).min(self.target_mm);

        if x_mm <= self.mid_x_mm {
            self.sagitta_mm / 2.0 * (1.0 - (PI * x_mm / self.mid_x_mm).cos())
        } else {
            let rad = self.radius_mm.powi(2) - (x_mm - self.centre_mm[0]).powi(2);
            if rad < 0.0 {
                0.0
            } else {
                self.centre_mm[1] + rad.sqrt()
            }
        }
    }

    pub fn slope_at(&self, x_mm: f64) -> f64 {
        if x_mm < 0.0 || x_mm > self.target_mm {
            return 0.0;
        }

        if x_mm <= self.mid_x_mm {
            let k = PI / self.mid_x_mm;
            self.sagitta_mm / 2.0 * k * (k * x_mm).sin()
        } else {
            let dx = x_mm - self.centre_mm[0];
            let rad = self.radius_mm.powi(2) - dx.powi(2);
            if rad <= 0.0 {
                0.0
            } else {
                -dx / rad.sqrt()
            }
        }
    }

    pub fn curvature(&self, x_mm: f64) -> f64 {
        if x_mm > self.target_mm {
            return 0.0;
        }
        let x_mm = x_mm.max(0.0);

        if x_mm <= self.mid_x_mm {
            let k = PI / self.mid_x_mm;
            let dy = self.slope_at(x_mm);
            let ddy = self.sagitta_mm / 2.0 * k * k * (k * x_mm).cos();
            ddy / (1.0 + dy * dy).powf(1.5)
        } else {
            -1.0 / self.radius_mm
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Params {
        util::params::from_str(include_str!("../../../params/traj_ctrl.toml")).unwrap()
    }

    fn bonus_config(gap_m: f64) -> RunConfig {
        RunConfig {
            mode: RunMode::Bonus,
            target_distance_m: 8.0,
            target_time_s: 12.0,
            bonus_gap_m: gap_m,
        }
    }

    fn pose_at(x_mm: f64, y_mm: f64) -> Pose {
        Pose {
            position_mm: Vector2::new(x_mm, y_mm),
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_bonus_gap() {
        let mut params = params();
        params.outer_can_inside_edge_m = 1.0;
        params.can_diameter_m = 0.075;

        match Path::new(&bonus_config(1.0), &params) {
            Err(PathError::InvalidBonusGeometry { sagitta_mm }) => {
                assert!((sagitta_mm + 37.5).abs() < 1e-9);
                let msg = format!("{}", PathError::InvalidBonusGeometry { sagitta_mm });
                assert!(msg.contains("gap"));
            }
            other => panic!("Expected invalid geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_bonus_geometry() {
        let params = params();
        let path = match Path::new(&bonus_config(0.5), &params).unwrap() {
            Path::Bonus(p) => p,
            p => panic!("Expected bonus path, got {:?}", p),
        };

        // Inner can centre: 1.0 + 0.0375 - (0.5 + 0.075)
        assert!((path.sagitta_mm() - 462.5).abs() < 1e-9);
        assert!((path.target_mm - 8200.0).abs() < 1e-9);

        // Starts and ends on the centreline, peaks at the midpoint
        assert!(path.y_at(0.0).abs() < 1e-9);
        assert!(path.y_at(8200.0).abs() < 1e-6);
        assert!((path.y_at(path.mid_x_mm()) - 462.5).abs() < 1e-9);
        assert!(path.y_at(9000.0).abs() < 1e-6);
    }

    #[test]
    fn test_length_convergence() {
        let path = BonusPath::new(8200.0, 462.5, 50).unwrap();
        let coarse = path.length_with_steps(50);
        let fine = path.length_with_steps(500);

        assert!(((fine - coarse) / fine).abs() < 1e-3);
        assert!(fine > 8200.0);
        assert!((path.length_with_steps(50) - Path::Bonus(path.clone()).total_length_mm()).abs() < 1e-9);
    }

    #[test]
    fn test_continuity_at_mid() {
        let path = BonusPath::new(8200.0, 462.5, 50).unwrap();
        let mid = path.mid_x_mm();
        let eps = 1e-6;

        // Tangent direction continuous
        let before = path.slope_at(mid - eps).atan();
        let after = path.slope_at(mid + eps).atan();
        assert!((before - after).abs() < 1e-6);

        // Both sides curve the same way (right, back towards the centreline)
        let k_before = path.curvature(mid - eps);
        let k_after = path.curvature(mid + eps);
        assert!(k_before < 0.0 && k_after < 0.0);

        // Position continuous
        assert!((path.y_at(mid - eps) - path.y_at(mid + eps)).abs() < 1e-3);
    }

    #[test]
    fn test_slope_matches_curve() {
        let params = params();
        let path = Path::new(&bonus_config(0.5), &params).unwrap();
        let eps = 1e-3;

        for x in [500.0, 2000.0, 4000.0, 5000.0, 7000.0, 8000.0].iter() {
            let numeric = (path.y_at(x + eps) - path.y_at(x - eps)) / (2.0 * eps);
            assert!((path.slope_at(*x) - numeric).abs() < 1e-6, "x = {}", x);
        }

        // Flat outside the path
        assert_eq!(path.slope_at(-10.0), 0.0);
        assert_eq!(path.slope_at(9000.0), 0.0);
    }

    #[test]
    fn test_curvature_bounds() {
        let path = BonusPath::new(8200.0, 462.5, 50).unwrap();

        assert_eq!(path.curvature(-100.0), path.curvature(0.0));
        assert!(path.curvature(0.0) > 0.0);
        assert_eq!(path.curvature(8200.1), 0.0);
        assert!((path.curvature(6000.0) + 1.0 / path.radius_mm()).abs() < 1e-15);
    }

    #[test]
    fn test_lookahead_on_curve() {
        let params = params();
        let path = Path::new(&bonus_config(0.5), &params).unwrap();

        for x in [0.0, 1000.0, 3800.0, 4100.0, 6000.0, 7950.0, 8500.0].iter() {
            let p = path.lookahead_point(&pose_at(*x, 100.0), params.lookahead_mm);
            assert!((p[0] - (x + params.lookahead_mm).min(8200.0)).abs() < 1e-9);
            assert!((p[1] - path.y_at(p[0])).abs() < 1e-9);
        }

        // Clamped to the end point
        let end = path.lookahead_point(&pose_at(8100.0, 0.0), params.lookahead_mm);
        assert!((end - path.end_point()).norm() < 1e-6);
    }

    #[test]
    fn test_straight_path() {
        let params = params();
        let path = Path::new(
            &RunConfig {
                mode: RunMode::Straight,
                target_distance_m: 7.0,
                target_time_s: 10.0,
                bonus_gap_m: 0.0,
            },
            &params,
        )
        .unwrap();

        assert!((path.total_length_mm() - 7200.0).abs() < 1e-9);
        assert_eq!(path.curvature(3000.0), 0.0);

        let p = path.lookahead_point(&pose_at(1000.0, -50.0), 300.0);
        assert!((p - Vector2::new(1300.0, 0.0)).norm() < 1e-9);

        let p = path.lookahead_point(&pose_at(7100.0, 0.0), 300.0);
        assert!((p - path.end_point()).norm() < 1e-9);
    }
}
