//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value symmetrically into `[-limit, limit]`.
///
/// A negative limit is treated as its absolute value.
pub fn clamp_abs<T>(value: T, limit: T) -> T
where
    T: Float,
{
    let limit = limit.abs();
    value.max(-limit).min(limit)
}

/// Get the signed angular distance in degrees from `a` to `b`.
///
/// This function returns the shortest signed rotation taking `a` onto `b`,
/// accounting for wrapping, in the range `[-180, 180)`. Positive values are
/// counter-clockwise.
pub fn get_ang_dist_deg<T>(a: T, b: T) -> T
where
    T: Float,
{
    wrap_deg_180(b - a)
}

/// Wrap an angle in degrees into the range `[-180, 180)`.
pub fn wrap_deg_180<T>(value: T) -> T
where
    T: Float,
{
    let half_turn = T::from(180.0).unwrap_or_else(T::zero);
    let turn = half_turn + half_turn;

    rem_euclid(value + half_turn, turn) - half_turn
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_ang_dist_deg() {
        assert_eq!(get_ang_dist_deg(10f64, 20f64), 10f64);
        assert_eq!(get_ang_dist_deg(20f64, 10f64), -10f64);
        assert_eq!(get_ang_dist_deg(0f64, 360f64), 0f64);
        assert_eq!(get_ang_dist_deg(170f64, -170f64), 20f64);
        assert_eq!(get_ang_dist_deg(-170f64, 170f64), -20f64);
    }

    #[test]
    fn test_wrap_deg_180() {
        assert_eq!(wrap_deg_180(190f64), -170f64);
        assert_eq!(wrap_deg_180(-190f64), 170f64);
        assert_eq!(wrap_deg_180(45f64), 45f64);
        assert_eq!(wrap_deg_180(720f64), 0f64);
    }

    #[test]
    fn test_clamp_abs() {
        assert_eq!(clamp_abs(50f64, 45f64), 45f64);
        assert_eq!(clamp_abs(-50f64, 45f64), -45f64);
        assert_eq!(clamp_abs(10f64, -45f64), 10f64);
    }
}
