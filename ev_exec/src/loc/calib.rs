//! Gyro drift calibration

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;

use super::LocError;
use crate::vehicle::Vehicle;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Measure the gyro drift rate while the vehicle is stationary.
///
/// The gyro is sampled every `period_s` for `duration_s`, and the drift rate is the mean of the
/// per-sample angle rates. The call blocks for the whole duration, the vehicle must not move.
///
/// `progress` is called with the completed fraction (0 to 1) after each sample and once more with
/// 1.0 at the end.
///
/// Units: seconds in, degrees/second out (in the gyro's own sign convention)
pub fn calibrate_drift<V: Vehicle>(
    vehicle: &mut V,
    duration_s: f64,
    period_s: f64,
    mut progress: Option<&mut dyn FnMut(f64)>,
) -> Result<f64, LocError> {
    if !(duration_s > 0.0) || !(period_s > 0.0) {
        return Err(LocError::InvalidCalibTiming(duration_s, period_s));
    }

    info!(
        "Starting gyro calibration for {:.1} s. Do not move the vehicle.",
        duration_s
    );

    let start_s = vehicle.time_s();
    let mut last_s = start_s;
    let mut last_angle = vehicle
        .read_sens()
        .map_err(LocError::CalibSensorError)?
        .gyro_deg;

    let mut drift_sum = 0.0;
    let mut samples = 0usize;

    while vehicle.time_s() - start_s < duration_s {
        vehicle.wait(period_s);

        let now_s = vehicle.time_s();
        let angle = vehicle
            .read_sens()
            .map_err(LocError::CalibSensorError)?
            .gyro_deg;

        let dt = now_s - last_s;
        if dt > 0.0 {
            drift_sum += (angle - last_angle) / dt;
            samples += 1;
        }
        last_s = now_s;
        last_angle = angle;

        if let Some(cb) = progress.as_deref_mut() {
            cb(((now_s - start_s) / duration_s).min(1.0));
        }
    }

    let drift_rate_dps = drift_sum / samples.max(1) as f64;

    if let Some(cb) = progress {
        cb(1.0);
    }

    info!(
        "Gyro calibration complete; drift = {:.4} deg/s over {} samples",
        drift_rate_dps, samples
    );

    Ok(drift_rate_dps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim_client::{SimParams, SimVehicle};

    fn sim(drift_dps: f64) -> SimVehicle {
        SimVehicle::new(
            util::params::from_str(include_str!("../../../params/vehicle.toml")).unwrap(),
            SimParams {
                gyro_drift_dps: drift_dps,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_measures_drift() {
        let mut vehicle = sim(0.25);
        let mut fractions = vec![];
        let mut cb = |f: f64| fractions.push(f);

        let drift = calibrate_drift(&mut vehicle, 5.0, 0.02, Some(&mut cb)).unwrap();

        assert!((drift - 0.25).abs() < 1e-6);
        assert!((vehicle.time_s() - 5.0).abs() < 0.021);
        assert_eq!(fractions.last().copied(), Some(1.0));
        assert!(fractions.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_invalid_timing() {
        let mut vehicle = sim(0.0);
        assert!(matches!(
            calibrate_drift(&mut vehicle, 0.0, 0.02, None),
            Err(LocError::InvalidCalibTiming(..))
        ));
        assert!(matches!(
            calibrate_drift(&mut vehicle, 5.0, -1.0, None),
            Err(LocError::InvalidCalibTiming(..))
        ));
    }
}
