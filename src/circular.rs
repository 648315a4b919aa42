//! Circular statistics over periodic parameters
//!
//! Orientation lives on a circle of period pi, direction on one of period
//! 2*pi. These helpers map arbitrary-period values onto the unit circle,
//! compute there, and map back.

use std::f64::consts::TAU;

/// Shortest distance between `a` and `b` on a circle with the given period.
///
/// The result is in `[0, period / 2]`. Inputs may lie outside `[0, period)`.
///
/// # Example
///
/// ```
/// use sintonia_db::circular::circular_dist;
/// use std::f64::consts::PI;
///
/// // 170 deg and 10 deg are 20 deg apart on the orientation circle
/// let d = circular_dist(170f64.to_radians(), 10f64.to_radians(), PI);
/// assert!((d - 20f64.to_radians()).abs() < 1e-12);
/// ```
#[must_use]
pub fn circular_dist(a: f64, b: f64, period: f64) -> f64 {
    let d = (a - b).rem_euclid(period);
    if d > period / 2.0 {
        period - d
    } else {
        d
    }
}

/// Weighted circular mean and resultant-vector length.
///
/// Angles are expressed on a circle of the given `period`; weights may be
/// any magnitudes (absolute values normalize the resultant). Returns
/// `(mean, resultant_length)` with the mean in `[0, period)` and the length
/// in `[0, 1]`; a length of 1 means all weight sits at one angle, 0 means
/// the weights cancel. Zero total weight yields `(0.0, 0.0)`.
///
/// `angles` and `weights` must have equal length.
#[must_use]
pub fn circular_mean(angles: &[f64], weights: &[f64], period: f64) -> (f64, f64) {
    debug_assert_eq!(angles.len(), weights.len());

    let scale = TAU / period;
    let mut sum_cos = 0.0;
    let mut sum_sin = 0.0;
    let mut total_weight = 0.0;
    for (&angle, &weight) in angles.iter().zip(weights) {
        let theta = angle * scale;
        sum_cos += weight * theta.cos();
        sum_sin += weight * theta.sin();
        total_weight += weight.abs();
    }
    if total_weight == 0.0 {
        return (0.0, 0.0);
    }

    let resultant = (sum_cos * sum_cos + sum_sin * sum_sin).sqrt() / total_weight;
    let mean = sum_sin.atan2(sum_cos).rem_euclid(TAU) / scale;
    (mean, resultant)
}
