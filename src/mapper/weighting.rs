//! Turning match distances into interpolation weights.

use super::params::WeightingMethod;

/// Weights for the selected matches, in the same order as `distances`.
///
/// Distances are rescaled to `[0, 1]` over the selection (all zero when they
/// are equal), mapped through the half-window and renormalised so the result
/// sums to 1.  The closest match always gets the largest weight.
///
/// ```
/// use codebook_vc::mapper::{match_weights, WeightingMethod};
///
/// let w = match_weights(&[1.0, 3.0], WeightingMethod::TriangleHalfWindow, 1.0);
/// assert_eq!(w, vec![1.0, 0.0]);
/// ```
pub fn match_weights(distances: &[f64], method: WeightingMethod, steepness: f64) -> Vec<f64> {
    if distances.is_empty() {
        return Vec::new();
    }

    let min = distances.iter().copied().fold(f64::INFINITY, f64::min);
    let max = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    let raw: Vec<f64> = distances
        .iter()
        .map(|&d| {
            let nd = if range > 0.0 && range.is_finite() {
                (d - min) / range
            } else {
                0.0
            };
            match method {
                WeightingMethod::ExponentialHalfWindow => (-steepness * nd).exp(),
                WeightingMethod::TriangleHalfWindow => 1.0 - nd,
            }
        })
        .collect();

    // The closest match has nd = 0 and raw weight 1, so the sum is ≥ 1.
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(w: &[f64]) -> f64 {
        w.iter().sum()
    }

    #[test]
    fn single_match_gets_full_weight() {
        for method in [
            WeightingMethod::ExponentialHalfWindow,
            WeightingMethod::TriangleHalfWindow,
        ] {
            assert_eq!(match_weights(&[12.5], method, 3.0), vec![1.0]);
        }
    }

    #[test]
    fn equal_distances_share_equally() {
        let w = match_weights(&[4.0, 4.0, 4.0, 4.0], WeightingMethod::ExponentialHalfWindow, 7.0);
        for x in &w {
            assert!((x - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn exponential_weights_decrease_and_sum_to_one() {
        let w = match_weights(&[1.0, 2.0, 5.0], WeightingMethod::ExponentialHalfWindow, 2.0);
        assert!((sum(&w) - 1.0).abs() < 1e-12);
        assert!(w[0] > w[1] && w[1] > w[2]);

        let expected_ratio = (-2.0f64).exp();
        assert!((w[2] / w[0] - expected_ratio).abs() < 1e-12);
    }

    #[test]
    fn zero_steepness_is_uniform() {
        let w = match_weights(&[1.0, 9.0], WeightingMethod::ExponentialHalfWindow, 0.0);
        assert!((w[0] - 0.5).abs() < 1e-12 && (w[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn triangle_ignores_steepness() {
        let a = match_weights(&[0.0, 1.0, 2.0], WeightingMethod::TriangleHalfWindow, 0.0);
        let b = match_weights(&[0.0, 1.0, 2.0], WeightingMethod::TriangleHalfWindow, 10.0);
        assert_eq!(a, b);
        assert!((a[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((a[1] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(a[2], 0.0);
    }

    #[test]
    fn negative_distances_after_normalisation_still_work() {
        let w = match_weights(&[-3.0, -1.0], WeightingMethod::ExponentialHalfWindow, 1.0);
        assert!((sum(&w) - 1.0).abs() < 1e-12);
        assert!(w[0] > w[1]);
    }
}
