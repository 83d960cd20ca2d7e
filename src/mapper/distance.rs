//! Distance measures between a query envelope and a codebook envelope.

use super::params::DistanceMeasure;

/// Everything a distance needs beyond the two vectors.
#[derive(Debug, Clone, Copy)]
pub struct DistanceContext<'a> {
    pub measure: DistanceMeasure,
    pub alpha: f64,
    /// Per-coefficient variances of the match side (Mahalanobis only).
    pub variances: &'a [f64],
}

impl DistanceContext<'_> {
    /// Distance between query `q` (weights `qw`) and candidate `c` (weights
    /// `cw`).  All slices have the same length.
    pub fn between(&self, q: &[f64], qw: &[f64], c: &[f64], cw: &[f64]) -> f64 {
        let diffs = q.iter().zip(c).map(|(a, b)| a - b);

        match self.measure {
            DistanceMeasure::Euclidean => diffs.map(|d| d * d).sum(),
            DistanceMeasure::AbsoluteValue => diffs.map(f64::abs).sum(),
            DistanceMeasure::Mahalanobis => diffs
                .zip(self.variances)
                .map(|(d, v)| d * d / v)
                .sum(),
            DistanceMeasure::InverseHarmonic => diffs.zip(cw).map(|(d, w)| w * d * d).sum(),
            DistanceMeasure::InverseHarmonicSymmetric => diffs
                .zip(qw.iter().zip(cw))
                .map(|(d, (wq, wc))| (self.alpha * wq + (1.0 - self.alpha) * wc) * d * d)
                .sum(),
        }
    }
}

/// `(d − mean) / sqrt(variance)`; the defaults `0` / `1` leave `d` unchanged.
pub fn z_normalize(d: f64, mean: f64, variance: f64) -> f64 {
    (d - mean) / variance.sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
