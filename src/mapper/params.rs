//! Mapper configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lower bound of [`MapperParams::weighting_steepness`].
pub const MIN_STEEPNESS: f64 = 0.0;
/// Upper bound of [`MapperParams::weighting_steepness`].
pub const MAX_STEEPNESS: f64 = 10.0;

// ---------------------------------------------------------------------------
// MapperError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapperError {
    #[error("Invalid mapper parameters: {0}")]
    InvalidParams(String),

    #[error("Query has {found} coefficients, codebook expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How a query is compared with a codebook envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMeasure {
    Euclidean,
    Mahalanobis,
    AbsoluteValue,
    InverseHarmonic,
    #[default]
    InverseHarmonicSymmetric,
}

/// How distances of the selected matches become interpolation weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeightingMethod {
    #[default]
    ExponentialHalfWindow,
    TriangleHalfWindow,
}

// ---------------------------------------------------------------------------
// MapperParams
// ---------------------------------------------------------------------------

/// Settings for [`CodebookMapper`](super::CodebookMapper).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperParams {
    /// Number of best matches blended into the output (≥ 1).
    pub num_best_matches: usize,
    /// Steepness of the exponential weighting window.
    pub weighting_steepness: f64,
    /// Half-width in Hz of the centre-frequency window candidates must fall
    /// into.  Zero or negative disables the restriction.
    pub freq_range: f64,
    pub distance_measure: DistanceMeasure,
    pub weighting_method: WeightingMethod,
    /// Share of the query weights in the symmetric inverse-harmonic distance.
    pub alpha_for_symmetric: f64,
    /// Z-normalisation mean subtracted from every distance.
    pub distance_mean: f64,
    /// Z-normalisation variance; distances are divided by its square root.
    pub distance_variance: f64,
}

impl Default for MapperParams {
    fn default() -> Self {
        Self {
            num_best_matches: 3,
            weighting_steepness: 1.0,
            freq_range: 5_000.0,
            distance_measure: DistanceMeasure::default(),
            weighting_method: WeightingMethod::default(),
            alpha_for_symmetric: 0.5,
            distance_mean: 0.0,
            distance_variance: 1.0,
        }
    }
}

impl MapperParams {
    /// Check the parameters and return a copy with the steepness clamped to
    /// `[MIN_STEEPNESS, MAX_STEEPNESS]`.
    ///
    /// ```
    /// use codebook_vc::mapper::{MapperParams, MAX_STEEPNESS};
    ///
    /// let params = MapperParams { weighting_steepness: 50.0, ..MapperParams::default() };
    /// assert_eq!(params.validated().unwrap().weighting_steepness, MAX_STEEPNESS);
    ///
    /// let params = MapperParams { num_best_matches: 0, ..MapperParams::default() };
    /// assert!(params.validated().is_err());
    /// ```
    pub fn validated(&self) -> Result<Self, MapperError> {
        let invalid = |msg: String| Err(MapperError::InvalidParams(msg));

        if self.num_best_matches == 0 {
            return invalid("num_best_matches must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.alpha_for_symmetric) {
            return invalid(format!(
                "alpha_for_symmetric {} outside [0, 1]",
                self.alpha_for_symmetric
            ));
        }
        if !self.distance_mean.is_finite() {
            return invalid("distance_mean must be finite".into());
        }
        if !(self.distance_variance.is_finite() && self.distance_variance > 0.0) {
            return invalid(format!(
                "distance_variance {} must be finite and positive",
                self.distance_variance
            ));
        }
        if !self.weighting_steepness.is_finite() {
            return invalid("weighting_steepness must be finite".into());
        }

        let steepness = self.weighting_steepness.clamp(MIN_STEEPNESS, MAX_STEEPNESS);
        if steepness != self.weighting_steepness {
            log::warn!(
                "mapper: weighting steepness {} clamped to {steepness}",
                self.weighting_steepness
            );
        }

        Ok(Self {
            weighting_steepness: steepness,
            ..self.clone()
        })
    }

    /// `true` when candidates are restricted to a centre-frequency window.
    pub fn restricts_frequency(&self) -> bool {
        self.freq_range.is_finite() && self.freq_range > 0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
