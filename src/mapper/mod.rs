//! Weighted codebook mapping.
//!
//! Given a query spectral envelope (LSFs in Hz plus per-coefficient weights),
//! the mapper finds the closest codebook entries on the match side and returns
//! the weighted blend of their output-side envelopes:
//!
//! ```text
//!  query ──► centre-frequency window ──► distances ──► N best ──► weights
//!                                                                   │
//!  output envelope ◄── Σ weight · entry[output_side] ◄──────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use codebook_vc::codebook::Codebook;
//! use codebook_vc::mapper::{CodebookMapper, MapperParams};
//!
//! let codebook = Codebook::load_from(Path::new("neutral_to_angry.wcf")).unwrap();
//! let mapper = CodebookMapper::new(MapperParams::default(), &codebook).unwrap();
//!
//! let query = vec![300.0; codebook.lp_order()];
//! let weights = vec![1.0; codebook.lp_order()];
//! let target = mapper.map(&codebook, &query, &weights).unwrap();
//! ```

pub mod distance;
pub mod params;
pub mod weighting;

pub use distance::{z_normalize, DistanceContext};
pub use params::{
    DistanceMeasure, MapperError, MapperParams, WeightingMethod, MAX_STEEPNESS, MIN_STEEPNESS,
};
pub use weighting::match_weights;

use serde::{Deserialize, Serialize};

use crate::codebook::{Codebook, CodebookSide};

/// Per-coefficient variance floor (Hz²) used by the Mahalanobis distance.
pub const MIN_VARIANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// SubstitutionMode
// ---------------------------------------------------------------------------

/// Which side of the codebook is searched and which side is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionMode {
    pub match_side: CodebookSide,
    pub output_side: CodebookSide,
}

impl Default for SubstitutionMode {
    fn default() -> Self {
        Self {
            match_side: CodebookSide::Source,
            output_side: CodebookSide::Target,
        }
    }
}

impl SubstitutionMode {
    /// Build the mode from the two pipeline switches.
    pub fn from_switches(match_using_target: bool, resynthesize_from_source: bool) -> Self {
        Self {
            match_side: if match_using_target {
                CodebookSide::Target
            } else {
                CodebookSide::Source
            },
            output_side: if resynthesize_from_source {
                CodebookSide::Source
            } else {
                CodebookSide::Target
            },
        }
    }
}

/// One selected entry with its (normalised) distance and blend weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedMatch {
    pub index: usize,
    pub distance: f64,
    pub weight: f64,
}

// ---------------------------------------------------------------------------
// CodebookMapper
// ---------------------------------------------------------------------------

/// Stateless between queries; safe to share across worker threads.
#[derive(Debug, Clone)]
pub struct CodebookMapper {
    params: MapperParams,
    source_variance: Vec<f64>,
    target_variance: Vec<f64>,
}

impl CodebookMapper {
    /// Validate `params` and capture the codebook variances.
    pub fn new(params: MapperParams, codebook: &Codebook) -> Result<Self, MapperError> {
        let params = params.validated()?;
        let mahalanobis = params.distance_measure == DistanceMeasure::Mahalanobis;

        let floored = |side: CodebookSide| -> Vec<f64> {
            codebook
                .stats()
                .variance(side)
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    if v < MIN_VARIANCE {
                        if mahalanobis {
                            log::warn!(
                                "mapper: {side:?} variance of coefficient {i} is {v:e}, using {MIN_VARIANCE:e}"
                            );
                        }
                        MIN_VARIANCE
                    } else {
                        v
                    }
                })
                .collect()
        };

        Ok(Self {
            source_variance: floored(CodebookSide::Source),
            target_variance: floored(CodebookSide::Target),
            params,
        })
    }

    pub fn params(&self) -> &MapperParams {
        &self.params
    }

    /// Map with the default substitution mode (match source, emit target).
    pub fn map(
        &self,
        codebook: &Codebook,
        query: &[f64],
        query_weights: &[f64],
    ) -> Result<Vec<f64>, MapperError> {
        self.map_with(codebook, query, query_weights, SubstitutionMode::default())
    }

    /// Blend the output-side envelopes of the best matches.
    pub fn map_with(
        &self,
        codebook: &Codebook,
        query: &[f64],
        query_weights: &[f64],
        mode: SubstitutionMode,
    ) -> Result<Vec<f64>, MapperError> {
        let matches = self.best_matches(codebook, query, query_weights, mode.match_side)?;

        let mut output = vec![0.0; codebook.lp_order()];
        for m in &matches {
            let envelope = codebook.entries()[m.index].lsfs(mode.output_side);
            for (o, x) in output.iter_mut().zip(envelope) {
                *o += m.weight * x;
            }
        }
        Ok(output)
    }

    /// Selected entries in ascending distance order, with weights summing to 1.
    pub fn best_matches(
        &self,
        codebook: &Codebook,
        query: &[f64],
        query_weights: &[f64],
        match_side: CodebookSide,
    ) -> Result<Vec<WeightedMatch>, MapperError> {
        let order = codebook.lp_order();
        for found in [query.len(), query_weights.len()] {
            if found != order {
                return Err(MapperError::DimensionMismatch {
                    expected: order,
                    found,
                });
            }
        }

        let ctx = DistanceContext {
            measure: self.params.distance_measure,
            alpha: self.params.alpha_for_symmetric,
            variances: match match_side {
                CodebookSide::Source => &self.source_variance,
                CodebookSide::Target => &self.target_variance,
            },
        };
        let distance_to = |index: usize| {
            let entry = &codebook.entries()[index];
            let d = ctx.between(
                query,
                query_weights,
                entry.lsfs(match_side),
                entry.weights(match_side),
            );
            z_normalize(d, self.params.distance_mean, self.params.distance_variance)
        };

        let candidates = self.candidates(codebook, query, match_side);

        let mut scored: Vec<(usize, f64)> = if candidates.is_empty() {
            // Nothing inside the window: fall back to the single nearest entry.
            log::debug!("mapper: no entry inside the frequency window, using global nearest");
            let nearest = (0..codebook.len())
                .map(|i| (i, distance_to(i)))
                .reduce(|best, next| if next.1 < best.1 { next } else { best });
            nearest.into_iter().collect()
        } else {
            candidates.into_iter().map(|i| (i, distance_to(i))).collect()
        };

        // Stable: equal distances keep codebook order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(self.params.num_best_matches.min(scored.len()));

        let distances: Vec<f64> = scored.iter().map(|&(_, d)| d).collect();
        let weights = match_weights(
            &distances,
            self.params.weighting_method,
            self.params.weighting_steepness,
        );

        Ok(scored
            .into_iter()
            .zip(weights)
            .map(|((index, distance), weight)| WeightedMatch {
                index,
                distance,
                weight,
            })
            .collect())
    }

    fn candidates(&self, codebook: &Codebook, query: &[f64], side: CodebookSide) -> Vec<usize> {
        let all = || (0..codebook.len()).collect();
        if !self.params.restricts_frequency() {
            return all();
        }
        let Some(query_centre) = centre_frequency(query) else {
            return all();
        };

        codebook
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                centre_frequency(e.lsfs(side))
                    .is_some_and(|c| (c - query_centre).abs() <= self.params.freq_range)
            })
            .map(|(i, _)| i)
            .collect()
    }
}

/// Midpoint of the closest adjacent pair of coefficients (the sharpest
/// formant).  A single coefficient is its own centre; an empty envelope has
/// none.
pub fn centre_frequency(lsfs: &[f64]) -> Option<f64> {
    match lsfs {
        [] => None,
        [only] => Some(*only),
        _ => lsfs
            .windows(2)
            .min_by(|a, b| (a[1] - a[0]).total_cmp(&(b[1] - b[0])))
            .map(|w| 0.5 * (w[0] + w[1])),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
