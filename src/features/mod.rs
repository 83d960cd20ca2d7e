//! Acoustic feature extraction.
//!
//! This module provides:
//! * [`Preprocessor`] / [`FeatureExtractor`]: the collaborator traits the
//!   batch transformer runs once over the whole input set.
//! * [`NoopPreprocessor`]: leaves the input files untouched.
//! * [`AutocorrelationPitchExtractor`]: writes a `.ptc` pitch track next to
//!   every input waveform that lacks one (or every one, when reanalysis is
//!   forced).
//! * [`lpc`]: predictor analysis, LPC↔LSF conversion and the filters the
//!   renderer uses for spectral substitution.
//! * [`PitchTrack`]: the pitch-track file format.

pub mod lpc;
pub mod pitch;

use thiserror::Error;

use crate::adaptation::AdaptationSet;
use crate::audio::{read_wav, AudioError};

pub use pitch::{estimate_pitch, PitchSearch, PitchTrack};

// ---------------------------------------------------------------------------
// FeatureError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("Invalid pitch track: {0}")]
    InvalidPitchTrack(String),

    #[error("LSF conversion failed: {0}")]
    Lsf(String),
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Frame settings shared by analysis and the codebook it must agree with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisRequest {
    pub window_size_secs: f64,
    pub skip_size_secs: f64,
    /// Re-run analysis even when a feature file already exists.
    pub forced: bool,
}

/// Counts reported by a [`FeatureExtractor`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub analysed: usize,
    pub reused: usize,
    pub failed: usize,
}

/// Prepares input audio before analysis (level normalisation, trimming …).
pub trait Preprocessor: Send + Sync {
    fn run(&self, set: &AdaptationSet) -> Result<(), FeatureError>;
}

/// Produces the per-item feature files the resynthesis engine reads.
///
/// Implementations must not abort on a single bad item: they log it, count it
/// in [`ExtractionSummary::failed`] and move on, so the conversion of that item
/// fails later on its own.
pub trait FeatureExtractor: Send + Sync {
    fn run(
        &self,
        set: &AdaptationSet,
        request: &AnalysisRequest,
    ) -> Result<ExtractionSummary, FeatureError>;
}

// ---------------------------------------------------------------------------
// Built-in implementations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPreprocessor;

impl Preprocessor for NoopPreprocessor {
    fn run(&self, _set: &AdaptationSet) -> Result<(), FeatureError> {
        Ok(())
    }
}

/// Writes pitch tracks with [`estimate_pitch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AutocorrelationPitchExtractor {
    pub search: PitchSearch,
}

impl AutocorrelationPitchExtractor {
    pub fn new(search: PitchSearch) -> Self {
        Self { search }
    }
}

impl FeatureExtractor for AutocorrelationPitchExtractor {
    fn run(
        &self,
        set: &AdaptationSet,
        request: &AnalysisRequest,
    ) -> Result<ExtractionSummary, FeatureError> {
        let mut summary = ExtractionSummary::default();

        for item in set.iter() {
            if item.pitch_file.exists() && !request.forced {
                summary.reused += 1;
                continue;
            }

            let result = read_wav(&item.audio_file).map_err(FeatureError::from).and_then(|audio| {
                estimate_pitch(
                    &audio,
                    request.window_size_secs,
                    request.skip_size_secs,
                    &self.search,
                )
                .save_to(&item.pitch_file)
            });

            match result {
                Ok(()) => {
                    log::debug!("features: wrote {}", item.pitch_file.display());
                    summary.analysed += 1;
                }
                Err(e) => {
                    log::warn!(
                        "features: pitch analysis failed for {}: {e}",
                        item.audio_file.display()
                    );
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
