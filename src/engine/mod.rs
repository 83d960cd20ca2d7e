//! Resynthesis engine.
//!
//! # Overview
//!
//! [`Resynthesizer`] is the interface the pass controller drives.  It is
//! object-safe and `Send + Sync` so one engine can be held behind an
//! `Arc<dyn Resynthesizer>` and called from every worker.
//!
//! [`OverlapAddRenderer`] is the built-in implementation: frame-wise LPC
//! analysis, codebook substitution of the spectral envelope, excitation
//! pitch scaling and overlap-add.
//!
//! [`MockResynthesizer`] (available under `#[cfg(test)]`) records every
//! request and copies the input to the output, which is enough to unit-test
//! the pipeline without rendering audio.

pub mod ola;

use std::path::Path;

use thiserror::Error;

use crate::audio::AudioError;
use crate::codebook::Codebook;
use crate::features::FeatureError;
use crate::mapper::{CodebookMapper, MapperError, SubstitutionMode};
use crate::prosody::{ProsodyParams, ScaleFactors};

pub use ola::{OverlapAddRenderer, DEFAULT_MIN_LSF_GAP_HZ};

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Mapper(#[from] MapperError),

    /// A pitch transformation was requested but the codebook carries no
    /// speaker pitch statistics.
    #[error("Codebook has no pitch statistics")]
    MissingPitchStatistics,

    /// The request combines settings the engine cannot honour.
    #[error("Unsupported request: {0}")]
    Unsupported(String),
}

// ---------------------------------------------------------------------------
// ResynthesisRequest
// ---------------------------------------------------------------------------

/// Everything one engine invocation needs.
#[derive(Debug, Clone, Copy)]
pub struct ResynthesisRequest<'a> {
    pub input: &'a Path,
    /// Pitch track of `input`; only read when a pitch transformation is set.
    pub pitch_file: &'a Path,
    pub output: &'a Path,
    pub vocal_tract_transformation: bool,
    pub fixed_rate: bool,
    pub resynthesize_from_source_codebook: bool,
    pub match_using_target_codebook: bool,
    pub prosody: &'a ProsodyParams,
    /// `None` disables spectral substitution (prosody-only pass).
    pub mapper: Option<&'a CodebookMapper>,
    pub codebook: &'a Codebook,
    pub display_progress: bool,
}

impl ResynthesisRequest<'_> {
    pub fn scales(&self) -> &ScaleFactors {
        &self.prosody.scales
    }

    pub fn substitution_mode(&self) -> SubstitutionMode {
        SubstitutionMode::from_switches(
            self.match_using_target_codebook,
            self.resynthesize_from_source_codebook,
        )
    }

    /// `true` when frames must go through the codebook mapper.
    pub fn substitutes_envelope(&self) -> bool {
        self.vocal_tract_transformation && self.mapper.is_some()
    }
}

// ---------------------------------------------------------------------------
// Resynthesizer trait
// ---------------------------------------------------------------------------

/// Renders `request.input` into `request.output`.
///
/// Implementations must be `Send + Sync`; the batch transformer shares one
/// engine across all workers.
pub trait Resynthesizer: Send + Sync {
    fn render(&self, request: &ResynthesisRequest<'_>) -> Result<(), EngineError>;
}

// Compile-time assertion: Box<dyn Resynthesizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Resynthesizer>) {}
};

// ---------------------------------------------------------------------------
// MockResynthesizer  (test-only)
// ---------------------------------------------------------------------------

/// What the mock saw for one `render` call.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    pub input: std::path::PathBuf,
    pub output: std::path::PathBuf,
    pub vocal_tract_transformation: bool,
    pub fixed_rate: bool,
    pub with_mapper: bool,
    pub prosody: ProsodyParams,
}

/// Copies input to output and records the request.  Inputs whose file name
/// contains `fail_marker` produce an error instead.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockResynthesizer {
    pub calls: std::sync::Mutex<Vec<RenderCall>>,
    pub fail_marker: Option<String>,
}

#[cfg(test)]
impl MockResynthesizer {
    pub fn failing_on(marker: impl Into<String>) -> Self {
        Self {
            fail_marker: Some(marker.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl Resynthesizer for MockResynthesizer {
    fn render(&self, request: &ResynthesisRequest<'_>) -> Result<(), EngineError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RenderCall {
                input: request.input.to_path_buf(),
                output: request.output.to_path_buf(),
                vocal_tract_transformation: request.vocal_tract_transformation,
                fixed_rate: request.fixed_rate,
                with_mapper: request.mapper.is_some(),
                prosody: request.prosody.clone(),
            });
        }

        let name = request
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(marker) = &self.fail_marker {
            if name.contains(marker.as_str()) {
                return Err(EngineError::Unsupported(format!("mock refuses {name}")));
            }
        }

        std::fs::copy(request.input, request.output)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
