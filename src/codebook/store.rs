//! In-memory codebook: header, entries and load-time statistics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prosody::SpeakerPitchStatistics;

/// Largest linear-prediction order accepted from a codebook header.
pub const MAX_LP_ORDER: usize = 100;
/// Longest analysis window or frame skip accepted from a codebook header.
pub const MAX_FRAME_SECS: f64 = 1.0;

// ---------------------------------------------------------------------------
// CodebookError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CodebookError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a codebook file (bad magic)")]
    BadMagic,

    #[error("Unsupported codebook version {0}")]
    UnsupportedVersion(u16),

    #[error("Codebook contains no entries")]
    Empty,

    #[error("Invalid codebook: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Source and target speaker pitch statistics gathered at training time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CodebookPitchStatistics {
    pub source: SpeakerPitchStatistics,
    pub target: SpeakerPitchStatistics,
}

/// Analysis settings shared by every entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodebookHeader {
    /// Linear-prediction order; every entry vector has this length.
    pub lp_order: usize,
    pub sample_rate: u32,
    pub window_size_secs: f64,
    pub skip_size_secs: f64,
    pub num_entries: usize,
    pub pitch: Option<CodebookPitchStatistics>,
}

impl CodebookHeader {
    pub fn new(lp_order: usize, sample_rate: u32, window_size_secs: f64, skip_size_secs: f64) -> Self {
        Self {
            lp_order,
            sample_rate,
            window_size_secs,
            skip_size_secs,
            num_entries: 0,
            pitch: None,
        }
    }

    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    /// Analysis window length in samples at `sample_rate`.
    pub fn window_samples(&self, sample_rate: u32) -> usize {
        ((self.window_size_secs * sample_rate as f64).round() as usize).max(1)
    }

    /// Frame skip in samples at `sample_rate`.
    pub fn skip_samples(&self, sample_rate: u32) -> usize {
        ((self.skip_size_secs * sample_rate as f64).round() as usize).max(1)
    }

    pub fn validate(&self) -> Result<(), CodebookError> {
        if self.lp_order == 0 || self.lp_order > MAX_LP_ORDER {
            return Err(CodebookError::Invalid(format!(
                "LP order {} outside 1..={MAX_LP_ORDER}",
                self.lp_order
            )));
        }
        if self.sample_rate == 0 {
            return Err(CodebookError::Invalid("sample rate is zero".into()));
        }
        let in_range = |secs: f64| secs > 0.0 && secs <= MAX_FRAME_SECS;
        if !(in_range(self.window_size_secs) && in_range(self.skip_size_secs)) {
            return Err(CodebookError::Invalid(format!(
                "window {} s and skip {} s must lie in (0, {MAX_FRAME_SECS}] s",
                self.window_size_secs, self.skip_size_secs
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Which half of an entry to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodebookSide {
    Source,
    Target,
}

/// One aligned source/target acoustic unit.  LSFs are in Hz.
#[derive(Debug, Clone, PartialEq)]
pub struct CodebookEntry {
    pub source_lsfs: Vec<f64>,
    pub source_weights: Vec<f64>,
    pub target_lsfs: Vec<f64>,
    pub target_weights: Vec<f64>,
}

impl CodebookEntry {
    pub fn new(
        source_lsfs: Vec<f64>,
        source_weights: Vec<f64>,
        target_lsfs: Vec<f64>,
        target_weights: Vec<f64>,
    ) -> Self {
        Self {
            source_lsfs,
            source_weights,
            target_lsfs,
            target_weights,
        }
    }

    pub fn lsfs(&self, side: CodebookSide) -> &[f64] {
        match side {
            CodebookSide::Source => &self.source_lsfs,
            CodebookSide::Target => &self.target_lsfs,
        }
    }

    pub fn weights(&self, side: CodebookSide) -> &[f64] {
        match side {
            CodebookSide::Source => &self.source_weights,
            CodebookSide::Target => &self.target_weights,
        }
    }

    fn validate(&self, index: usize, header: &CodebookHeader) -> Result<(), CodebookError> {
        let invalid = |what: String| CodebookError::Invalid(format!("entry {index}: {what}"));

        for (name, v) in [
            ("source LSFs", &self.source_lsfs),
            ("source weights", &self.source_weights),
            ("target LSFs", &self.target_lsfs),
            ("target weights", &self.target_weights),
        ] {
            if v.len() != header.lp_order {
                return Err(invalid(format!(
                    "{name} have length {}, expected {}",
                    v.len(),
                    header.lp_order
                )));
            }
            if v.iter().any(|x| !x.is_finite()) {
                return Err(invalid(format!("{name} contain non-finite values")));
            }
        }

        for (name, lsfs) in [("source", &self.source_lsfs), ("target", &self.target_lsfs)] {
            let ordered = lsfs.windows(2).all(|w| w[0] < w[1]);
            let inside = lsfs.iter().all(|&f| f > 0.0 && f < header.nyquist());
            if !ordered || !inside {
                return Err(invalid(format!(
                    "{name} LSFs must increase strictly inside (0, {})",
                    header.nyquist()
                )));
            }
        }

        if self
            .source_weights
            .iter()
            .chain(&self.target_weights)
            .any(|&w| w < 0.0)
        {
            return Err(invalid("negative weight".into()));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Per-coefficient mean and variance of each side, computed once at load.
#[derive(Debug, Clone, PartialEq)]
pub struct CodebookStats {
    pub source_mean: Vec<f64>,
    pub source_variance: Vec<f64>,
    pub target_mean: Vec<f64>,
    pub target_variance: Vec<f64>,
}

impl CodebookStats {
    fn compute(entries: &[CodebookEntry], order: usize) -> Self {
        let moments = |side: CodebookSide| {
            let n = entries.len() as f64;
            let mut mean = vec![0.0; order];
            for e in entries {
                for (m, x) in mean.iter_mut().zip(e.lsfs(side)) {
                    *m += x / n;
                }
            }
            let mut variance = vec![0.0; order];
            for e in entries {
                for ((v, x), m) in variance.iter_mut().zip(e.lsfs(side)).zip(&mean) {
                    *v += (x - m).powi(2) / n;
                }
            }
            (mean, variance)
        };

        let (source_mean, source_variance) = moments(CodebookSide::Source);
        let (target_mean, target_variance) = moments(CodebookSide::Target);
        Self {
            source_mean,
            source_variance,
            target_mean,
            target_variance,
        }
    }

    pub fn variance(&self, side: CodebookSide) -> &[f64] {
        match side {
            CodebookSide::Source => &self.source_variance,
            CodebookSide::Target => &self.target_variance,
        }
    }
}

// ---------------------------------------------------------------------------
// Codebook
// ---------------------------------------------------------------------------

/// Header plus validated entries.  Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Codebook {
    header: CodebookHeader,
    entries: Vec<CodebookEntry>,
    stats: CodebookStats,
}

impl Codebook {
    /// Validate `entries` against `header` and compute statistics.
    ///
    /// `header.num_entries` is set to `entries.len()`.
    pub fn new(mut header: CodebookHeader, entries: Vec<CodebookEntry>) -> Result<Self, CodebookError> {
        header.validate()?;
        if entries.is_empty() {
            return Err(CodebookError::Empty);
        }
        for (i, entry) in entries.iter().enumerate() {
            entry.validate(i, &header)?;
        }

        header.num_entries = entries.len();
        let stats = CodebookStats::compute(&entries, header.lp_order);

        Ok(Self {
            header,
            entries,
            stats,
        })
    }

    pub fn header(&self) -> &CodebookHeader {
        &self.header
    }

    pub fn entries(&self) -> &[CodebookEntry] {
        &self.entries
    }

    pub fn stats(&self) -> &CodebookStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false` for a constructed codebook; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lp_order(&self) -> usize {
        self.header.lp_order
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
