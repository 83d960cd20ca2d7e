//! Prosody settings: scale-factor sequences and pitch-statistic transformation
//! choices.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ScaleFactors
// ---------------------------------------------------------------------------

/// Pitch, time, energy and vocal-tract scale sequences.
///
/// Each sequence is spread evenly over the utterance and linearly interpolated
/// between points, so `[1.0]` is a constant identity and `[1.0, 1.5]` ramps
/// from no change at the start to ×1.5 at the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleFactors {
    pub pitch: Vec<f64>,
    pub time: Vec<f64>,
    pub energy: Vec<f64>,
    pub vocal_tract: Vec<f64>,
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self::identity()
    }
}

impl ScaleFactors {
    pub fn identity() -> Self {
        Self {
            pitch: vec![1.0],
            time: vec![1.0],
            energy: vec![1.0],
            vocal_tract: vec![1.0],
        }
    }

    /// `true` when every value of every sequence is exactly `1.0`.
    ///
    /// ```
    /// use codebook_vc::prosody::ScaleFactors;
    ///
    /// assert!(ScaleFactors::identity().is_identity());
    ///
    /// let mut louder = ScaleFactors::identity();
    /// louder.energy = vec![1.0, 1.2];
    /// assert!(!louder.is_identity());
    /// ```
    pub fn is_identity(&self) -> bool {
        [&self.pitch, &self.time, &self.energy, &self.vocal_tract]
            .iter()
            .all(|seq| seq.iter().all(|&v| v == 1.0))
    }

    /// All values must be finite and positive.
    pub fn validate(&self) -> Result<(), String> {
        for (name, seq) in [
            ("pitch", &self.pitch),
            ("time", &self.time),
            ("energy", &self.energy),
            ("vocal_tract", &self.vocal_tract),
        ] {
            if let Some(bad) = seq.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
                return Err(format!("{name} scale {bad} must be finite and positive"));
            }
        }
        Ok(())
    }

    pub fn pitch_at(&self, position: f64) -> f64 {
        value_at(&self.pitch, position)
    }

    pub fn time_at(&self, position: f64) -> f64 {
        value_at(&self.time, position)
    }

    pub fn energy_at(&self, position: f64) -> f64 {
        value_at(&self.energy, position)
    }

    pub fn vocal_tract_at(&self, position: f64) -> f64 {
        value_at(&self.vocal_tract, position)
    }
}

/// Linear interpolation of `seq` at `position ∈ [0, 1]`; empty sequences are
/// identity.
fn value_at(seq: &[f64], position: f64) -> f64 {
    match seq.len() {
        0 => 1.0,
        1 => seq[0],
        n => {
            let pos = position.clamp(0.0, 1.0) * (n - 1) as f64;
            let idx = (pos.floor() as usize).min(n - 2);
            let frac = pos - idx as f64;
            seq[idx] * (1.0 - frac) + seq[idx + 1] * frac
        }
    }
}

// ---------------------------------------------------------------------------
// Pitch statistics type / transformation method
// ---------------------------------------------------------------------------

/// Domain pitch statistics are computed and imposed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PitchStatisticsType {
    #[default]
    Hertz,
    LogHertz,
}

impl PitchStatisticsType {
    pub fn label(&self) -> &'static str {
        match self {
            PitchStatisticsType::Hertz => "Hertz",
            PitchStatisticsType::LogHertz => "LogHertz",
        }
    }
}

/// Where the input-side statistics come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsScope {
    /// Source speaker statistics stored in the codebook.
    Global,
    /// Statistics of the utterance being converted.
    Sentence,
}

/// Which statistics are imposed on the contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Mean,
    StdDev,
    Range,
    Slope,
    Intercept,
    MeanStdDev,
    MeanSlope,
    InterceptStdDev,
    InterceptSlope,
}

/// Pitch contour transformation selected for the prosody pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PitchTransformationMethod {
    #[default]
    NoTransformation,
    GlobalMean,
    GlobalStdDev,
    GlobalRange,
    GlobalSlope,
    GlobalIntercept,
    GlobalMeanStdDev,
    GlobalMeanSlope,
    GlobalInterceptStdDev,
    GlobalInterceptSlope,
    SentenceMean,
    SentenceStdDev,
    SentenceRange,
    SentenceSlope,
    SentenceIntercept,
    SentenceMeanStdDev,
    SentenceMeanSlope,
    SentenceInterceptStdDev,
    SentenceInterceptSlope,
}

impl PitchTransformationMethod {
    /// Split into scope and adjustment; `None` for `NoTransformation`.
    pub fn parts(&self) -> Option<(StatisticsScope, Adjustment)> {
        use Adjustment as A;
        use PitchTransformationMethod as M;
        use StatisticsScope::{Global, Sentence};

        let parts = match self {
            M::NoTransformation => return None,
            M::GlobalMean => (Global, A::Mean),
            M::GlobalStdDev => (Global, A::StdDev),
            M::GlobalRange => (Global, A::Range),
            M::GlobalSlope => (Global, A::Slope),
            M::GlobalIntercept => (Global, A::Intercept),
            M::GlobalMeanStdDev => (Global, A::MeanStdDev),
            M::GlobalMeanSlope => (Global, A::MeanSlope),
            M::GlobalInterceptStdDev => (Global, A::InterceptStdDev),
            M::GlobalInterceptSlope => (Global, A::InterceptSlope),
            M::SentenceMean => (Sentence, A::Mean),
            M::SentenceStdDev => (Sentence, A::StdDev),
            M::SentenceRange => (Sentence, A::Range),
            M::SentenceSlope => (Sentence, A::Slope),
            M::SentenceIntercept => (Sentence, A::Intercept),
            M::SentenceMeanStdDev => (Sentence, A::MeanStdDev),
            M::SentenceMeanSlope => (Sentence, A::MeanSlope),
            M::SentenceInterceptStdDev => (Sentence, A::InterceptStdDev),
            M::SentenceInterceptSlope => (Sentence, A::InterceptSlope),
        };
        Some(parts)
    }

    pub fn is_transformation(&self) -> bool {
        *self != PitchTransformationMethod::NoTransformation
    }
}

// ---------------------------------------------------------------------------
// ProsodyParams
// ---------------------------------------------------------------------------

/// Prosody settings for the conversion.
///
/// The `use_input_*` flags keep the corresponding statistic of the input
/// distribution instead of taking it from the target speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProsodyParams {
    pub statistics_type: PitchStatisticsType,
    pub transformation_method: PitchTransformationMethod,
    pub use_input_mean: bool,
    pub use_input_std_dev: bool,
    pub use_input_range: bool,
    pub use_input_slope: bool,
    pub use_input_intercept: bool,
    pub scales: ScaleFactors,
}

impl Default for ProsodyParams {
    fn default() -> Self {
        Self {
            statistics_type: PitchStatisticsType::Hertz,
            transformation_method: PitchTransformationMethod::NoTransformation,
            use_input_mean: false,
            use_input_std_dev: false,
            use_input_range: false,
            use_input_slope: false,
            use_input_intercept: false,
            scales: ScaleFactors::identity(),
        }
    }
}

impl ProsodyParams {
    /// `true` when a prosody pass would change anything.
    pub fn requires_resynthesis(&self) -> bool {
        !self.scales.is_identity() || self.transformation_method.is_transformation()
    }

    /// Copy with identity scales and no pitch transformation, used by the
    /// vocal-tract-only pass.
    pub fn neutral(&self) -> Self {
        Self {
            transformation_method: PitchTransformationMethod::NoTransformation,
            scales: ScaleFactors::identity(),
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
