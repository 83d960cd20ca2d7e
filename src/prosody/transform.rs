//! Pitch contour transformation.
//!
//! With input statistics `in` (source speaker or the sentence itself) and
//! output statistics `out` (target speaker, or input where a `use_input_*`
//! flag is set), each voiced value `x` at frame time `t` becomes:
//!
//! | Adjustment      | Result                                                  |
//! |-----------------|---------------------------------------------------------|
//! | Mean            | `x − m_in + m_out`                                      |
//! | StdDev          | `m_in + (x − m_in)·s_out/s_in`                          |
//! | Range           | `m_in + (x − m_in)·r_out/r_in`                          |
//! | Slope           | `x + (k_out − k_in)·t`                                  |
//! | Intercept       | `x + b_out − b_in`                                      |
//! | MeanStdDev      | `m_out + (x − m_in)·s_out/s_in`                         |
//! | MeanSlope       | `x + (k_out − k_in)·(t − t̄) − m_in + m_out`             |
//! | InterceptStdDev | `b_out + k_in·t + (x − b_in − k_in·t)·s_out/s_in`       |
//! | InterceptSlope  | `x − (k_in·t + b_in) + (k_out·t + b_out)`               |
//!
//! Values are processed in the configured domain (Hz or log-Hz).  Unvoiced
//! frames stay at zero.

use crate::features::PitchTrack;

use super::params::{Adjustment, ProsodyParams, StatisticsScope};
use super::statistics::{from_domain, to_domain, PitchStatistics, SpeakerPitchStatistics};

/// Voiced output is never pushed below this frequency.
pub const MIN_F0_HZ: f64 = 10.0;

/// Apply `params.transformation_method` to `track`.
///
/// Returns the new F0 values, one per frame of `track`.  The contour is
/// returned unchanged when no transformation is requested or when a
/// sentence-scope method meets a fully unvoiced track.
pub fn transform_contour(
    track: &PitchTrack,
    params: &ProsodyParams,
    source: &SpeakerPitchStatistics,
    target: &SpeakerPitchStatistics,
) -> Vec<f64> {
    let Some((scope, adjustment)) = params.transformation_method.parts() else {
        return track.values.clone();
    };
    let kind = params.statistics_type;

    let input = match scope {
        StatisticsScope::Global => *source.select(kind),
        StatisticsScope::Sentence => match PitchStatistics::from_track(track, kind) {
            Some(stats) => stats,
            None => return track.values.clone(),
        },
    };
    let output = output_statistics(&input, target.select(kind), params);

    let voiced_times: Vec<f64> = track.voiced().map(|(i, _)| track.frame_time(i)).collect();
    let t_mean = if voiced_times.is_empty() {
        0.0
    } else {
        voiced_times.iter().sum::<f64>() / voiced_times.len() as f64
    };

    track
        .values
        .iter()
        .enumerate()
        .map(|(i, &f0)| {
            if f0 <= 0.0 {
                return 0.0;
            }
            let x = to_domain(f0, kind);
            let t = track.frame_time(i);
            let y = adjust(x, t, t_mean, adjustment, &input, &output);
            let hz = from_domain(y, kind);
            if hz.is_finite() {
                hz.max(MIN_F0_HZ)
            } else {
                f0
            }
        })
        .collect()
}

fn output_statistics(
    input: &PitchStatistics,
    target: &PitchStatistics,
    params: &ProsodyParams,
) -> PitchStatistics {
    let pick = |use_input: bool, a: f64, b: f64| if use_input { a } else { b };
    PitchStatistics {
        mean: pick(params.use_input_mean, input.mean, target.mean),
        std_dev: pick(params.use_input_std_dev, input.std_dev, target.std_dev),
        range: pick(params.use_input_range, input.range, target.range),
        slope: pick(params.use_input_slope, input.slope, target.slope),
        intercept: pick(params.use_input_intercept, input.intercept, target.intercept),
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den.abs() > f64::EPSILON {
        num / den
    } else {
        1.0
    }
}

fn adjust(
    x: f64,
    t: f64,
    t_mean: f64,
    adjustment: Adjustment,
    input: &PitchStatistics,
    output: &PitchStatistics,
) -> f64 {
    let spread = ratio(output.std_dev, input.std_dev);
    match adjustment {
        Adjustment::Mean => x - input.mean + output.mean,
        Adjustment::StdDev => input.mean + (x - input.mean) * spread,
        Adjustment::Range => {
            input.mean + (x - input.mean) * ratio(output.range, input.range)
        }
        Adjustment::Slope => x + (output.slope - input.slope) * t,
        Adjustment::Intercept => x + output.intercept - input.intercept,
        Adjustment::MeanStdDev => output.mean + (x - input.mean) * spread,
        Adjustment::MeanSlope => {
            x + (output.slope - input.slope) * (t - t_mean) - input.mean + output.mean
        }
        Adjustment::InterceptStdDev => {
            let trend = input.slope * t;
            output.intercept + trend + (x - input.intercept - trend) * spread
        }
        Adjustment::InterceptSlope => {
            x - (input.slope * t + input.intercept) + (output.slope * t + output.intercept)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
