//! Channel mixing and linear-interpolation resampling.
//!
//! The renderer works on **mono `f64`** frames.  This module provides the two
//! conversion steps it needs:
//!
//! 1. [`downmix`]: average any number of interleaved channels to mono.
//! 2. [`resample_by`]: resample a block by an arbitrary rate ratio.  The
//!    renderer uses this to compress or stretch the LPC excitation of a frame
//!    when applying a pitch scale.

// ---------------------------------------------------------------------------
// downmix
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`.
///
/// * If `channels == 1` the input slice is returned as an owned `Vec`.
/// * If `channels == 0` an empty vector is returned.
///
/// ```rust
/// use codebook_vc::audio::downmix;
///
/// let stereo = vec![0.5_f64, -0.5, 0.2, -0.2]; // L R L R
/// let mono = downmix(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!(mono[0].abs() < 1e-12);
/// ```
pub fn downmix(samples: &[f64], channels: u16) -> Vec<f64> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f64>() / n as f64)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample_by
// ---------------------------------------------------------------------------

/// Resample `samples` so that the output is `1 / ratio` times as long, using
/// linear interpolation.
///
/// A `ratio` of `2.0` reads the input twice as fast (half the length, every
/// period halved); `0.5` stretches it to twice the length.
///
/// * A ratio of exactly `1.0` returns the input unchanged.
/// * Non-positive or non-finite ratios, and empty input, return an empty
///   vector.
///
/// ```rust
/// use codebook_vc::audio::resample_by;
///
/// let block = vec![0.25_f64; 400];
/// assert_eq!(resample_by(&block, 2.0).len(), 200);
/// assert_eq!(resample_by(&block, 0.5).len(), 800);
/// ```
pub fn resample_by(samples: &[f64], ratio: f64) -> Vec<f64> {
    if samples.is_empty() || !ratio.is_finite() || ratio <= 0.0 {
        return Vec::new();
    }

    if ratio == 1.0 {
        return samples.to_vec();
    }

    let output_len = (samples.len() as f64 / ratio).round().max(1.0) as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 * ratio;
        let idx = src_pos as usize;
        let frac = src_pos - idx as f64;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

/// Fit `samples` to exactly `len` samples by cyclic repetition or truncation.
///
/// Used after [`resample_by`] so a pitch-scaled excitation still fills the
/// analysis frame it came from.
pub fn fit_cyclic(samples: &[f64], len: usize) -> Vec<f64> {
    if samples.is_empty() {
        return vec![0.0; len];
    }
    samples.iter().copied().cycle().take(len).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
