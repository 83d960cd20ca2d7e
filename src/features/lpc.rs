//! Linear prediction and line spectral frequencies.
//!
//! Predictor polynomials use the convention `A(z) = 1 + Σ a_k z^-k`, stored as
//! `[1.0, a_1, …, a_p]`.  LSFs are returned in radians by the conversion
//! functions and converted to Hz with [`radians_to_hz`] before they reach the
//! codebook, which stores everything in Hz.

use std::f64::consts::PI;

use super::FeatureError;

/// Grid resolution used when searching for LSF roots on `(0, π)`.
const LSF_GRID_POINTS: usize = 2048;
/// Bisection steps per bracketed root.
const LSF_BISECTION_STEPS: usize = 48;
/// White-noise correction applied to `r[0]` before Levinson–Durbin.
const WHITE_NOISE_CORRECTION: f64 = 1.0 + 1e-9;

// ---------------------------------------------------------------------------
// Windows and autocorrelation
// ---------------------------------------------------------------------------

/// Periodic Hann window of `len` samples.
pub fn hann_window(len: usize) -> Vec<f64> {
    (0..len)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / len as f64).cos())
        .collect()
}

/// Autocorrelation lags `r[0..=order]`.
pub fn autocorrelation(frame: &[f64], order: usize) -> Vec<f64> {
    (0..=order)
        .map(|lag| {
            frame
                .iter()
                .zip(frame.iter().skip(lag))
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Levinson–Durbin
// ---------------------------------------------------------------------------

/// Solve the normal equations for a predictor of `order` coefficients.
///
/// Returns `[1.0, a_1, …, a_order]`.  A silent frame (`r[0] == 0`) yields the
/// identity predictor.
///
/// ```
/// use codebook_vc::features::lpc::levinson_durbin;
///
/// // AR(1) process with pole at 0.9
/// let a = levinson_durbin(&[1.0, 0.9, 0.81], 2);
/// assert!((a[1] + 0.9).abs() < 1e-12);
/// assert!(a[2].abs() < 1e-12);
/// ```
pub fn levinson_durbin(r: &[f64], order: usize) -> Vec<f64> {
    let mut a = vec![0.0; order + 1];
    a[0] = 1.0;

    if r.len() <= order || r[0] <= f64::EPSILON {
        return a;
    }

    let mut err = r[0];
    for i in 1..=order {
        let acc: f64 = r[i] + (1..i).map(|j| a[j] * r[i - j]).sum::<f64>();
        let k = -acc / err;

        let prev = a.clone();
        for j in 1..i {
            a[j] = prev[j] + k * prev[i - j];
        }
        a[i] = k;

        err *= 1.0 - k * k;
        if err <= 0.0 {
            break;
        }
    }

    a
}

/// Hann-window `frame` and estimate its predictor of the given order.
pub fn analyse_frame(frame: &[f64], order: usize) -> Vec<f64> {
    let windowed: Vec<f64> = frame
        .iter()
        .zip(hann_window(frame.len()))
        .map(|(x, w)| x * w)
        .collect();

    let mut r = autocorrelation(&windowed, order);
    if let Some(r0) = r.first_mut() {
        *r0 *= WHITE_NOISE_CORRECTION;
    }
    levinson_durbin(&r, order)
}

// ---------------------------------------------------------------------------
// LPC <-> LSF
// ---------------------------------------------------------------------------

/// Convert a predictor to line spectral frequencies in radians, ascending in
/// `(0, π)`.
///
/// # Errors
///
/// [`FeatureError::Lsf`] when the root search does not find exactly `p`
/// interior roots (typically a non-minimum-phase predictor).
pub fn lpc_to_lsf(a: &[f64]) -> Result<Vec<f64>, FeatureError> {
    let order = a.len().saturating_sub(1);
    if order == 0 {
        return Ok(Vec::new());
    }

    // Sum and difference polynomials of degree p + 1.
    let n = order + 1;
    let ext = |k: usize| if k <= order { a[k] } else { 0.0 };
    let sum: Vec<f64> = (0..=n).map(|k| ext(k) + ext(n - k)).collect();
    let diff: Vec<f64> = (0..=n).map(|k| ext(k) - ext(n - k)).collect();

    let half = n as f64 / 2.0;
    let eval_sum = |w: f64| -> f64 {
        sum.iter()
            .enumerate()
            .map(|(k, c)| c * ((k as f64 - half) * w).cos())
            .sum()
    };
    let eval_diff = |w: f64| -> f64 {
        diff.iter()
            .enumerate()
            .map(|(k, c)| c * ((k as f64 - half) * w).sin())
            .sum()
    };

    let mut roots = find_roots(eval_sum);
    roots.extend(find_roots(eval_diff));
    roots.sort_by(|x, y| x.total_cmp(y));

    if roots.len() != order {
        return Err(FeatureError::Lsf(format!(
            "expected {order} line spectral frequencies, found {}",
            roots.len()
        )));
    }

    Ok(roots)
}

fn find_roots(f: impl Fn(f64) -> f64) -> Vec<f64> {
    let step = PI / LSF_GRID_POINTS as f64;
    let positive = |v: f64| v >= 0.0;

    let mut roots = Vec::new();
    let mut lo = step;
    let mut f_lo = f(lo);

    for i in 2..LSF_GRID_POINTS {
        let hi = step * i as f64;
        let f_hi = f(hi);

        if positive(f_lo) != positive(f_hi) {
            let (mut a, mut b, mut fa) = (lo, hi, f_lo);
            for _ in 0..LSF_BISECTION_STEPS {
                let mid = 0.5 * (a + b);
                let fm = f(mid);
                if positive(fm) == positive(fa) {
                    a = mid;
                    fa = fm;
                } else {
                    b = mid;
                }
            }
            roots.push(0.5 * (a + b));
        }

        lo = hi;
        f_lo = f_hi;
    }

    roots
}

/// Convert ascending LSFs in radians back to a predictor `[1.0, a_1, …, a_p]`.
pub fn lsf_to_lpc(lsf: &[f64]) -> Vec<f64> {
    let order = lsf.len();
    if order == 0 {
        return vec![1.0];
    }

    let quadratic = |w: f64| [1.0, -2.0 * w.cos(), 1.0];

    let mut sum = vec![1.0];
    for &w in lsf.iter().step_by(2) {
        sum = poly_mul(&sum, &quadratic(w));
    }
    let mut diff = vec![1.0];
    for &w in lsf.iter().skip(1).step_by(2) {
        diff = poly_mul(&diff, &quadratic(w));
    }

    if order % 2 == 0 {
        sum = poly_mul(&sum, &[1.0, 1.0]);
        diff = poly_mul(&diff, &[1.0, -1.0]);
    } else {
        diff = poly_mul(&diff, &[1.0, 0.0, -1.0]);
    }

    (0..=order).map(|k| 0.5 * (sum[k] + diff[k])).collect()
}

fn poly_mul(x: &[f64], y: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; x.len() + y.len() - 1];
    for (i, a) in x.iter().enumerate() {
        for (j, b) in y.iter().enumerate() {
            out[i + j] += a * b;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Hz helpers
// ---------------------------------------------------------------------------

pub fn radians_to_hz(w: f64, sample_rate: u32) -> f64 {
    w * sample_rate as f64 / (2.0 * PI)
}

pub fn hz_to_radians(f: f64, sample_rate: u32) -> f64 {
    f * 2.0 * PI / sample_rate as f64
}

/// Inverse-harmonic weights `1/(f_i − f_{i−1}) + 1/(f_{i+1} − f_i)` with 0 Hz
/// and Nyquist as the outer neighbours.  Closely spaced LSFs (formant peaks)
/// get large weights.
pub fn inverse_harmonic_weights(lsf_hz: &[f64], sample_rate: u32) -> Vec<f64> {
    let nyquist = sample_rate as f64 / 2.0;
    let gap = |d: f64| 1.0 / d.max(f64::EPSILON);

    (0..lsf_hz.len())
        .map(|i| {
            let below = if i > 0 { lsf_hz[i - 1] } else { 0.0 };
            let above = lsf_hz.get(i + 1).copied().unwrap_or(nyquist);
            gap(lsf_hz[i] - below) + gap(above - lsf_hz[i])
        })
        .collect()
}

/// Force LSFs (Hz) to be strictly increasing with at least `min_gap_hz`
/// between neighbours and inside `(0, nyquist)`, which keeps the synthesis
/// filter stable.
pub fn stabilize_lsfs(lsf_hz: &[f64], sample_rate: u32, min_gap_hz: f64) -> Vec<f64> {
    let nyquist = sample_rate as f64 / 2.0;
    let mut out = lsf_hz.to_vec();

    let mut floor = 0.0;
    for f in out.iter_mut() {
        *f = f.max(floor + min_gap_hz);
        floor = *f;
    }

    let mut ceiling = nyquist;
    for f in out.iter_mut().rev() {
        *f = f.min(ceiling - min_gap_hz);
        ceiling = *f;
    }

    out
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// FIR prediction-error filter `e[n] = Σ a_k x[n−k]`.
pub fn analysis_filter(x: &[f64], a: &[f64]) -> Vec<f64> {
    (0..x.len())
        .map(|n| {
            a.iter()
                .enumerate()
                .take(n + 1)
                .map(|(k, ak)| ak * x[n - k])
                .sum()
        })
        .collect()
}

/// All-pole synthesis filter `y[n] = e[n] − Σ_{k≥1} a_k y[n−k]`.
pub fn synthesis_filter(e: &[f64], a: &[f64]) -> Vec<f64> {
    let mut y = vec![0.0; e.len()];
    for n in 0..e.len() {
        let feedback: f64 = a
            .iter()
            .enumerate()
            .skip(1)
            .take(n)
            .map(|(k, ak)| ak * y[n - k])
            .sum();
        y[n] = e[n] - feedback;
    }
    y
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
