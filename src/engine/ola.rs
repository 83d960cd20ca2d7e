//! Frame-wise LPC resynthesis with overlap-add.
//!
//! Per analysis frame:
//!
//! ```text
//! frame ─► LPC a_src ─► residual = A_src(z)·frame
//!            │                       │
//!            ▼                       ▼ resample by pitch factor
//!          LSF (Hz) ─► mapper ─► × vocal-tract scale ─► a_tgt
//!                                                      │
//!                        y = residual / A_tgt(z)  ◄────┘
//!                        y ·= sqrt(E_in / E_out) · energy scale
//! ```
//!
//! Frames are cross-faded with a Hann window at a synthesis hop of
//! `hop × time scale`, and the sum is normalised by the summed window.

use crate::audio::{fit_cyclic, read_wav, resample_by, write_wav, AudioError, MonoAudio};
use crate::features::lpc::{
    analyse_frame, analysis_filter, hann_window, hz_to_radians, inverse_harmonic_weights,
    lpc_to_lsf, lsf_to_lpc, radians_to_hz, stabilize_lsfs, synthesis_filter,
};
use crate::features::PitchTrack;
use crate::prosody::transform_contour;

use super::{EngineError, ResynthesisRequest, Resynthesizer};

/// Smallest spacing kept between neighbouring target LSFs.
pub const DEFAULT_MIN_LSF_GAP_HZ: f64 = 50.0;

/// Window sums below this are treated as uncovered samples.
const MIN_WINDOW_SUM: f64 = 1e-6;

/// Built-in [`Resynthesizer`].
#[derive(Debug, Clone, Copy)]
pub struct OverlapAddRenderer {
    pub min_lsf_gap_hz: f64,
}

impl Default for OverlapAddRenderer {
    fn default() -> Self {
        Self {
            min_lsf_gap_hz: DEFAULT_MIN_LSF_GAP_HZ,
        }
    }
}

/// Per-frame controls after the scale sequences have been sampled.
#[derive(Debug, Clone, Copy)]
struct FrameControls {
    pitch: f64,
    energy: f64,
    vocal_tract: f64,
}

impl OverlapAddRenderer {
    pub fn new(min_lsf_gap_hz: f64) -> Self {
        Self { min_lsf_gap_hz }
    }

    /// Ratio `transformed F0 / original F0` per analysis frame.
    fn pitch_factors(
        &self,
        request: &ResynthesisRequest<'_>,
        frame_centres_secs: &[f64],
    ) -> Result<Vec<f64>, EngineError> {
        let prosody = request.prosody;
        if !prosody.transformation_method.is_transformation() {
            return Ok(vec![1.0; frame_centres_secs.len()]);
        }

        let statistics = request
            .codebook
            .header()
            .pitch
            .ok_or(EngineError::MissingPitchStatistics)?;
        let track = PitchTrack::load_from(request.pitch_file)?;
        let transformed = transform_contour(&track, prosody, &statistics.source, &statistics.target);

        Ok(frame_centres_secs
            .iter()
            .map(|&t| {
                track
                    .frame_at(t)
                    .map(|k| (track.values[k], transformed[k]))
                    .filter(|&(f0, new)| f0 > 0.0 && new > 0.0)
                    .map_or(1.0, |(f0, new)| new / f0)
            })
            .collect())
    }

    /// Predictor for the output frame, or `None` to keep the source envelope.
    fn target_predictor(
        &self,
        request: &ResynthesisRequest<'_>,
        a_src: &[f64],
        sample_rate: u32,
        vocal_tract: f64,
    ) -> Result<Option<Vec<f64>>, EngineError> {
        let lsf = match lpc_to_lsf(a_src) {
            Ok(lsf) => lsf,
            Err(e) => {
                log::debug!("render: keeping source envelope: {e}");
                return Ok(None);
            }
        };
        let lsf_hz: Vec<f64> = lsf.iter().map(|&w| radians_to_hz(w, sample_rate)).collect();

        let mapped = match request.mapper {
            Some(mapper) if request.vocal_tract_transformation => {
                let weights = inverse_harmonic_weights(&lsf_hz, sample_rate);
                mapper.map_with(
                    request.codebook,
                    &lsf_hz,
                    &weights,
                    request.substitution_mode(),
                )?
            }
            _ => lsf_hz,
        };

        let scaled: Vec<f64> = mapped.iter().map(|f| f * vocal_tract).collect();
        let stable = stabilize_lsfs(&scaled, sample_rate, self.min_lsf_gap_hz);
        let radians: Vec<f64> = stable.iter().map(|&f| hz_to_radians(f, sample_rate)).collect();
        Ok(Some(lsf_to_lpc(&radians)))
    }

    fn render_frame(
        &self,
        request: &ResynthesisRequest<'_>,
        frame: &[f64],
        sample_rate: u32,
        controls: FrameControls,
    ) -> Result<Vec<f64>, EngineError> {
        let needs_analysis = request.substitutes_envelope()
            || controls.vocal_tract != 1.0
            || controls.pitch != 1.0;
        if !needs_analysis {
            return Ok(frame.iter().map(|x| x * controls.energy).collect());
        }

        let order = request.codebook.lp_order();
        let a_src = analyse_frame(frame, order);
        let residual = analysis_filter(frame, &a_src);

        let excitation = if (controls.pitch - 1.0).abs() > f64::EPSILON {
            fit_cyclic(&resample_by(&residual, controls.pitch), frame.len())
        } else {
            residual
        };

        let a_tgt = self
            .target_predictor(request, &a_src, sample_rate, controls.vocal_tract)?
            .unwrap_or(a_src);
        let mut y = synthesis_filter(&excitation, &a_tgt);

        let e_in: f64 = frame.iter().map(|x| x * x).sum();
        let e_out: f64 = y.iter().map(|x| x * x).sum();
        let gain = if e_out > 0.0 && e_out.is_finite() {
            (e_in / e_out).sqrt()
        } else {
            0.0
        };
        for v in y.iter_mut() {
            *v *= gain * controls.energy;
        }
        Ok(y)
    }
}

impl Resynthesizer for OverlapAddRenderer {
    fn render(&self, request: &ResynthesisRequest<'_>) -> Result<(), EngineError> {
        let audio = read_wav(request.input)?;
        let sample_rate = audio.sample_rate;
        let header = request.codebook.header();
        let scales = request.scales();

        if request.substitutes_envelope() && sample_rate != header.sample_rate {
            return Err(AudioError::UnsupportedFormat {
                path: request.input.display().to_string(),
                reason: format!(
                    "sample rate {sample_rate} Hz, codebook expects {} Hz",
                    header.sample_rate
                ),
            }
            .into());
        }
        if request.fixed_rate && scales.time.iter().any(|&t| t != 1.0) {
            return Err(EngineError::Unsupported(
                "time scaling with fixed-rate conversion".into(),
            ));
        }

        let frame_len = header.window_samples(sample_rate);
        let hop = header.skip_samples(sample_rate);
        let input_len = audio.samples.len();
        let num_frames = if input_len <= frame_len {
            1
        } else {
            1 + (input_len - frame_len).div_ceil(hop)
        };

        let mut padded = audio.samples.clone();
        padded.resize((num_frames - 1) * hop + frame_len, 0.0);

        let centres: Vec<f64> = (0..num_frames)
            .map(|i| (i * hop) as f64 / sample_rate as f64 + 0.5 * header.window_size_secs)
            .collect();
        let pitch_factors = self.pitch_factors(request, &centres)?;

        let position = |i: usize| {
            if num_frames > 1 {
                i as f64 / (num_frames - 1) as f64
            } else {
                0.0
            }
        };

        // Output frame starts from the per-frame synthesis hop.
        let mut starts = Vec::with_capacity(num_frames);
        let mut cursor = 0.0f64;
        for i in 0..num_frames {
            starts.push(cursor.round() as usize);
            cursor += hop as f64 * scales.time_at(position(i)).max(0.0);
        }
        let out_len = starts.last().copied().unwrap_or(0) + frame_len;

        let window = hann_window(frame_len);
        let mut output = vec![0.0; out_len];
        let mut window_sum = vec![0.0; out_len];
        let progress_step = (num_frames / 10).max(1);

        for i in 0..num_frames {
            let p = position(i);
            let controls = FrameControls {
                pitch: scales.pitch_at(p) * pitch_factors[i],
                energy: scales.energy_at(p),
                vocal_tract: scales.vocal_tract_at(p),
            };
            let frame = &padded[i * hop..i * hop + frame_len];
            let rendered = self.render_frame(request, frame, sample_rate, controls)?;

            let start = starts[i];
            for (n, (y, w)) in rendered.iter().zip(&window).enumerate() {
                output[start + n] += y * w;
                window_sum[start + n] += w;
            }

            if request.display_progress && (i + 1) % progress_step == 0 {
                log::info!(
                    "render: {}: frame {} of {num_frames}",
                    request.input.display(),
                    i + 1
                );
            }
        }

        for (y, w) in output.iter_mut().zip(&window_sum) {
            *y = if *w > MIN_WINDOW_SUM { *y / w } else { 0.0 };
        }

        // Keep the stretch ratio but drop the zero padding.
        let in_span = padded.len() as f64;
        let expected = (input_len as f64 * out_len as f64 / in_span).round() as usize;
        output.truncate(expected.min(out_len));

        write_wav(request.output, &MonoAudio::new(output, sample_rate))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebook::{Codebook, CodebookEntry, CodebookHeader, CodebookPitchStatistics};
    use crate::mapper::{CodebookMapper, MapperParams};
    use crate::prosody::{
        PitchStatistics, PitchTransformationMethod, ProsodyParams, ScaleFactors,
        SpeakerPitchStatistics,
    };
    use std::f64::consts::PI;
    use std::path::Path;
    use tempfile::tempdir;

    const SR: u32 = 8_000;

    fn codebook(with_pitch: bool) -> Codebook {
        let mut header = CodebookHeader::new(4, SR, 0.032, 0.016);
        if with_pitch {
            let stats = |mean: f64| SpeakerPitchStatistics {
                hertz: PitchStatistics {
                    mean,
                    std_dev: 10.0,
                    range: 40.0,
                    slope: 0.0,
                    intercept: mean,
                },
                log_hertz: PitchStatistics {
                    mean: mean.ln(),
                    std_dev: 0.1,
                    range: 0.3,
                    slope: 0.0,
                    intercept: mean.ln(),
                },
            };
            header.pitch = Some(CodebookPitchStatistics {
                source: stats(120.0),
                target: stats(180.0),
            });
        }
        Codebook::new(
            header,
            vec![
                CodebookEntry::new(
                    vec![400.0, 900.0, 1_800.0, 2_600.0],
                    vec![1.0; 4],
                    vec![500.0, 1_100.0, 2_000.0, 2_900.0],
                    vec![1.0; 4],
                ),
                CodebookEntry::new(
                    vec![300.0, 1_200.0, 2_200.0, 3_100.0],
                    vec![1.0; 4],
                    vec![350.0, 1_300.0, 2_400.0, 3_300.0],
                    vec![1.0; 4],
                ),
            ],
        )
        .expect("codebook")
    }

    fn tone(path: &Path, secs: f64) -> Vec<f64> {
        let samples: Vec<f64> = (0..(secs * SR as f64) as usize)
            .map(|n| {
                let t = n as f64 / SR as f64;
                0.3 * (2.0 * PI * 220.0 * t).sin() + 0.1 * (2.0 * PI * 1_300.0 * t).sin()
            })
            .collect();
        write_wav(path, &MonoAudio::new(samples.clone(), SR)).expect("write wav");
        samples
    }

    struct Fixture<'a> {
        input: &'a Path,
        output: &'a Path,
        prosody: &'a ProsodyParams,
        mapper: Option<&'a CodebookMapper>,
        codebook: &'a Codebook,
        fixed_rate: bool,
    }

    fn request<'a>(f: &Fixture<'a>) -> ResynthesisRequest<'a> {
        ResynthesisRequest {
            input: f.input,
            pitch_file: f.input,
            output: f.output,
            vocal_tract_transformation: f.mapper.is_some(),
            fixed_rate: f.fixed_rate,
            resynthesize_from_source_codebook: false,
            match_using_target_codebook: false,
            prosody: f.prosody,
            mapper: f.mapper,
            codebook: f.codebook,
            display_progress: true,
        }
    }

    #[test]
    fn neutral_request_reproduces_input() {
        let dir = tempdir().expect("temp dir");
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let original = tone(&input, 0.5);

        let cb = codebook(false);
        let prosody = ProsodyParams::default();
        OverlapAddRenderer::default()
            .render(&request(&Fixture {
                input: &input,
                output: &output,
                prosody: &prosody,
                mapper: None,
                codebook: &cb,
                fixed_rate: false,
            }))
            .expect("render");

        let rendered = read_wav(&output).expect("read");
        assert_eq!(rendered.samples.len(), original.len());
        // Sample 0 sits under a zero window value; everything after is exact
        // up to 16-bit quantisation.
        for (a, b) in rendered.samples.iter().zip(&original).skip(1) {
            assert!((a - b).abs() < 2e-4, "{a} vs {b}");
        }
    }

    #[test]
    fn codebook_substitution_produces_finite_audio_of_same_length() {
        let dir = tempdir().expect("temp dir");
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let original = tone(&input, 0.4);

        let cb = codebook(false);
        let mapper = CodebookMapper::new(
            MapperParams {
                freq_range: 0.0,
                ..MapperParams::default()
            },
            &cb,
        )
        .expect("mapper");
        let prosody = ProsodyParams::default();
        OverlapAddRenderer::default()
            .render(&request(&Fixture {
                input: &input,
                output: &output,
                prosody: &prosody,
                mapper: Some(&mapper),
                codebook: &cb,
                fixed_rate: false,
            }))
            .expect("render");

        let rendered = read_wav(&output).expect("read");
        assert_eq!(rendered.samples.len(), original.len());
        assert!(rendered.samples.iter().all(|x| x.is_finite()));
        assert!(rendered.samples.iter().any(|x| x.abs() > 1e-3));
    }

    #[test]
    fn time_scale_stretches_output() {
        let dir = tempdir().expect("temp dir");
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let original = tone(&input, 1.0);

        let cb = codebook(false);
        let prosody = ProsodyParams {
            scales: ScaleFactors {
                time: vec![2.0],
                ..ScaleFactors::identity()
            },
            ..ProsodyParams::default()
        };
        OverlapAddRenderer::default()
            .render(&request(&Fixture {
                input: &input,
                output: &output,
                prosody: &prosody,
                mapper: None,
                codebook: &cb,
                fixed_rate: false,
            }))
            .expect("render");

        let ratio = read_wav(&output).expect("read").samples.len() as f64 / original.len() as f64;
        assert!((1.8..=2.1).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn fixed_rate_rejects_time_scaling() {
        let dir = tempdir().expect("temp dir");
        let input = dir.path().join("in.wav");
        tone(&input, 0.2);

        let cb = codebook(false);
        let prosody = ProsodyParams {
            scales: ScaleFactors {
                time: vec![1.0, 1.5],
                ..ScaleFactors::identity()
            },
            ..ProsodyParams::default()
        };
        let err = OverlapAddRenderer::default()
            .render(&request(&Fixture {
                input: &input,
                output: &dir.path().join("out.wav"),
                prosody: &prosody,
                mapper: None,
                codebook: &cb,
                fixed_rate: true,
            }))
            .unwrap_err();
        assert!(matches!(err, EngineError::Unsupported(_)));
    }

    #[test]
    fn sample_rate_mismatch_with_mapper_is_unsupported_format() {
        let dir = tempdir().expect("temp dir");
        let input = dir.path().join("in.wav");
        write_wav(&input, &MonoAudio::new(vec![0.1; 4_000], 16_000)).expect("write");

        let cb = codebook(false);
        let mapper = CodebookMapper::new(MapperParams::default(), &cb).expect("mapper");
        let prosody = ProsodyParams::default();
        let err = OverlapAddRenderer::default()
            .render(&request(&Fixture {
                input: &input,
                output: &dir.path().join("out.wav"),
                prosody: &prosody,
                mapper: Some(&mapper),
                codebook: &cb,
                fixed_rate: false,
            }))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Audio(AudioError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn pitch_transformation_needs_codebook_statistics() {
        let dir = tempdir().expect("temp dir");
        let input = dir.path().join("in.wav");
        tone(&input, 0.2);

        let cb = codebook(false);
        let prosody = ProsodyParams {
            transformation_method: PitchTransformationMethod::GlobalMean,
            ..ProsodyParams::default()
        };
        let err = OverlapAddRenderer::default()
            .render(&request(&Fixture {
                input: &input,
                output: &dir.path().join("out.wav"),
                prosody: &prosody,
                mapper: None,
                codebook: &cb,
                fixed_rate: false,
            }))
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingPitchStatistics));
    }

    #[test]
    fn pitch_transformation_reads_the_track() {
        let dir = tempdir().expect("temp dir");
        let input = dir.path().join("in.wav");
        let pitch = dir.path().join("in.ptc");
        let output = dir.path().join("out.wav");
        let original = tone(&input, 0.5);
        PitchTrack::new(0.032, 0.016, vec![120.0; 40])
            .save_to(&pitch)
            .expect("save track");

        let cb = codebook(true);
        let prosody = ProsodyParams {
            transformation_method: PitchTransformationMethod::GlobalMean,
            ..ProsodyParams::default()
        };
        let mut req = request(&Fixture {
            input: &input,
            output: &output,
            prosody: &prosody,
            mapper: None,
            codebook: &cb,
            fixed_rate: false,
        });
        req.pitch_file = &pitch;
        OverlapAddRenderer::default().render(&req).expect("render");

        let rendered = read_wav(&output).expect("read");
        assert_eq!(rendered.samples.len(), original.len());
        assert!(rendered.samples.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn missing_input_is_an_audio_error() {
        let dir = tempdir().expect("temp dir");
        let cb = codebook(false);
        let prosody = ProsodyParams::default();
        let err = OverlapAddRenderer::default()
            .render(&request(&Fixture {
                input: &dir.path().join("absent.wav"),
                output: &dir.path().join("out.wav"),
                prosody: &prosody,
                mapper: None,
                codebook: &cb,
                fixed_rate: false,
            }))
            .unwrap_err();
        assert!(matches!(err, EngineError::Audio(_)));
    }
}
