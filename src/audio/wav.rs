//! WAV file loading and writing.
//!
//! Everything downstream works on a mono `f64` view of the file in the range
//! `[-1.0, 1.0]`.  Integer PCM of 8, 16, 24 or 32 bits and 32-bit float are
//! accepted; any other layout is reported as [`AudioError::UnsupportedFormat`].
//! Output is always written as 16-bit mono PCM.

use std::path::Path;

use thiserror::Error;

use super::resample::downmix;

// ---------------------------------------------------------------------------
// AudioError
// ---------------------------------------------------------------------------

/// Errors raised while reading or writing audio files.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The file could not be opened, read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a WAV file this crate can decode.
    #[error("Unsupported audio format in {path}: {reason}")]
    UnsupportedFormat { path: String, reason: String },
}

impl AudioError {
    fn from_hound(path: &Path, err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => AudioError::Io(e),
            other => AudioError::UnsupportedFormat {
                path: path.display().to_string(),
                reason: other.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// MonoAudio
// ---------------------------------------------------------------------------

/// A decoded, downmixed waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct MonoAudio {
    /// Samples in `[-1.0, 1.0]`.
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl MonoAudio {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

// ---------------------------------------------------------------------------
// read / write
// ---------------------------------------------------------------------------

/// Load a WAV file as mono `f64`.
///
/// # Errors
///
/// - [`AudioError::Io`] when the file cannot be read.
/// - [`AudioError::UnsupportedFormat`] for malformed headers, unsupported bit
///   depths or sample formats.
pub fn read_wav(path: &Path) -> Result<MonoAudio, AudioError> {
    let mut reader = hound::WavReader::open(path).map_err(|e| AudioError::from_hound(path, e))?;
    let spec = reader.spec();

    let interleaved: Vec<f64> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => {
            let full_scale = (1u64 << (bits - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::from_hound(path, e))?
        }
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::from_hound(path, e))?,
        (format, bits) => {
            return Err(AudioError::UnsupportedFormat {
                path: path.display().to_string(),
                reason: format!("{format:?} samples with {bits} bits"),
            });
        }
    };

    Ok(MonoAudio::new(
        downmix(&interleaved, spec.channels),
        spec.sample_rate,
    ))
}

/// Write `audio` as 16-bit mono PCM, clipping to `[-1.0, 1.0]`.
pub fn write_wav(path: &Path, audio: &MonoAudio) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| AudioError::from_hound(path, e))?;

    for &sample in &audio.samples {
        let clipped = if sample.is_finite() {
            sample.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        writer
            .write_sample((clipped * i16::MAX as f64).round() as i16)
            .map_err(|e| AudioError::from_hound(path, e))?;
    }

    writer
        .finalize()
        .map_err(|e| AudioError::from_hound(path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
