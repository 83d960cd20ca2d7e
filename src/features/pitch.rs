//! Pitch tracks: file format and a simple autocorrelation F0 estimator.
//!
//! A pitch track holds one F0 value per analysis frame (Hz, `0.0` for
//! unvoiced frames).  On disk (`.ptc`, little-endian):
//!
//! ```text
//! magic "PTCH" | window_size_secs f64 | skip_size_secs f64 | count u32 | count × f64
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::audio::MonoAudio;
use crate::codebook::MAX_FRAME_SECS;

use super::FeatureError;

const PITCH_MAGIC: &[u8; 4] = b"PTCH";
/// Values read per step; a track grows only as far as its data goes.
const READ_CHUNK: usize = 4_096;

// ---------------------------------------------------------------------------
// PitchTrack
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PitchTrack {
    pub window_size_secs: f64,
    pub skip_size_secs: f64,
    /// F0 per frame in Hz; `0.0` marks an unvoiced frame.
    pub values: Vec<f64>,
}

impl PitchTrack {
    pub fn new(window_size_secs: f64, skip_size_secs: f64, values: Vec<f64>) -> Self {
        Self {
            window_size_secs,
            skip_size_secs,
            values,
        }
    }

    /// A fully unvoiced track with `frames` entries.
    pub fn unvoiced(window_size_secs: f64, skip_size_secs: f64, frames: usize) -> Self {
        Self::new(window_size_secs, skip_size_secs, vec![0.0; frames])
    }

    /// `(frame index, f0)` for every voiced frame.
    pub fn voiced(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, f0)| f0 > 0.0)
    }

    /// Centre time of frame `index` in seconds.
    pub fn frame_time(&self, index: usize) -> f64 {
        0.5 * self.window_size_secs + index as f64 * self.skip_size_secs
    }

    /// Index of the frame whose centre is closest to `time_secs`.
    pub fn frame_at(&self, time_secs: f64) -> Option<usize> {
        if self.values.is_empty() || self.skip_size_secs <= 0.0 {
            return None;
        }
        let pos = ((time_secs - 0.5 * self.window_size_secs) / self.skip_size_secs).round();
        Some((pos.max(0.0) as usize).min(self.values.len() - 1))
    }

    /// Load a `.ptc` file.
    pub fn load_from(path: &Path) -> Result<Self, FeatureError> {
        let mut reader = BufReader::new(File::open(path)?);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != PITCH_MAGIC {
            return Err(FeatureError::InvalidPitchTrack(format!(
                "{}: bad magic",
                path.display()
            )));
        }

        let window_size_secs = reader.read_f64::<LittleEndian>()?;
        let skip_size_secs = reader.read_f64::<LittleEndian>()?;
        let in_range = |secs: f64| secs > 0.0 && secs <= MAX_FRAME_SECS;
        if !(in_range(window_size_secs) && in_range(skip_size_secs)) {
            return Err(FeatureError::InvalidPitchTrack(format!(
                "{}: window or skip size outside (0, {MAX_FRAME_SECS}] s",
                path.display()
            )));
        }

        let count = reader.read_u32::<LittleEndian>()? as usize;
        let mut values = Vec::new();
        while values.len() < count {
            let start = values.len();
            values.resize(start + (count - start).min(READ_CHUNK), 0.0);
            reader.read_f64_into::<LittleEndian>(&mut values[start..])?;
        }

        Ok(Self::new(window_size_secs, skip_size_secs, values))
    }

    /// Write a `.ptc` file.
    pub fn save_to(&self, path: &Path) -> Result<(), FeatureError> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(PITCH_MAGIC)?;
        writer.write_f64::<LittleEndian>(self.window_size_secs)?;
        writer.write_f64::<LittleEndian>(self.skip_size_secs)?;
        writer.write_u32::<LittleEndian>(self.values.len() as u32)?;
        for &v in &self.values {
            writer.write_f64::<LittleEndian>(v)?;
        }
        writer.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Autocorrelation estimator
// ---------------------------------------------------------------------------

/// Settings for [`estimate_pitch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchSearch {
    pub min_f0: f64,
    pub max_f0: f64,
    /// Minimum normalised autocorrelation peak for a frame to count as voiced.
    pub voicing_threshold: f64,
}

impl Default for PitchSearch {
    fn default() -> Self {
        Self {
            min_f0: 60.0,
            max_f0: 500.0,
            voicing_threshold: 0.5,
        }
    }
}

/// Estimate an F0 track with normalised autocorrelation.
///
/// Frames are `window_size_secs` long and start every `skip_size_secs`.  The
/// analysis window is widened to two periods of `min_f0` when it is shorter.
pub fn estimate_pitch(
    audio: &MonoAudio,
    window_size_secs: f64,
    skip_size_secs: f64,
    search: &PitchSearch,
) -> PitchTrack {
    let fs = audio.sample_rate as f64;
    let skip = ((skip_size_secs * fs).round() as usize).max(1);
    let min_lag = ((fs / search.max_f0).floor() as usize).max(1);
    let max_lag = (fs / search.min_f0).ceil() as usize;
    let window = ((window_size_secs * fs).round() as usize).max(2 * max_lag);

    let samples = &audio.samples;
    let frames = samples.len().div_ceil(skip);
    let mut values = Vec::with_capacity(frames);

    for i in 0..frames {
        let start = i * skip;
        let mut frame: Vec<f64> = samples[start..samples.len().min(start + window)].to_vec();
        frame.resize(window, 0.0);
        values.push(frame_f0(&frame, fs, min_lag, max_lag, search.voicing_threshold));
    }

    PitchTrack::new(window_size_secs, skip_size_secs, values)
}

fn frame_f0(frame: &[f64], fs: f64, min_lag: usize, max_lag: usize, threshold: f64) -> f64 {
    let energy: f64 = frame.iter().map(|x| x * x).sum();
    if energy < 1e-8 * frame.len() as f64 {
        return 0.0;
    }

    let mut best_lag = 0;
    let mut best_score = threshold;

    for lag in min_lag..=max_lag.min(frame.len() - 1) {
        let head = &frame[..frame.len() - lag];
        let tail = &frame[lag..];
        let cross: f64 = head.iter().zip(tail).map(|(a, b)| a * b).sum();
        let e_head: f64 = head.iter().map(|x| x * x).sum();
        let e_tail: f64 = tail.iter().map(|x| x * x).sum();
        let denom = (e_head * e_tail).sqrt();
        if denom <= f64::EPSILON {
            continue;
        }
        let score = cross / denom;
        // Multiples of the period score the same; keep the shortest lag.
        if score > best_score + 1e-9 {
            best_score = score;
            best_lag = lag;
        }
    }

    if best_lag == 0 {
        0.0
    } else {
        fs / best_lag as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
