//! Pitch statistics of voiced frames.

use serde::{Deserialize, Serialize};

use crate::features::PitchTrack;

use super::params::PitchStatisticsType;

/// Summary of a pitch distribution in one domain (Hz or log-Hz).
///
/// `slope` and `intercept` describe the least-squares line of the voiced
/// values over frame time in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PitchStatistics {
    pub mean: f64,
    pub std_dev: f64,
    pub range: f64,
    pub slope: f64,
    pub intercept: f64,
}

impl PitchStatistics {
    /// Statistics of `(time, value)` points; `None` when there are none.
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let n = points.len() as f64;
        let mean = points.iter().map(|&(_, v)| v).sum::<f64>() / n;
        let variance = points.iter().map(|&(_, v)| (v - mean).powi(2)).sum::<f64>() / n;

        let (min, max) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| {
                (lo.min(v), hi.max(v))
            });

        let t_mean = points.iter().map(|&(t, _)| t).sum::<f64>() / n;
        let sxx: f64 = points.iter().map(|&(t, _)| (t - t_mean).powi(2)).sum();
        let sxy: f64 = points
            .iter()
            .map(|&(t, v)| (t - t_mean) * (v - mean))
            .sum();

        let (slope, intercept) = if sxx > f64::EPSILON {
            let slope = sxy / sxx;
            (slope, mean - slope * t_mean)
        } else {
            (0.0, mean)
        };

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            range: max - min,
            slope,
            intercept,
        })
    }

    /// Statistics of one track's voiced frames in the given domain.
    pub fn from_track(track: &PitchTrack, kind: PitchStatisticsType) -> Option<Self> {
        Self::from_points(&domain_points(track, kind))
    }
}

/// `(frame time, value)` for every voiced frame, with the value in `kind`'s
/// domain.
pub fn domain_points(track: &PitchTrack, kind: PitchStatisticsType) -> Vec<(f64, f64)> {
    track
        .voiced()
        .map(|(i, f0)| (track.frame_time(i), to_domain(f0, kind)))
        .collect()
}

pub fn to_domain(f0: f64, kind: PitchStatisticsType) -> f64 {
    match kind {
        PitchStatisticsType::Hertz => f0,
        PitchStatisticsType::LogHertz => f0.ln(),
    }
}

pub fn from_domain(value: f64, kind: PitchStatisticsType) -> f64 {
    match kind {
        PitchStatisticsType::Hertz => value,
        PitchStatisticsType::LogHertz => value.exp(),
    }
}

// ---------------------------------------------------------------------------
// SpeakerPitchStatistics
// ---------------------------------------------------------------------------

/// One speaker's global statistics in both domains.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeakerPitchStatistics {
    pub hertz: PitchStatistics,
    pub log_hertz: PitchStatistics,
}

impl SpeakerPitchStatistics {
    /// Pool the voiced frames of several tracks.
    pub fn from_tracks(tracks: &[PitchTrack]) -> Option<Self> {
        let pooled = |kind| -> Vec<(f64, f64)> {
            tracks.iter().flat_map(|t| domain_points(t, kind)).collect()
        };
        Some(Self {
            hertz: PitchStatistics::from_points(&pooled(PitchStatisticsType::Hertz))?,
            log_hertz: PitchStatistics::from_points(&pooled(PitchStatisticsType::LogHertz))?,
        })
    }

    pub fn select(&self, kind: PitchStatisticsType) -> &PitchStatistics {
        match kind {
            PitchStatisticsType::Hertz => &self.hertz,
            PitchStatisticsType::LogHertz => &self.log_hertz,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
