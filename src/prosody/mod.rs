//! Prosody: scale factors, pitch statistics and pitch-contour transformation.
//!
//! This module provides:
//! * [`ProsodyParams`] / [`ScaleFactors`]: what the prosody pass changes.
//! * [`PitchStatistics`] / [`SpeakerPitchStatistics`]: mean, standard
//!   deviation, range, slope and intercept of voiced F0, in Hz or log-Hz.
//! * [`transform_contour`]: imposes target statistics on a pitch track.

pub mod params;
pub mod statistics;
pub mod transform;

pub use params::{
    Adjustment, PitchStatisticsType, PitchTransformationMethod, ProsodyParams, ScaleFactors,
    StatisticsScope,
};
pub use statistics::{PitchStatistics, SpeakerPitchStatistics};
pub use transform::{transform_contour, MIN_F0_HZ};
