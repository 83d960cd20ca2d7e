//! Weighted-codebook voice conversion.
//!
//! A codebook of paired source/target spectral envelopes (line spectral
//! frequencies) is learned from parallel recordings.  Converting a recording
//! replaces each frame's envelope with a weighted blend of the target
//! envelopes whose source side matches it best, and optionally reshapes the
//! pitch contour, duration and energy.

pub mod adaptation;
pub mod audio;
pub mod codebook;
pub mod config;
pub mod engine;
pub mod features;
pub mod mapper;
pub mod pipeline;
pub mod prosody;
