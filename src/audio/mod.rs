//! Audio file I/O and sample-block utilities.
//!
//! # Pipeline
//!
//! ```text
//! WAV file → read_wav → downmix → MonoAudio (f64, [-1, 1])
//!                                   │
//!          renderer frames ◀────────┘──▶ resample_by / fit_cyclic (pitch scaling)
//!                                   │
//! WAV file ◀── write_wav (16-bit mono)
//! ```

pub mod resample;
pub mod wav;

pub use resample::{downmix, fit_cyclic, resample_by};
pub use wav::{read_wav, write_wav, AudioError, MonoAudio};
