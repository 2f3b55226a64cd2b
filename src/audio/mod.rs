//! Audio asset handling for uploaded voice samples.
//!
//! This module provides:
//! * [`DurationProbe`] — reads the playing time of an audio file, with
//!   [`WavHeaderProbe`], [`FfprobeProbe`] and the combined [`MediaProbe`].
//! * [`VoiceSampleAsset`] — scoped temporary file for one clone attempt.

pub mod probe;
pub mod sample;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use probe::{wav_duration_secs, DurationProbe, FfprobeProbe, MediaProbe, WavHeaderProbe};
pub use sample::VoiceSampleAsset;
