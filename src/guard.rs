//! Stage preconditions.
//!
//! Each guard either passes the checked value through or returns the
//! [`StageError`] the user should see.  Guards have no side effects and never
//! panic; an absent credential is an ordinary outcome, not a fault.

use std::path::Path;

use crate::audio::DurationProbe;
use crate::credentials::{Credential, Provider};
use crate::pipeline::StageError;

/// Longest voice sample accepted for cloning, in seconds.
pub const MAX_SAMPLE_SECS: f64 = 120.0;

/// Require the key for `provider` to be present.
pub fn require_credential(
    credential: Option<&Credential>,
    provider: Provider,
) -> Result<&Credential, StageError> {
    credential.ok_or(StageError::MissingCredential(provider))
}

/// Require a story with at least one non-whitespace character.
pub fn require_non_empty_story(story: Option<&str>) -> Result<&str, StageError> {
    match story {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(StageError::EmptyStory),
    }
}

/// Require the audio at `asset` to last at most `max_secs`.
///
/// Fails closed: when `probe` cannot determine the duration the asset is
/// rejected with [`StageError::AudioDurationUnknown`].  Returns the measured
/// duration on success.
pub fn require_audio_duration_within(
    asset: &Path,
    probe: &dyn DurationProbe,
    max_secs: f64,
) -> Result<f64, StageError> {
    let secs = probe
        .duration_secs(asset)
        .filter(|s| s.is_finite() && *s >= 0.0)
        .ok_or(StageError::AudioDurationUnknown)?;
    if secs > max_secs {
        return Err(StageError::AudioTooLong {
            max_secs,
            actual_secs: secs,
        });
    }
    Ok(secs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
