//! Stage-local error taxonomy.
//!
//! Every [`StageError`] is recoverable: the orchestrator records it against
//! the stage that produced it and the user may simply submit again.  The
//! `Display` text is the message shown to the user, so variants never embed
//! provider-internal detail; that goes to the log instead.

use thiserror::Error;

use crate::credentials::Provider;
use crate::generators::GeneratorError;

use super::state::Stage;

/// Upstream state a stage can be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// Narration audio (required for video when a custom voice was chosen).
    Audio,
    /// At least one usable uploaded image.
    Images,
}

impl Dependency {
    fn hint(&self) -> &'static str {
        match self {
            Dependency::Audio => "Generate the custom voice audio before creating the video.",
            Dependency::Images => {
                "Upload at least one PNG or JPEG image, or use the static default image."
            }
        }
    }
}

/// Recoverable failures reported at a stage boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    /// The provider key needed by this stage has not been entered.
    #[error("Please enter your {} API key to {}.", .0.label(), .0.action())]
    MissingCredential(Provider),

    /// The story is empty or whitespace-only.
    #[error("Make sure you enter your story first.")]
    EmptyStory,

    /// The uploaded voice sample is longer than allowed.
    #[error(
        "Uploaded audio is too long ({actual_secs:.0}s). Please upload an audio of maximum {max_secs:.0} seconds."
    )]
    AudioTooLong { max_secs: f64, actual_secs: f64 },

    /// The length of the uploaded voice sample could not be read.
    #[error("Could not read the length of the uploaded audio. Please upload an MP3 or WAV file.")]
    AudioDurationUnknown,

    /// Creating the custom voice or its narration failed.
    #[error("Cloning went wrong. Please try again.")]
    CloneFailed,

    /// The video could not be rendered or read back.
    #[error("Video generation went wrong. Please try again.")]
    RenderFailed,

    /// The uploaded text file is not valid UTF-8.
    #[error("Error reading the file: {0}")]
    DecodeFailed(String),

    /// An external generator failed for a reason the user cannot fix.
    #[error("{} generation went wrong. Please try again.", .0.label())]
    GenerationFailed(Stage),

    /// A prerequisite produced by an earlier stage is absent.
    #[error("{}", .0.hint())]
    MissingDependency(Dependency),
}

/// Convenience alias used by the stage controllers.
pub type StageResult<T> = Result<T, StageError>;

impl StageError {
    /// Convert a collaborator failure into a stage error.
    ///
    /// A rejected key becomes [`StageError::MissingCredential`] so the user is
    /// prompted for it; anything else is logged with full detail and surfaced
    /// as the generic [`StageError::GenerationFailed`].
    pub fn from_generator(stage: Stage, provider: Provider, err: GeneratorError) -> Self {
        if err.is_unauthorized() {
            log::warn!("{stage}: {provider} rejected the API key: {err}");
            return StageError::MissingCredential(provider);
        }
        log::error!("{stage}: generator failed: {err}");
        StageError::GenerationFailed(stage)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_provider() {
        let msg = StageError::MissingCredential(Provider::Story).to_string();
        assert_eq!(msg, "Please enter your OpenAI API key to generate a story.");

        let msg = StageError::MissingCredential(Provider::Voice).to_string();
        assert!(msg.contains("ElevenLabs"));
    }

    #[test]
    fn audio_too_long_reports_both_durations() {
        let msg = StageError::AudioTooLong {
            max_secs: 120.0,
            actual_secs: 150.2,
        }
        .to_string();
        assert!(msg.contains("150s"));
        assert!(msg.contains("120 seconds"));
    }

    #[test]
    fn generic_failure_does_not_leak_detail() {
        let err = StageError::from_generator(
            Stage::Story,
            Provider::Story,
            GeneratorError::Status {
                status: 500,
                body: "internal provider trace".into(),
            },
        );
        assert_eq!(err, StageError::GenerationFailed(Stage::Story));
        assert!(!err.to_string().contains("trace"));
    }

    #[test]
    fn unauthorized_maps_to_missing_credential() {
        let err = StageError::from_generator(
            Stage::Voice,
            Provider::Voice,
            GeneratorError::Unauthorized(401),
        );
        assert_eq!(err, StageError::MissingCredential(Provider::Voice));
    }

    #[test]
    fn missing_dependency_messages() {
        let audio = StageError::MissingDependency(Dependency::Audio).to_string();
        assert!(audio.contains("custom voice"));
        let images = StageError::MissingDependency(Dependency::Images).to_string();
        assert!(images.contains("image"));
    }
}
