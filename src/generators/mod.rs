//! External generator collaborators.
//!
//! This module provides:
//! * [`StoryGenerator`] — prompt → story text ([`OpenAiStoryGenerator`]).
//! * [`VoiceGenerator`] — voice catalog, synthesis and cloning
//!   ([`ElevenLabsVoiceGenerator`]).
//! * [`VideoGenerator`] — image(s) + optional narration → MP4
//!   ([`FfmpegVideoGenerator`]).
//! * [`ProviderFactory`] — builds the credentialed generators
//!   ([`HttpProviders`]).
//! * [`GeneratorError`] — error variants shared by all collaborators.
//!
//! The pipeline only ever talks to the traits, so any of these can be swapped
//! for another backend (or a test double).

pub mod factory;
pub mod process;
pub mod story;
pub mod video;
pub mod voice;

#[cfg(test)]
pub mod mock;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use factory::{HttpProviders, ProviderFactory};
pub use story::{OpenAiStoryGenerator, StoryGenerator};
pub use video::{FfmpegVideoGenerator, FrameSource, RenderJob, VideoGenerator, VideoGeneratorOptions};
pub use voice::{ElevenLabsVoiceGenerator, VoiceGenerator};

// ---------------------------------------------------------------------------
// GeneratorError
// ---------------------------------------------------------------------------

/// Errors raised by external generators.
///
/// These carry full provider detail and are meant for logs; the pipeline
/// converts them into user-facing stage errors.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The provider rejected the API key (HTTP 401 / 403).
    #[error("provider rejected the credential (HTTP {0})")]
    Unauthorized(u16),

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the client timeout.
    #[error("request timed out")]
    Timeout,

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be parsed as expected.
    #[error("failed to parse provider response: {0}")]
    Parse(String),

    /// The provider returned no usable content.
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// Local file handling failed.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// An external program could not be run or exited unsuccessfully.
    #[error("command `{command}` failed: {detail}")]
    Command { command: String, detail: String },

    /// Internal inconsistency (e.g. a background task panicked).
    #[error("internal error: {0}")]
    Internal(String),
}

impl GeneratorError {
    /// `true` when the provider refused the credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GeneratorError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for GeneratorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GeneratorError::Timeout
        } else {
            GeneratorError::Request(e.to_string())
        }
    }
}

/// Maximum number of response-body bytes kept in [`GeneratorError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Turn a non-success HTTP response into a [`GeneratorError`].
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, GeneratorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(GeneratorError::Unauthorized(status.as_u16()));
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(GeneratorError::Status {
        status: status.as_u16(),
        body,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
