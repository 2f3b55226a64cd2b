//! Session state and per-stage status.
//!
//! [`Session`] is the single source of truth for one user's run: the story,
//! the chosen voice, the narration audio, the chosen images, the rendered
//! video, the provider keys, and the status of each stage.  Artifacts can
//! only be written through methods that uphold the ordering rules:
//!
//! * audio is stored only while a non-empty story exists;
//! * a video is stored only after an image selection was made;
//! * replacing the story drops the audio and video made from the old one,
//!   and new audio drops the video made from the old audio.
//!
//! [`SharedSession`] is a type alias for `Arc<Mutex<Session>>`, cheap to
//! clone and safe to share with a presentation layer.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::credentials::{Credentials, Provider};

use super::error::{Dependency, StageError, StageResult};
use super::upload::ImageUpload;

// ---------------------------------------------------------------------------
// Stage / StageStatus
// ---------------------------------------------------------------------------

/// The three pipeline stages, in data-flow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Story,
    Voice,
    Video,
}

impl Stage {
    /// User-facing name of what the stage produces.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Story => "Story",
            Stage::Voice => "Audio",
            Stage::Video => "Video",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Story => "story",
            Stage::Voice => "voice",
            Stage::Video => "video",
        })
    }
}

/// Status of one stage.
///
/// ```text
/// Empty ──submit──▶ Pending ──ok──▶ Ready
///                          ──err─▶ Failed ──acknowledge──▶ Empty
/// Ready / Failed ──submit──▶ Pending
/// ```
///
/// `Failed` never carries partial output: artifacts are only written on
/// success, so a failed stage still holds whatever it held before.  It only
/// adds the error message to `Empty`, which acknowledging it drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageStatus {
    #[default]
    Empty,
    Pending,
    Ready,
    Failed,
}

impl StageStatus {
    /// `true` while an external call is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, StageStatus::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::Empty => "Empty",
            StageStatus::Pending => "Working",
            StageStatus::Ready => "Ready",
            StageStatus::Failed => "Failed",
        }
    }
}

/// Status plus the last message shown for a stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageSlot {
    pub status: StageStatus,
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Selections and artifacts
// ---------------------------------------------------------------------------

/// The voice the user chose for narration.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceSelection {
    /// A catalog voice.
    Default { voice: String, model: String },
    /// A voice cloned from an uploaded sample.
    Clone {
        name: String,
        description: String,
        sample_name: String,
    },
}

impl VoiceSelection {
    pub fn is_clone(&self) -> bool {
        matches!(self, VoiceSelection::Clone { .. })
    }
}

/// Which images the video is made from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSelection {
    /// User uploads (may be empty until render time).
    Uploaded(Vec<ImageUpload>),
    /// The built-in default image.
    StaticDefault,
}

/// Narration audio, MPEG encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub bytes: Arc<[u8]>,
}

impl AudioArtifact {
    pub const MIME: &'static str = "audio/mpeg";
}

/// A rendered MP4 and the location it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoArtifact {
    pub path: PathBuf,
    pub bytes: Arc<[u8]>,
}

impl VideoArtifact {
    pub const MIME: &'static str = "video/mp4";
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Mutable state of one user's pipeline run.
#[derive(Debug, Default)]
pub struct Session {
    credentials: Credentials,
    story: Option<String>,
    voice_selection: Option<VoiceSelection>,
    audio: Option<AudioArtifact>,
    image_selection: Option<ImageSelection>,
    video: Option<VideoArtifact>,
    story_stage: StageSlot,
    voice_stage: StageSlot,
    video_stage: StageSlot,
}

impl Session {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Self::default()
        }
    }

    // ---- credentials ---

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Set or clear (`None` / empty) the key for `provider`.
    pub fn set_credential(&mut self, provider: Provider, secret: Option<&str>) {
        self.credentials.set(provider, secret);
    }

    // ---- artifacts (read) ---

    pub fn story(&self) -> Option<&str> {
        self.story.as_deref()
    }

    pub fn voice_selection(&self) -> Option<&VoiceSelection> {
        self.voice_selection.as_ref()
    }

    pub fn audio(&self) -> Option<&AudioArtifact> {
        self.audio.as_ref()
    }

    pub fn image_selection(&self) -> Option<&ImageSelection> {
        self.image_selection.as_ref()
    }

    pub fn video(&self) -> Option<&VideoArtifact> {
        self.video.as_ref()
    }

    // ---- artifacts (write) ---

    /// Store a story.  A different text drops downstream artifacts.
    pub(crate) fn store_story(&mut self, story: String) {
        if self.story.as_deref() != Some(story.as_str()) {
            if self.audio.take().is_some() {
                log::debug!("session: story changed, dropping narration audio");
                self.voice_stage = StageSlot::default();
            }
            self.drop_video();
        }
        self.story = Some(story);
    }

    /// Store narration audio and the voice it was made with; requires a
    /// non-empty story.  On error neither is changed.
    pub(crate) fn store_audio(
        &mut self,
        selection: VoiceSelection,
        audio: AudioArtifact,
    ) -> StageResult<()> {
        crate::guard::require_non_empty_story(self.story())?;
        self.voice_selection = Some(selection);
        self.audio = Some(audio);
        self.drop_video();
        Ok(())
    }

    pub(crate) fn select_images(&mut self, selection: ImageSelection) {
        self.image_selection = Some(selection);
    }

    /// Store a rendered video; requires an image selection.
    pub(crate) fn store_video(&mut self, video: VideoArtifact) -> StageResult<()> {
        if self.image_selection.is_none() {
            return Err(StageError::MissingDependency(Dependency::Images));
        }
        self.video = Some(video);
        Ok(())
    }

    fn drop_video(&mut self) {
        if self.video.take().is_some() {
            log::debug!("session: dropping video made from old inputs");
            self.video_stage = StageSlot::default();
        }
    }

    // ---- stage status ---

    pub fn stage(&self, stage: Stage) -> &StageSlot {
        match stage {
            Stage::Story => &self.story_stage,
            Stage::Voice => &self.voice_stage,
            Stage::Video => &self.video_stage,
        }
    }

    fn stage_mut(&mut self, stage: Stage) -> &mut StageSlot {
        match stage {
            Stage::Story => &mut self.story_stage,
            Stage::Voice => &mut self.voice_stage,
            Stage::Video => &mut self.video_stage,
        }
    }

    pub(crate) fn begin(&mut self, stage: Stage) {
        let slot = self.stage_mut(stage);
        slot.status = StageStatus::Pending;
        slot.message = None;
    }

    pub(crate) fn complete(&mut self, stage: Stage) {
        let slot = self.stage_mut(stage);
        slot.status = StageStatus::Ready;
        slot.message = None;
    }

    pub(crate) fn fail(&mut self, stage: Stage, error: &StageError) {
        let slot = self.stage_mut(stage);
        slot.status = StageStatus::Failed;
        slot.message = Some(error.to_string());
    }

    /// Clear a failure once it was shown; other states are left alone.
    pub fn acknowledge(&mut self, stage: Stage) {
        let slot = self.stage_mut(stage);
        if slot.status == StageStatus::Failed {
            *slot = StageSlot::default();
        }
    }
}

// ---------------------------------------------------------------------------
// SharedSession
// ---------------------------------------------------------------------------

/// Thread-safe handle to a [`Session`].
///
/// Lock for short critical sections only; never hold the guard across an
/// `.await`.
pub type SharedSession = Arc<Mutex<Session>>;

/// Construct a new [`SharedSession`] holding `credentials`.
pub fn new_shared_session(credentials: Credentials) -> SharedSession {
    Arc::new(Mutex::new(Session::new(credentials)))
}

/// Lock `session`, recovering the data if a previous holder panicked.
pub fn lock_session(session: &SharedSession) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
