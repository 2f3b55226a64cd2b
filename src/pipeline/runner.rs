//! Pipeline orchestrator — sequences the story, voice and video stages.
//!
//! [`PipelineOrchestrator`] owns the three stage controllers, the shared
//! [`InvocationCache`] and the [`SharedSession`].  Every submission runs the
//! same envelope:
//!
//! ```text
//! submit_*()
//!   └─▶ stage = Pending
//!         └─▶ controller.run()
//!               ├─ Ok  → stage = Ready
//!               └─ Err → stage = Failed, message recorded + logged
//! ```
//!
//! A failed stage never aborts the session: other stages stay usable and
//! the same stage can be submitted again.  [`PipelineOrchestrator::acknowledge`]
//! returns a failed stage to `Empty`.

use std::future::Future;
use std::sync::Arc;

use crate::audio::{DurationProbe, MediaProbe};
use crate::cache::InvocationCache;
use crate::config::AppConfig;
use crate::credentials::Provider;
use crate::generators::{
    FfmpegVideoGenerator, HttpProviders, ProviderFactory, VideoGenerator, VideoGeneratorOptions,
};

use super::error::StageResult;
use super::state::{
    lock_session, AudioArtifact, ImageSelection, SharedSession, Stage, VideoArtifact,
};
use super::story::{StoryController, StoryRequest};
use super::video::VideoController;
use super::voice::{VoiceController, VoiceRequest};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// External collaborators shared by the stage controllers.
#[derive(Clone)]
pub struct Collaborators {
    pub cache: Arc<InvocationCache>,
    pub providers: Arc<dyn ProviderFactory>,
    pub video: Arc<dyn VideoGenerator>,
    pub probe: Arc<dyn DurationProbe>,
}

impl Collaborators {
    /// The HTTP providers, `ffmpeg` renderer and media probe described by
    /// `config`, with a fresh cache.
    pub fn from_config(config: &AppConfig, options: VideoGeneratorOptions) -> Self {
        Self {
            cache: Arc::new(InvocationCache::new()),
            providers: Arc::new(HttpProviders::new(config)),
            video: Arc::new(FfmpegVideoGenerator::new(
                &config.video,
                config.video.resolved_output_dir(),
                options,
            )),
            probe: Arc::new(MediaProbe::new(config.video.ffprobe_program.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Drives the story → voice → video pipeline for one session.
///
/// ```rust,no_run
/// use voiceup::config::AppConfig;
/// use voiceup::credentials::Credentials;
/// use voiceup::generators::VideoGeneratorOptions;
/// use voiceup::pipeline::{
///     new_shared_session, Collaborators, ImageSelection, PipelineOrchestrator, StoryPrompt,
///     StoryRequest, VoiceRequest,
/// };
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let session = new_shared_session(Credentials::from_env());
/// let collaborators = Collaborators::from_config(&config, VideoGeneratorOptions::default());
/// let pipeline = PipelineOrchestrator::new(&config, session, collaborators);
///
/// pipeline.submit_story(StoryRequest::Generate(StoryPrompt::default())).await.ok();
/// let voice = pipeline.available_voices().await.remove(0);
/// pipeline.submit_voice(VoiceRequest::catalog(voice, &config.voice)).await.ok();
/// pipeline.submit_video(ImageSelection::StaticDefault).await.ok();
/// # }
/// ```
pub struct PipelineOrchestrator {
    session: SharedSession,
    cache: Arc<InvocationCache>,
    story: StoryController,
    voice: VoiceController,
    video: VideoController,
}

impl PipelineOrchestrator {
    pub fn new(config: &AppConfig, session: SharedSession, collaborators: Collaborators) -> Self {
        let Collaborators {
            cache,
            providers,
            video,
            probe,
        } = collaborators;
        Self {
            session,
            story: StoryController::new(Arc::clone(&cache), Arc::clone(&providers)),
            voice: VoiceController::new(config.voice.clone(), Arc::clone(&cache), providers, probe),
            video: VideoController::new(config.video.clone(), video),
            cache,
        }
    }

    /// Replace the voice controller, e.g. to move voice samples elsewhere.
    pub fn with_voice_controller(mut self, voice: VoiceController) -> Self {
        self.voice = voice;
        self
    }

    /// The session this orchestrator drives (also read by a presentation layer).
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn cache(&self) -> &InvocationCache {
        &self.cache
    }

    /// Set or clear the key for `provider`.
    pub fn set_credential(&self, provider: Provider, secret: Option<&str>) {
        lock_session(&self.session).set_credential(provider, secret);
        log::debug!("pipeline: {provider} key {}", if secret.is_some() { "updated" } else { "cleared" });
    }

    /// Return a failed stage to `Empty` once its message was shown.
    pub fn acknowledge(&self, stage: Stage) {
        lock_session(&self.session).acknowledge(stage);
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    pub async fn submit_story(&self, request: StoryRequest) -> StageResult<String> {
        self.run_stage(Stage::Story, self.story.run(&self.session, request))
            .await
    }

    /// Voice names to offer; never fails.
    pub async fn available_voices(&self) -> Vec<String> {
        self.voice.available_voices(&self.session).await
    }

    pub async fn submit_voice(&self, request: VoiceRequest) -> StageResult<AudioArtifact> {
        self.run_stage(Stage::Voice, self.voice.run(&self.session, request))
            .await
    }

    pub async fn submit_video(&self, selection: ImageSelection) -> StageResult<VideoArtifact> {
        self.run_stage(Stage::Video, self.video.run(&self.session, selection))
            .await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn run_stage<T, F>(&self, stage: Stage, work: F) -> StageResult<T>
    where
        F: Future<Output = StageResult<T>>,
    {
        lock_session(&self.session).begin(stage);
        log::debug!("pipeline: {stage} → Pending");

        let result = work.await;

        let mut session = lock_session(&self.session);
        match &result {
            Ok(_) => {
                session.complete(stage);
                log::info!("pipeline: {stage} ready");
            }
            Err(e) => {
                session.fail(stage, e);
                log::error!("pipeline: {stage} failed: {e}");
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
