//! Voice stage: narrate the story with a catalog voice or a cloned one.
//!
//! ```text
//! Default ─▶ guard story + key ─▶ cache.synthesize(story, voice, model)
//! Clone   ─▶ guard story + key ─▶ write sample ─▶ probe ≤ max ─▶ clone_synthesize
//!                                      └──────── release sample (always) ◀──┘
//! ```
//!
//! Catalog synthesis is memoized; cloning creates a provider-side voice and
//! is therefore executed on every submission.

use std::path::PathBuf;
use std::sync::Arc;

use crate::audio::{DurationProbe, VoiceSampleAsset};
use crate::cache::InvocationCache;
use crate::config::VoiceConfig;
use crate::credentials::Provider;
use crate::generators::{ProviderFactory, VoiceGenerator};
use crate::guard::{require_audio_duration_within, require_credential, require_non_empty_story};

use super::error::{StageError, StageResult};
use super::state::{lock_session, AudioArtifact, SharedSession, Stage, VoiceSelection};
use super::upload::AudioUpload;

/// The two ways of narrating the story.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceRequest {
    /// A voice from the provider catalog.
    Default { voice: String, model: String },
    /// A new voice cloned from an uploaded sample.
    Clone {
        name: String,
        description: String,
        sample: AudioUpload,
    },
}

impl VoiceRequest {
    /// A catalog voice with the configured synthesis model.
    pub fn catalog(voice: impl Into<String>, config: &VoiceConfig) -> Self {
        VoiceRequest::Default {
            voice: voice.into(),
            model: config.model.clone(),
        }
    }

    fn selection(&self) -> VoiceSelection {
        match self {
            VoiceRequest::Default { voice, model } => VoiceSelection::Default {
                voice: voice.clone(),
                model: model.clone(),
            },
            VoiceRequest::Clone {
                name,
                description,
                sample,
            } => VoiceSelection::Clone {
                name: name.clone(),
                description: description.clone(),
                sample_name: sample.file_name.clone(),
            },
        }
    }
}

pub struct VoiceController {
    config: VoiceConfig,
    cache: Arc<InvocationCache>,
    providers: Arc<dyn ProviderFactory>,
    probe: Arc<dyn DurationProbe>,
    sample_dir: PathBuf,
}

impl VoiceController {
    pub fn new(
        config: VoiceConfig,
        cache: Arc<InvocationCache>,
        providers: Arc<dyn ProviderFactory>,
        probe: Arc<dyn DurationProbe>,
    ) -> Self {
        Self {
            config,
            cache,
            providers,
            probe,
            sample_dir: std::env::temp_dir(),
        }
    }

    /// Write temporary voice samples into `dir` instead of the system temp dir.
    pub fn with_sample_dir(mut self, dir: PathBuf) -> Self {
        self.sample_dir = dir;
        self
    }

    /// Voice names to offer.  Falls back to the configured list when there
    /// is no key, the catalog call fails, or the catalog is empty.
    pub async fn available_voices(&self, session: &SharedSession) -> Vec<String> {
        let credential = lock_session(session).credentials().voice.clone();
        let Some(key) = credential else {
            log::debug!("voice: no key, offering fallback voices");
            return self.config.fallback_voices.clone();
        };

        let generator = self.providers.voice_generator(&key);
        match self.cache.voices(generator.as_ref()).await {
            Ok(voices) if !voices.is_empty() => voices,
            Ok(_) => {
                log::warn!("voice: provider catalog is empty, offering fallback voices");
                self.config.fallback_voices.clone()
            }
            Err(e) => {
                log::warn!("voice: catalog unavailable ({e}), offering fallback voices");
                self.config.fallback_voices.clone()
            }
        }
    }

    /// Narrate the session's story and store the audio.
    pub async fn run(
        &self,
        session: &SharedSession,
        request: VoiceRequest,
    ) -> StageResult<AudioArtifact> {
        let (story, credential) = {
            let s = lock_session(session);
            (s.story().map(str::to_owned), s.credentials().voice.clone())
        };
        let story = require_non_empty_story(story.as_deref())?;
        let key = require_credential(credential.as_ref(), Provider::Voice)?;

        let generator = self.providers.voice_generator(key);

        let bytes = match &request {
            VoiceRequest::Default { voice, model } => {
                log::debug!("voice: synthesizing with {voice:?} / {model:?}");
                self.cache
                    .synthesize(generator.as_ref(), story, voice, model)
                    .await
                    .map_err(|e| StageError::from_generator(Stage::Voice, Provider::Voice, e))?
            }
            VoiceRequest::Clone {
                name,
                description,
                sample,
            } => {
                self.clone_voice(generator.as_ref(), story, name, description, sample)
                    .await?
            }
        };

        let artifact = AudioArtifact { bytes };
        lock_session(session).store_audio(request.selection(), artifact.clone())?;
        Ok(artifact)
    }

    async fn clone_voice(
        &self,
        generator: &dyn VoiceGenerator,
        story: &str,
        name: &str,
        description: &str,
        sample: &AudioUpload,
    ) -> StageResult<Arc<[u8]>> {
        let asset = VoiceSampleAsset::write_in(&self.sample_dir, &sample.bytes, sample.suffix())
            .map_err(|e| {
                log::error!("voice: could not write sample {:?}: {e}", sample.file_name);
                StageError::CloneFailed
            })?;

        let result = self
            .clone_from_asset(generator, story, name, description, &asset)
            .await;

        if let Err(e) = asset.release() {
            log::warn!("voice: could not remove temporary sample: {e}");
        }
        result
    }

    async fn clone_from_asset(
        &self,
        generator: &dyn VoiceGenerator,
        story: &str,
        name: &str,
        description: &str,
        asset: &VoiceSampleAsset,
    ) -> StageResult<Arc<[u8]>> {
        let probe = Arc::clone(&self.probe);
        let path = asset.path().to_path_buf();
        let max_secs = self.config.max_sample_secs;

        let secs = tokio::task::spawn_blocking(move || {
            require_audio_duration_within(&path, probe.as_ref(), max_secs)
        })
        .await
        .map_err(|e| {
            log::error!("voice: duration probe task failed: {e}");
            StageError::AudioDurationUnknown
        })??;
        log::debug!("voice: sample is {secs:.1}s, cloning voice {name:?}");

        let audio = generator
            .clone_synthesize(story, name, description, &[asset.path().to_path_buf()])
            .await
            .map_err(|e| {
                log::error!("voice: cloning failed: {e}");
                StageError::CloneFailed
            })?;
        Ok(audio.into())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::probe::{silent_wav, FixedProbe};
    use crate::audio::WavHeaderProbe;
    use crate::credentials::Credentials;
    use crate::generators::mock::{MockProviders, MockStory, MockVoice};
    use crate::pipeline::state::new_shared_session;
    use tempfile::tempdir;

    struct Fixture {
        ctl: VoiceController,
        providers: Arc<MockProviders>,
        session: SharedSession,
        samples: tempfile::TempDir,
    }

    fn fixture(voice: MockVoice, probe: Arc<dyn DurationProbe>) -> Fixture {
        let providers = Arc::new(MockProviders::new(MockStory::ok(""), voice));
        let samples = tempdir().expect("temp dir");
        let ctl = VoiceController::new(
            VoiceConfig::default(),
            Arc::new(InvocationCache::new()),
            providers.clone(),
            probe,
        )
        .with_sample_dir(samples.path().to_path_buf());
        let session = new_shared_session(Credentials::default());
        {
            let mut s = lock_session(&session);
            s.set_credential(Provider::Voice, Some("xi-test"));
            s.store_story("Once upon a time...".into());
        }
        Fixture {
            ctl,
            providers,
            session,
            samples,
        }
    }

    fn clone_request(bytes: Vec<u8>) -> VoiceRequest {
        VoiceRequest::Clone {
            name: "Grandma".into(),
            description: "warm and slow".into(),
            sample: AudioUpload::new("grandma.wav", bytes),
        }
    }

    fn sample_dir_is_empty(f: &Fixture) -> bool {
        std::fs::read_dir(f.samples.path()).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn fallback_voices_without_key() {
        let f = fixture(MockVoice::new(&["Arnold", "Bella"]), Arc::new(FixedProbe(None)));
        lock_session(&f.session).set_credential(Provider::Voice, None);
        assert_eq!(f.ctl.available_voices(&f.session).await, ["Arnold"]);
        assert_eq!(f.providers.voice.list_calls(), 0);
    }

    #[tokio::test]
    async fn catalog_is_listed_once() {
        let f = fixture(MockVoice::new(&["Arnold", "Bella"]), Arc::new(FixedProbe(None)));
        for _ in 0..2 {
            assert_eq!(f.ctl.available_voices(&f.session).await, ["Arnold", "Bella"]);
        }
        assert_eq!(f.providers.voice.list_calls(), 1);
    }

    #[tokio::test]
    async fn catalog_failure_falls_back() {
        let f = fixture(MockVoice::without_catalog(), Arc::new(FixedProbe(None)));
        assert_eq!(f.ctl.available_voices(&f.session).await, ["Arnold"]);
    }

    #[tokio::test]
    async fn default_voice_synthesizes_story() {
        let f = fixture(MockVoice::new(&["Arnold", "Bella"]), Arc::new(FixedProbe(None)));
        let request = VoiceRequest::catalog("Bella", &VoiceConfig::default());

        let audio = f.ctl.run(&f.session, request).await.unwrap();
        assert_eq!(&audio.bytes[..], b"ID3-mock-audio");
        assert_eq!(
            f.providers.voice.synth_args.lock().unwrap().as_slice(),
            [(
                "Once upon a time...".to_string(),
                "Bella".to_string(),
                "eleven_multilingual_v1".to_string()
            )]
        );
        let s = lock_session(&f.session);
        assert!(s.audio().is_some());
        assert!(!s.voice_selection().unwrap().is_clone());
    }

    #[tokio::test]
    async fn voice_without_story_is_empty_story() {
        let f = fixture(MockVoice::new(&["Arnold"]), Arc::new(FixedProbe(None)));
        lock_session(&f.session).store_story(String::new());
        let err = f
            .ctl
            .run(&f.session, VoiceRequest::catalog("Arnold", &VoiceConfig::default()))
            .await
            .unwrap_err();
        assert_eq!(err, StageError::EmptyStory);
        assert_eq!(f.providers.voice.synth_calls(), 0);
    }

    #[tokio::test]
    async fn voice_without_key_is_missing_credential() {
        let f = fixture(MockVoice::new(&["Arnold"]), Arc::new(FixedProbe(None)));
        lock_session(&f.session).set_credential(Provider::Voice, Some(""));
        let err = f
            .ctl
            .run(&f.session, VoiceRequest::catalog("Arnold", &VoiceConfig::default()))
            .await
            .unwrap_err();
        assert_eq!(err, StageError::MissingCredential(Provider::Voice));
        assert!(lock_session(&f.session).audio().is_none());
    }

    #[tokio::test]
    async fn clone_uses_sample_then_removes_it() {
        let f = fixture(MockVoice::new(&[]), Arc::new(WavHeaderProbe));
        let audio = f
            .ctl
            .run(&f.session, clone_request(silent_wav(3.0, 8_000)))
            .await
            .unwrap();
        assert_eq!(&audio.bytes[..], b"ID3-mock-audio");

        let calls = f.providers.voice.clone_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "Grandma");
        assert_eq!(calls[0].description, "warm and slow");
        assert!(calls[0].samples_existed);
        assert!(calls[0].samples[0].to_string_lossy().ends_with(".wav"));
        assert!(!calls[0].samples[0].exists());
        assert!(sample_dir_is_empty(&f));
        assert!(lock_session(&f.session).voice_selection().unwrap().is_clone());
    }

    #[tokio::test]
    async fn clone_failure_is_clone_failed_and_removes_sample() {
        let f = fixture(
            MockVoice::new(&[]).failing_clone(),
            Arc::new(FixedProbe(Some(30.0))),
        );
        let err = f
            .ctl
            .run(&f.session, clone_request(b"ID3".to_vec()))
            .await
            .unwrap_err();
        assert_eq!(err, StageError::CloneFailed);
        assert_eq!(f.providers.voice.clone_calls().len(), 1);
        assert!(sample_dir_is_empty(&f));
        let s = lock_session(&f.session);
        assert!(s.audio().is_none());
        assert!(s.voice_selection().is_none());
    }

    #[tokio::test]
    async fn long_sample_is_rejected_before_cloning() {
        let f = fixture(MockVoice::new(&[]), Arc::new(FixedProbe(Some(150.0))));
        let err = f
            .ctl
            .run(&f.session, clone_request(b"ID3".to_vec()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StageError::AudioTooLong {
                max_secs: 120.0,
                actual_secs: 150.0
            }
        );
        assert!(f.providers.voice.clone_calls().is_empty());
        assert!(sample_dir_is_empty(&f));
    }

    #[tokio::test]
    async fn rejected_clone_keeps_previous_voice_and_audio() {
        let f = fixture(MockVoice::new(&["Arnold"]), Arc::new(FixedProbe(Some(150.0))));
        let first = f
            .ctl
            .run(&f.session, VoiceRequest::catalog("Arnold", &VoiceConfig::default()))
            .await
            .unwrap();

        let err = f
            .ctl
            .run(&f.session, clone_request(b"ID3".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::AudioTooLong { .. }));

        let s = lock_session(&f.session);
        assert!(!s.voice_selection().unwrap().is_clone());
        assert_eq!(s.audio(), Some(&first));
    }

    #[tokio::test]
    async fn unreadable_sample_is_rejected_before_cloning() {
        let f = fixture(MockVoice::new(&[]), Arc::new(WavHeaderProbe));
        let err = f
            .ctl
            .run(&f.session, clone_request(b"not audio".to_vec()))
            .await
            .unwrap_err();
        assert_eq!(err, StageError::AudioDurationUnknown);
        assert!(f.providers.voice.clone_calls().is_empty());
        assert!(sample_dir_is_empty(&f));
    }
}
