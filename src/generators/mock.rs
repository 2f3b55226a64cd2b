//! Test doubles for the generator traits.
//!
//! Each double counts its calls so tests can assert how often the pipeline
//! actually reached the "external" collaborator.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::credentials::Credential;

use super::{
    GeneratorError, ProviderFactory, RenderJob, StoryGenerator, VideoGenerator, VoiceGenerator,
};

// ---------------------------------------------------------------------------
// MockStory
// ---------------------------------------------------------------------------

pub struct MockStory {
    reply: Result<String, fn() -> GeneratorError>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl MockStory {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(make: fn() -> GeneratorError) -> Self {
        Self {
            reply: Err(make),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoryGenerator for MockStory {
    async fn generate_story(&self, prompt: &str) -> Result<String, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(make) => Err(make()),
        }
    }
}

// ---------------------------------------------------------------------------
// MockVoice
// ---------------------------------------------------------------------------

/// One observed `clone_synthesize` call.
#[derive(Debug, Clone)]
pub struct CloneCall {
    pub name: String,
    pub description: String,
    pub samples: Vec<PathBuf>,
    /// Whether every sample file existed while the call was running.
    pub samples_existed: bool,
}

pub struct MockVoice {
    /// `None` makes `list_voices` fail.
    voices: Option<Vec<String>>,
    audio: Vec<u8>,
    clone_fails: bool,
    pub list_calls: AtomicUsize,
    pub synth_calls: AtomicUsize,
    pub synth_args: Mutex<Vec<(String, String, String)>>,
    pub clone_calls: Mutex<Vec<CloneCall>>,
}

impl MockVoice {
    pub fn new(voices: &[&str]) -> Self {
        Self {
            voices: Some(voices.iter().map(|v| v.to_string()).collect()),
            audio: b"ID3-mock-audio".to_vec(),
            clone_fails: false,
            list_calls: AtomicUsize::new(0),
            synth_calls: AtomicUsize::new(0),
            synth_args: Mutex::new(Vec::new()),
            clone_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_catalog() -> Self {
        Self {
            voices: None,
            ..Self::new(&[])
        }
    }

    pub fn failing_clone(mut self) -> Self {
        self.clone_fails = true;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn synth_calls(&self) -> usize {
        self.synth_calls.load(Ordering::SeqCst)
    }

    pub fn clone_calls(&self) -> Vec<CloneCall> {
        self.clone_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VoiceGenerator for MockVoice {
    async fn list_voices(&self) -> Result<Vec<String>, GeneratorError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.voices
            .clone()
            .ok_or_else(|| GeneratorError::Request("catalog unavailable".into()))
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        model: &str,
    ) -> Result<Vec<u8>, GeneratorError> {
        self.synth_calls.fetch_add(1, Ordering::SeqCst);
        self.synth_args
            .lock()
            .unwrap()
            .push((text.to_string(), voice.to_string(), model.to_string()));
        Ok(self.audio.clone())
    }

    async fn clone_synthesize(
        &self,
        _text: &str,
        name: &str,
        description: &str,
        samples: &[PathBuf],
    ) -> Result<Vec<u8>, GeneratorError> {
        self.clone_calls.lock().unwrap().push(CloneCall {
            name: name.to_string(),
            description: description.to_string(),
            samples: samples.to_vec(),
            samples_existed: samples.iter().all(|p| p.exists()),
        });
        if self.clone_fails {
            return Err(GeneratorError::Status {
                status: 422,
                body: "voice limit reached".into(),
            });
        }
        Ok(self.audio.clone())
    }
}

// ---------------------------------------------------------------------------
// MockVideo
// ---------------------------------------------------------------------------

pub struct MockVideo {
    output: PathBuf,
    fail: bool,
    pub calls: AtomicUsize,
    pub jobs: Mutex<Vec<RenderJob>>,
    /// Whether the narration file existed during each render.
    pub narration_existed: Mutex<Vec<bool>>,
}

impl MockVideo {
    pub fn new(output: PathBuf) -> Self {
        Self {
            output,
            fail: false,
            calls: AtomicUsize::new(0),
            jobs: Mutex::new(Vec::new()),
            narration_existed: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(output: PathBuf) -> Self {
        Self {
            fail: true,
            ..Self::new(output)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_job(&self) -> Option<RenderJob> {
        self.jobs.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl VideoGenerator for MockVideo {
    fn output_path(&self) -> PathBuf {
        self.output.clone()
    }

    async fn render_static(&self, job: &RenderJob) -> Result<(), GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.jobs.lock().unwrap().push(job.clone());
        self.narration_existed
            .lock()
            .unwrap()
            .push(job.narration.as_ref().map_or(false, |p| p.exists()));
        if self.fail {
            // a crashed ffmpeg can leave a truncated file behind
            std::fs::write(&self.output, b"partial")?;
            return Err(GeneratorError::Command {
                command: "ffmpeg".into(),
                detail: "exit status: 1".into(),
            });
        }
        std::fs::write(&self.output, b"mock-mp4")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockProviders
// ---------------------------------------------------------------------------

pub struct MockProviders {
    pub story: Arc<MockStory>,
    pub voice: Arc<MockVoice>,
    pub keys_seen: Mutex<Vec<String>>,
}

impl MockProviders {
    pub fn new(story: MockStory, voice: MockVoice) -> Self {
        Self {
            story: Arc::new(story),
            voice: Arc::new(voice),
            keys_seen: Mutex::new(Vec::new()),
        }
    }
}

impl ProviderFactory for MockProviders {
    fn story_generator(&self, key: &Credential) -> Arc<dyn StoryGenerator> {
        self.keys_seen.lock().unwrap().push(key.expose().to_string());
        self.story.clone()
    }

    fn voice_generator(&self, key: &Credential) -> Arc<dyn VoiceGenerator> {
        self.keys_seen.lock().unwrap().push(key.expose().to_string());
        self.voice.clone()
    }
}
