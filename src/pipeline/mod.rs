//! Pipeline orchestration for VoiceUp.
//!
//! This module sequences the story → voice → video stages and owns the
//! session that a presentation layer reads.
//!
//! # Architecture
//!
//! ```text
//! submit_story ─▶ StoryController ──▶ Session.story
//!                    │  upload: decode + non-empty guard
//!                    └─ generate: key guard → cache.story(prompt)
//!
//! submit_voice ─▶ VoiceController ──▶ Session.audio
//!                    │  guards: story, key
//!                    ├─ default: cache.synthesize(story, voice, model)
//!                    └─ clone:   temp sample → duration guard → clone → release
//!
//! submit_video ─▶ VideoController ──▶ Session.video
//!                    │  clone voice ⇒ audio required
//!                    └─ scratch dir → VideoGenerator::render_static → read output
//!
//! SharedSession (Arc<Mutex<Session>>) ←─── read by the presentation layer
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voiceup::config::AppConfig;
//! use voiceup::credentials::Credentials;
//! use voiceup::generators::VideoGeneratorOptions;
//! use voiceup::pipeline::{
//!     new_shared_session, Collaborators, PipelineOrchestrator, StoryRequest, TextUpload,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let session = new_shared_session(Credentials::from_env());
//!     let pipeline = PipelineOrchestrator::new(
//!         &config,
//!         session,
//!         Collaborators::from_config(&config, VideoGeneratorOptions::default()),
//!     );
//!
//!     let upload = TextUpload::new("story.txt", "Once upon a time...");
//!     if let Err(e) = pipeline.submit_story(StoryRequest::Upload(upload)).await {
//!         eprintln!("{e}");
//!     }
//! }
//! ```

pub mod error;
pub mod prompt;
pub mod runner;
pub mod state;
pub mod story;
pub mod upload;
pub mod video;
pub mod voice;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use error::{Dependency, StageError, StageResult};
pub use prompt::{AgeGroup, Genre, Language, StoryPrompt};
pub use runner::{Collaborators, PipelineOrchestrator};
pub use state::{
    lock_session, new_shared_session, AudioArtifact, ImageSelection, Session, SharedSession,
    Stage, StageSlot, StageStatus, VideoArtifact, VoiceSelection,
};
pub use story::{StoryController, StoryRequest};
pub use upload::{AudioUpload, ImageUpload, TextUpload, IMAGE_EXTENSIONS};
pub use video::VideoController;
pub use voice::{VoiceController, VoiceRequest};
