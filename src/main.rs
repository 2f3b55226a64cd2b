//! Application entry point — VoiceUp headless runner.
//!
//! # Usage
//!
//! ```text
//! voiceup [STORY_FILE]
//! ```
//!
//! # Startup sequence
//!
//! 1. Initialise logging (`RUST_LOG`, default `info`).
//! 2. Load `.env` if present, then read the provider keys from the
//!    environment.
//! 3. Load [`AppConfig`] from disk (returns default on first run).
//! 4. Build the collaborators and the [`PipelineOrchestrator`].
//! 5. Story: upload `STORY_FILE`, or generate one from the default prompt.
//! 6. Voice: narrate with the first offered voice.
//! 7. Video: render the static default image.  The clip stays on disk only
//!    when `video.keep_rendered` is set in the config.

use std::path::PathBuf;

use anyhow::{Context, Result};
use voiceup::{
    config::AppConfig,
    credentials::{Credential, Credentials},
    generators::VideoGeneratorOptions,
    pipeline::{
        new_shared_session, AudioArtifact, Collaborators, ImageSelection, PipelineOrchestrator,
        Stage, StageResult, StoryPrompt, StoryRequest, TextUpload, VideoArtifact, VoiceRequest,
    },
};

const STABILITY_API_KEY: &str = "STABILITY_API_KEY";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("VoiceUp starting up");

    match dotenvy::dotenv() {
        Ok(path) => log::debug!("loaded environment from {}", path.display()),
        Err(e) => log::debug!("no .env loaded: {e}"),
    }

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    let credentials = Credentials::from_env();
    let options = VideoGeneratorOptions {
        openai_key: credentials.story.clone(),
        stable_diffusion_key: std::env::var(STABILITY_API_KEY)
            .ok()
            .and_then(Credential::new),
    };

    let pipeline = PipelineOrchestrator::new(
        &config,
        new_shared_session(credentials),
        Collaborators::from_config(&config, options),
    );

    // ── Story ────────────────────────────────────────────────────────────
    let request = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("reading story file {}", path.display()))?;
            StoryRequest::Upload(TextUpload::new(path.display().to_string(), bytes))
        }
        None => StoryRequest::Generate(StoryPrompt::default()),
    };
    let Some(story) = report(Stage::Story, pipeline.submit_story(request).await) else {
        return Ok(());
    };
    println!("{story}\n");

    // ── Voice ────────────────────────────────────────────────────────────
    let voices = pipeline.available_voices().await;
    match voices.into_iter().next() {
        Some(voice) => {
            log::info!("narrating with {voice:?}");
            if let Some(audio) = report(
                Stage::Voice,
                pipeline
                    .submit_voice(VoiceRequest::catalog(voice, &config.voice))
                    .await,
            ) {
                println!("audio: {} bytes ({})", audio.bytes.len(), AudioArtifact::MIME);
            }
        }
        None => log::warn!("no voices configured; skipping narration"),
    }

    // ── Video ────────────────────────────────────────────────────────────
    if let Some(video) = report(
        Stage::Video,
        pipeline.submit_video(ImageSelection::StaticDefault).await,
    ) {
        println!("video: {} bytes ({})", video.bytes.len(), VideoArtifact::MIME);
        if config.video.keep_rendered {
            println!("video: {}", video.path.display());
        }
    }

    Ok(())
}

/// Print a stage outcome the way a user would see it.
fn report<T>(stage: Stage, result: StageResult<T>) -> Option<T> {
    match result {
        Ok(value) => {
            println!("{}: ready", stage.label());
            Some(value)
        }
        Err(e) => {
            println!("{}: {e}", stage.label());
            None
        }
    }
}
