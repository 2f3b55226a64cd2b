//! `VoiceGenerator` trait and the ElevenLabs REST implementation.
//!
//! | Operation           | Endpoint                                   |
//! |---------------------|--------------------------------------------|
//! | `list_voices`       | `GET  /v1/voices`                          |
//! | `synthesize`        | `POST /v1/text-to-speech/{voice_id}`       |
//! | `clone_synthesize`  | `POST /v1/voices/add` then text-to-speech  |
//!
//! Voices are addressed by display name in the pipeline; the generator
//! resolves names to ids through the catalog.  A name that is not in the
//! catalog is passed through as an id.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::VoiceConfig;
use crate::credentials::Credential;

use super::{check_status, GeneratorError};

// ---------------------------------------------------------------------------
// VoiceGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for voice catalog access, synthesis and cloning.
#[async_trait]
pub trait VoiceGenerator: Send + Sync {
    /// Names of the voices available to this account.
    async fn list_voices(&self) -> Result<Vec<String>, GeneratorError>;

    /// Narrate `text` with the voice named `voice` using `model`.
    async fn synthesize(&self, text: &str, voice: &str, model: &str)
        -> Result<Vec<u8>, GeneratorError>;

    /// Create a voice from the sample files and narrate `text` with it.
    async fn clone_synthesize(
        &self,
        text: &str,
        name: &str,
        description: &str,
        samples: &[PathBuf],
    ) -> Result<Vec<u8>, GeneratorError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct VoiceList {
    voices: Vec<VoiceEntry>,
}

#[derive(Debug, Deserialize)]
struct VoiceEntry {
    voice_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AddedVoice {
    voice_id: String,
}

// ---------------------------------------------------------------------------
// ElevenLabsVoiceGenerator
// ---------------------------------------------------------------------------

/// ElevenLabs REST client.
pub struct ElevenLabsVoiceGenerator {
    client: reqwest::Client,
    config: VoiceConfig,
    api_key: Credential,
}

impl ElevenLabsVoiceGenerator {
    /// Build a generator from config and the session's ElevenLabs key.
    pub fn new(config: &VoiceConfig, api_key: Credential) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn catalog(&self) -> Result<Vec<VoiceEntry>, GeneratorError> {
        let response = self
            .client
            .get(self.url("/v1/voices"))
            .header("xi-api-key", self.api_key.expose())
            .send()
            .await?;
        let response = check_status(response).await?;
        let list: VoiceList = response
            .json()
            .await
            .map_err(|e| GeneratorError::Parse(e.to_string()))?;
        Ok(list.voices)
    }

    async fn resolve_voice_id(&self, voice: &str) -> Result<String, GeneratorError> {
        let catalog = self.catalog().await?;
        Ok(resolve_in(&catalog, voice))
    }

    async fn text_to_speech(
        &self,
        text: &str,
        voice_id: &str,
        model: &str,
    ) -> Result<Vec<u8>, GeneratorError> {
        let body = serde_json::json!({
            "text": text,
            "model_id": model,
        });

        let response = self
            .client
            .post(self.url(&format!("/v1/text-to-speech/{voice_id}")))
            .header("xi-api-key", self.api_key.expose())
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(GeneratorError::EmptyResponse);
        }
        Ok(audio.to_vec())
    }
}

fn resolve_in(catalog: &[VoiceEntry], voice: &str) -> String {
    catalog
        .iter()
        .find(|entry| entry.name == voice)
        .map(|entry| entry.voice_id.clone())
        .unwrap_or_else(|| voice.to_string())
}

fn sample_mime(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("wav") => "audio/wav",
        _ => "audio/mpeg",
    }
}

#[async_trait]
impl VoiceGenerator for ElevenLabsVoiceGenerator {
    async fn list_voices(&self) -> Result<Vec<String>, GeneratorError> {
        let names: Vec<String> = self
            .catalog()
            .await?
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        if names.is_empty() {
            return Err(GeneratorError::EmptyResponse);
        }
        Ok(names)
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        model: &str,
    ) -> Result<Vec<u8>, GeneratorError> {
        let voice_id = self.resolve_voice_id(voice).await?;
        log::debug!("voice: synthesizing {} chars with voice {voice_id}", text.len());
        self.text_to_speech(text, &voice_id, model).await
    }

    async fn clone_synthesize(
        &self,
        text: &str,
        name: &str,
        description: &str,
        samples: &[PathBuf],
    ) -> Result<Vec<u8>, GeneratorError> {
        let mut form = reqwest::multipart::Form::new()
            .text("name", name.to_string())
            .text("description", description.to_string());

        for path in samples {
            let bytes = tokio::fs::read(path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "sample.mp3".to_string());
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(file_name)
                .mime_str(sample_mime(path))?;
            form = form.part("files", part);
        }

        let response = self
            .client
            .post(self.url("/v1/voices/add"))
            .header("xi-api-key", self.api_key.expose())
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response).await?;
        let added: AddedVoice = response
            .json()
            .await
            .map_err(|e| GeneratorError::Parse(e.to_string()))?;

        log::info!("voice: created custom voice {name:?} ({})", added.voice_id);
        self.text_to_speech(text, &added.voice_id, &self.config.model)
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
