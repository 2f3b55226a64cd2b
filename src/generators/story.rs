//! Core `StoryGenerator` trait and `OpenAiStoryGenerator` implementation.
//!
//! `OpenAiStoryGenerator` calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint.  Connection details come from [`StoryConfig`]; the API key is
//! supplied separately because it belongs to the session, not the config file.

use async_trait::async_trait;

use crate::config::StoryConfig;
use crate::credentials::Credential;

use super::{check_status, GeneratorError};

/// System message steering the model towards narration-ready prose.
const SYSTEM_INSTRUCTION: &str = "\
You are a storyteller writing short stories that will be read aloud as the narration of a short video.
Rules:
1. Write plain prose only: no titles, headings, lists or markdown.
2. Keep the story under 300 words.
3. Write in the language requested by the user.
4. Reply with ONLY the story.";

// ---------------------------------------------------------------------------
// StoryGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for story text generation.
///
/// Implementors must be `Send + Sync` so they can be shared behind
/// `Arc<dyn StoryGenerator>`.
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    /// Generate a story for the natural-language `prompt`.
    async fn generate_story(&self, prompt: &str) -> Result<String, GeneratorError>;
}

// ---------------------------------------------------------------------------
// OpenAiStoryGenerator
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiStoryGenerator {
    client: reqwest::Client,
    config: StoryConfig,
    api_key: Credential,
}

impl OpenAiStoryGenerator {
    /// Build a generator from config and the session's OpenAI key.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`; a default client is used if the builder fails.
    pub fn new(config: &StoryConfig, api_key: Credential) -> Self {
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
}

#[async_trait]
impl StoryGenerator for OpenAiStoryGenerator {
    async fn generate_story(&self, prompt: &str) -> Result<String, GeneratorError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_INSTRUCTION },
                { "role": "user",   "content": prompt }
            ],
            "stream":      false,
            "temperature": self.config.temperature,
            "max_tokens":  self.config.max_tokens
        });

        log::debug!("story: requesting completion from {url}");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GeneratorError::Parse(e.to_string()))?;

        let story = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(GeneratorError::EmptyResponse)?;

        Ok(story.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
