//! Construction of the credentialed generators.
//!
//! Story and voice generators cannot exist without an API key, so the
//! pipeline asks a [`ProviderFactory`] for one at the moment a stage runs,
//! passing the key currently held by the session.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::credentials::Credential;

use super::story::{OpenAiStoryGenerator, StoryGenerator};
use super::voice::{ElevenLabsVoiceGenerator, VoiceGenerator};

/// Builds story and voice generators for a given key.
pub trait ProviderFactory: Send + Sync {
    fn story_generator(&self, key: &Credential) -> Arc<dyn StoryGenerator>;
    fn voice_generator(&self, key: &Credential) -> Arc<dyn VoiceGenerator>;
}

/// Factory for the HTTP-backed OpenAI and ElevenLabs generators.
pub struct HttpProviders {
    config: AppConfig,
}

impl HttpProviders {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl ProviderFactory for HttpProviders {
    fn story_generator(&self, key: &Credential) -> Arc<dyn StoryGenerator> {
        Arc::new(OpenAiStoryGenerator::new(&self.config.story, key.clone()))
    }

    fn voice_generator(&self, key: &Credential) -> Arc<dyn VoiceGenerator> {
        Arc::new(ElevenLabsVoiceGenerator::new(&self.config.voice, key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_providers_build_both_generators() {
        let providers: Box<dyn ProviderFactory> = Box::new(HttpProviders::new(&AppConfig::default()));
        let key = Credential::new("key").unwrap();
        let _story = providers.story_generator(&key);
        let _voice = providers.voice_generator(&key);
    }
}
