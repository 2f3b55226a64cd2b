//! Story stage: uploaded text or a generated story.

use std::sync::Arc;

use crate::cache::InvocationCache;
use crate::credentials::Provider;
use crate::generators::{GeneratorError, ProviderFactory};
use crate::guard::{require_credential, require_non_empty_story};

use super::error::{StageError, StageResult};
use super::prompt::StoryPrompt;
use super::state::{lock_session, SharedSession, Stage};
use super::upload::TextUpload;

/// The two ways of providing a story.
#[derive(Debug, Clone, PartialEq)]
pub enum StoryRequest {
    /// Use the text of an uploaded file as-is.
    Upload(TextUpload),
    /// Ask the story generator.
    Generate(StoryPrompt),
}

pub struct StoryController {
    cache: Arc<InvocationCache>,
    providers: Arc<dyn ProviderFactory>,
}

impl StoryController {
    pub fn new(cache: Arc<InvocationCache>, providers: Arc<dyn ProviderFactory>) -> Self {
        Self { cache, providers }
    }

    /// Produce a story and store it in the session.
    ///
    /// On any error the session's story is left untouched.
    pub async fn run(&self, session: &SharedSession, request: StoryRequest) -> StageResult<String> {
        let story = match request {
            StoryRequest::Upload(upload) => {
                let text = upload.decode()?;
                require_non_empty_story(Some(text))?.to_string()
            }
            StoryRequest::Generate(prompt) => self.generate(session, &prompt).await?,
        };

        log::debug!("story: storing {} chars", story.chars().count());
        lock_session(session).store_story(story.clone());
        Ok(story)
    }

    async fn generate(&self, session: &SharedSession, prompt: &StoryPrompt) -> StageResult<String> {
        let credential = lock_session(session).credentials().story.clone();
        let key = require_credential(credential.as_ref(), Provider::Story)?;

        let prompt = prompt.render();
        log::debug!("story: prompt = {prompt:?}");

        let generator = self.providers.story_generator(key);
        let text = self
            .cache
            .story(generator.as_ref(), &prompt)
            .await
            .map_err(|e| match e {
                GeneratorError::EmptyResponse => StageError::EmptyStory,
                e => StageError::from_generator(Stage::Story, Provider::Story, e),
            })?;

        let text = text.trim_start();
        require_non_empty_story(Some(text))?;
        Ok(text.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
