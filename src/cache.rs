//! Process-wide memoization of expensive generator calls.
//!
//! [`InvocationCache`] stores the successful result of each
//! `(generator kind, arguments)` pair for the lifetime of the process.  A
//! repeated call with an equal key returns the stored value without touching
//! the collaborator; changing any argument (the story text, the voice, the
//! model) yields a new key and therefore a fresh call.
//!
//! Failures are never stored, so a failed call is retried on the next
//! submission.  Server-side changes behind an unchanged key are not observed
//! until the process restarts.
//!
//! Only story generation, the voice catalog and default-voice synthesis go
//! through the cache.  Cloning and video rendering are always executed.
//!
//! The cache is shared behind an `Arc`; if several sessions share a process
//! they also share hits.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::generators::{GeneratorError, StoryGenerator, VoiceGenerator};

// ---------------------------------------------------------------------------
// Keys and values
// ---------------------------------------------------------------------------

/// Which memoized operation a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    Story,
    VoiceCatalog,
    Synthesize,
}

/// A `(generator kind, argument tuple)` pair compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvocationKey {
    kind: GeneratorKind,
    args: Vec<String>,
}

impl InvocationKey {
    pub fn new<I, S>(kind: GeneratorKind, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// A memoized result.  Audio is shared, so cache hits do not copy it.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedOutput {
    Text(String),
    Voices(Vec<String>),
    Audio(Arc<[u8]>),
}

// ---------------------------------------------------------------------------
// InvocationCache
// ---------------------------------------------------------------------------

/// Memoizes generator calls by [`InvocationKey`].
#[derive(Debug, Default)]
pub struct InvocationCache {
    entries: Mutex<HashMap<InvocationKey, CachedOutput>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InvocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the stored value for `key`, or run `call` and store its result.
    ///
    /// The lock is released while `call` runs.  Errors from `call` are
    /// returned unchanged and not stored.
    pub async fn invoke<F, Fut>(
        &self,
        key: InvocationKey,
        call: F,
    ) -> Result<CachedOutput, GeneratorError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedOutput, GeneratorError>>,
    {
        if let Some(hit) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("cache: hit for {:?}", key.kind);
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("cache: miss for {:?}, invoking generator", key.kind);

        let value = call().await?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.clone());
        Ok(value)
    }

    fn lookup(&self, key: &InvocationKey) -> Option<CachedOutput> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Memoized [`StoryGenerator::generate_story`].
    pub async fn story(
        &self,
        generator: &dyn StoryGenerator,
        prompt: &str,
    ) -> Result<String, GeneratorError> {
        let key = InvocationKey::new(GeneratorKind::Story, [prompt]);
        let output = self
            .invoke(key, || async {
                generator.generate_story(prompt).await.map(CachedOutput::Text)
            })
            .await?;
        match output {
            CachedOutput::Text(text) => Ok(text),
            other => Err(mismatch(GeneratorKind::Story, &other)),
        }
    }

    /// Memoized [`VoiceGenerator::list_voices`].
    pub async fn voices(&self, generator: &dyn VoiceGenerator) -> Result<Vec<String>, GeneratorError> {
        let key = InvocationKey::new(GeneratorKind::VoiceCatalog, Vec::<String>::new());
        let output = self
            .invoke(key, || async {
                generator.list_voices().await.map(CachedOutput::Voices)
            })
            .await?;
        match output {
            CachedOutput::Voices(voices) => Ok(voices),
            other => Err(mismatch(GeneratorKind::VoiceCatalog, &other)),
        }
    }

    /// Memoized [`VoiceGenerator::synthesize`].
    pub async fn synthesize(
        &self,
        generator: &dyn VoiceGenerator,
        text: &str,
        voice: &str,
        model: &str,
    ) -> Result<Arc<[u8]>, GeneratorError> {
        let key = InvocationKey::new(GeneratorKind::Synthesize, [text, voice, model]);
        let output = self
            .invoke(key, || async {
                generator
                    .synthesize(text, voice, model)
                    .await
                    .map(|audio| CachedOutput::Audio(audio.into()))
            })
            .await?;
        match output {
            CachedOutput::Audio(audio) => Ok(audio),
            other => Err(mismatch(GeneratorKind::Synthesize, &other)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

fn mismatch(kind: GeneratorKind, output: &CachedOutput) -> GeneratorError {
    GeneratorError::Internal(format!("cached value for {kind:?} has wrong shape: {output:?}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::mock::{MockStory, MockVoice};

    #[tokio::test]
    async fn identical_story_prompt_invokes_generator_once() {
        let cache = InvocationCache::new();
        let gen = MockStory::ok("Once upon a time...");

        let first = cache.story(&gen, "a fairy tale").await.unwrap();
        let second = cache.story(&gen, "a fairy tale").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(gen.calls(), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[tokio::test]
    async fn changed_argument_is_a_new_key() {
        let cache = InvocationCache::new();
        let voice = MockVoice::new(&["Arnold"]);

        cache.synthesize(&voice, "story one", "Arnold", "m1").await.unwrap();
        cache.synthesize(&voice, "story two", "Arnold", "m1").await.unwrap();
        cache.synthesize(&voice, "story two", "Bella", "m1").await.unwrap();
        cache.synthesize(&voice, "story two", "Bella", "m2").await.unwrap();
        cache.synthesize(&voice, "story two", "Bella", "m2").await.unwrap();

        assert_eq!(voice.synth_calls(), 4);
        assert_eq!(cache.len(), 4);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = InvocationCache::new();
        let gen = MockStory::failing(|| GeneratorError::Timeout);

        assert!(cache.story(&gen, "p").await.is_err());
        assert!(cache.story(&gen, "p").await.is_err());

        assert_eq!(gen.calls(), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn voice_catalog_is_listed_once() {
        let cache = InvocationCache::new();
        let voice = MockVoice::new(&["Arnold", "Bella"]);

        let first = cache.voices(&voice).await.unwrap();
        let second = cache.voices(&voice).await.unwrap();

        assert_eq!(first, vec!["Arnold", "Bella"]);
        assert_eq!(first, second);
        assert_eq!(voice.list_calls(), 1);
    }

    #[tokio::test]
    async fn keys_of_different_kinds_do_not_collide() {
        let cache = InvocationCache::new();
        let a = InvocationKey::new(GeneratorKind::Story, ["x"]);
        let b = InvocationKey::new(GeneratorKind::Synthesize, ["x"]);
        assert_ne!(a, b);

        cache
            .invoke(a.clone(), || async { Ok(CachedOutput::Text("story".into())) })
            .await
            .unwrap();
        let out = cache
            .invoke(b, || async { Ok(CachedOutput::Audio(Arc::from(&b"mp3"[..]))) })
            .await
            .unwrap();
        assert!(matches!(out, CachedOutput::Audio(_)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InvocationCache>();
    }
}
