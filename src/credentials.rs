//! Provider credentials held for the lifetime of one session.
//!
//! A [`Credential`] is an opaque secret string.  It is never persisted, never
//! validated beyond presence, and its `Debug` output is redacted so it cannot
//! leak into logs.  Absence (`None`) is a valid state that gates the stages
//! depending on that provider.

use std::fmt;

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// The two external providers that need an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Story text generation (OpenAI-compatible chat completions).
    Story,
    /// Voice catalog, synthesis and cloning (ElevenLabs).
    Voice,
}

impl Provider {
    /// Vendor name shown to the user when the key is missing.
    pub fn label(&self) -> &'static str {
        match self {
            Provider::Story => "OpenAI",
            Provider::Voice => "ElevenLabs",
        }
    }

    /// What the user is trying to do with this provider.
    pub fn action(&self) -> &'static str {
        match self {
            Provider::Story => "generate a story",
            Provider::Voice => "generate audio",
        }
    }

    /// Environment variable the binary reads the key from.
    pub fn env_var(&self) -> &'static str {
        match self {
            Provider::Story => "OPENAI_API_KEY",
            Provider::Voice => "ELEVENLABS_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// An opaque API key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap `secret`, returning `None` for empty or whitespace-only input.
    ///
    /// Password inputs report "nothing entered" as an empty string, so an empty
    /// value means the key is absent rather than invalid.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw secret, for building request headers only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// The per-session pair of provider keys; either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub story: Option<Credential>,
    pub voice: Option<Credential>,
}

impl Credentials {
    pub fn get(&self, provider: Provider) -> Option<&Credential> {
        match provider {
            Provider::Story => self.story.as_ref(),
            Provider::Voice => self.voice.as_ref(),
        }
    }

    /// Replace the key for `provider`; `None` or an empty string clears it.
    pub fn set(&mut self, provider: Provider, secret: Option<&str>) {
        let credential = secret.and_then(Credential::new);
        match provider {
            Provider::Story => self.story = credential,
            Provider::Voice => self.voice = credential,
        }
    }

    /// Read both keys from the process environment.
    pub fn from_env() -> Self {
        let mut credentials = Self::default();
        for provider in [Provider::Story, Provider::Voice] {
            let value = std::env::var(provider.env_var()).ok();
            credentials.set(provider, value.as_deref());
        }
        credentials
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_absent() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   \n").is_none());
    }

    #[test]
    fn secret_is_trimmed() {
        let cred = Credential::new("  sk-test \n").unwrap();
        assert_eq!(cred.expose(), "sk-test");
    }

    #[test]
    fn debug_output_is_redacted() {
        let cred = Credential::new("sk-very-secret").unwrap();
        let shown = format!("{cred:?}");
        assert!(!shown.contains("sk-very-secret"));

        let mut creds = Credentials::default();
        creds.set(Provider::Voice, Some("xi-secret"));
        assert!(!format!("{creds:?}").contains("xi-secret"));
    }

    #[test]
    fn set_and_clear_per_provider() {
        let mut creds = Credentials::default();
        creds.set(Provider::Story, Some("sk-1"));
        assert_eq!(creds.get(Provider::Story).unwrap().expose(), "sk-1");
        assert!(creds.get(Provider::Voice).is_none());

        creds.set(Provider::Story, Some(""));
        assert!(creds.get(Provider::Story).is_none());
    }

    #[test]
    fn provider_labels() {
        assert_eq!(Provider::Story.to_string(), "OpenAI");
        assert_eq!(Provider::Voice.label(), "ElevenLabs");
    }
}
