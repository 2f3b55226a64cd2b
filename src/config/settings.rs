//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  Missing keys fall back
//! to their defaults.  API keys are deliberately absent: they live only in
//! the session.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// StoryConfig
// ---------------------------------------------------------------------------

/// Settings for the story generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// Chat model identifier.
    pub model: String,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Seconds before the HTTP client gives up.
    pub timeout_secs: u64,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.8,
            max_tokens: 700,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceConfig
// ---------------------------------------------------------------------------

/// Settings for the voice generator and the voice stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Base URL of the ElevenLabs API.
    pub base_url: String,
    /// Synthesis model used for default and cloned voices.
    pub model: String,
    /// Voices offered when the provider catalog is unavailable.
    pub fallback_voices: Vec<String>,
    /// Longest accepted clone sample, in seconds.
    pub max_sample_secs: f64,
    /// Seconds before the HTTP client gives up.
    pub timeout_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".into(),
            model: "eleven_multilingual_v1".into(),
            fallback_voices: vec!["Arnold".into()],
            max_sample_secs: crate::guard::MAX_SAMPLE_SECS,
            timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// VideoConfig
// ---------------------------------------------------------------------------

/// Settings for the video generator and the video stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Where rendered videos go; `None` means [`AppPaths::videos_dir`].
    pub output_dir: Option<PathBuf>,
    /// File name of the rendered clip inside the output directory.
    pub output_file: String,
    /// Image used for the static-default mode; `None` renders a black frame.
    pub default_image: Option<PathBuf>,
    /// How long each uploaded image is shown in a slideshow.
    pub seconds_per_image: f64,
    /// Clip length for still frames when no narration is attached.
    pub static_duration_secs: f64,
    /// Attach existing narration audio even for the default-voice path.
    pub include_narration: bool,
    /// Leave the rendered clip in the output directory after it was read
    /// back.  Off by default: the clip is removed once its bytes are held.
    pub keep_rendered: bool,
    /// Output frame width in pixels.
    pub width: u32,
    /// Output frame height in pixels.
    pub height: u32,
    /// `ffmpeg` executable name or path.
    pub ffmpeg_program: String,
    /// `ffprobe` executable name or path.
    pub ffprobe_program: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            output_file: "story.mp4".into(),
            default_image: None,
            seconds_per_image: 5.0,
            static_duration_secs: 10.0,
            include_narration: true,
            keep_rendered: false,
            width: 1280,
            height: 720,
            ffmpeg_program: "ffmpeg".into(),
            ffprobe_program: "ffprobe".into(),
        }
    }
}

impl VideoConfig {
    /// The configured output directory, or the platform videos directory.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().videos_dir)
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voiceup::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Story generator settings.
    pub story: StoryConfig,
    /// Voice generator settings.
    pub voice: VoiceConfig,
    /// Video generator settings.
    pub video: VideoConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
