//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\voiceup\
//!   macOS:   ~/Library/Application Support/voiceup/
//!   Linux:   ~/.config/voiceup/
//!
//! Data dir (rendered videos):
//!   Windows: %LOCALAPPDATA%\voiceup\videos\
//!   macOS:   ~/Library/Application Support/voiceup/videos/
//!   Linux:   ~/.local/share/voiceup/videos/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory the video generator renders into.
    pub videos_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "voiceup";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            config_dir,
            videos_dir: data_dir.join("videos"),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
