//! Scoped temporary file holding an uploaded voice sample.
//!
//! A [`VoiceSampleAsset`] exists for exactly one clone attempt.  The file is
//! removed by [`release`](VoiceSampleAsset::release), or on drop if the
//! caller bails out early, so every exit path cleans up.

use std::io::Write;
use std::path::Path;

use tempfile::TempPath;

pub struct VoiceSampleAsset {
    path: TempPath,
}

impl VoiceSampleAsset {
    /// Write `bytes` to a fresh temporary file in `dir` ending in `suffix`
    /// (e.g. `".mp3"`).
    pub fn write_in(dir: &Path, bytes: &[u8], suffix: &str) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("voiceup-sample-")
            .suffix(suffix)
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, reporting any failure.
    pub fn release(self) -> std::io::Result<()> {
        self.path.close()
    }
}

impl std::fmt::Debug for VoiceSampleAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceSampleAsset")
            .field("path", &self.path())
            .finish()
    }
}
