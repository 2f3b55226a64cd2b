//! In-memory uploads handed to the stage controllers.
//!
//! Uploads are plain `(file name, bytes)` pairs; the presentation layer is
//! responsible for reading them.  Only the file name's extension is used to
//! decide how the bytes are treated.

use std::path::Path;
use std::sync::Arc;

use super::error::{StageError, StageResult};

/// Image extensions accepted by the video stage (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

// ---------------------------------------------------------------------------
// TextUpload
// ---------------------------------------------------------------------------

/// An uploaded story file.
#[derive(Debug, Clone, PartialEq)]
pub struct TextUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl TextUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Decode the file as UTF-8.
    pub fn decode(&self) -> StageResult<&str> {
        std::str::from_utf8(&self.bytes).map_err(|e| StageError::DecodeFailed(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// AudioUpload
// ---------------------------------------------------------------------------

/// An uploaded voice sample.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl AudioUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Suffix for the temporary sample file.  Anything that is not WAV is
    /// treated as MPEG audio.
    pub fn suffix(&self) -> &'static str {
        match extension(&self.file_name).as_deref() {
            Some("wav") => ".wav",
            _ => ".mp3",
        }
    }
}

// ---------------------------------------------------------------------------
// ImageUpload
// ---------------------------------------------------------------------------

/// An uploaded still image.  Bytes are shared so selections clone cheaply.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Arc<[u8]>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Lower-case extension if it is one of [`IMAGE_EXTENSIONS`].
    pub fn accepted_extension(&self) -> Option<String> {
        extension(&self.file_name).filter(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Keep only PNG / JPEG uploads, logging the rest.
    pub fn filter_accepted(uploads: Vec<ImageUpload>) -> Vec<ImageUpload> {
        uploads
            .into_iter()
            .filter(|upload| {
                let ok = upload.accepted_extension().is_some();
                if !ok {
                    log::warn!("video: ignoring unsupported image {:?}", upload.file_name);
                }
                ok
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_decodes_utf8() {
        let upload = TextUpload::new("story.txt", "Érase una vez...".as_bytes());
        assert_eq!(upload.decode(), Ok("Érase una vez..."));
    }

    #[test]
    fn invalid_utf8_is_decode_failed() {
        let upload = TextUpload::new("story.txt", vec![0x66, 0xff, 0xfe]);
        assert!(matches!(upload.decode(), Err(StageError::DecodeFailed(_))));
    }

    #[test]
    fn audio_suffix_follows_extension() {
        assert_eq!(AudioUpload::new("me.WAV", Vec::new()).suffix(), ".wav");
        assert_eq!(AudioUpload::new("me.mp3", Vec::new()).suffix(), ".mp3");
        assert_eq!(AudioUpload::new("recording", Vec::new()).suffix(), ".mp3");
    }

    #[test]
    fn image_filter_keeps_png_and_jpeg() {
        let uploads = vec![
            ImageUpload::new("a.png", &b"png"[..]),
            ImageUpload::new("b.JPG", &b"jpg"[..]),
            ImageUpload::new("c.jpeg", &b"jpeg"[..]),
            ImageUpload::new("d.gif", &b"gif"[..]),
            ImageUpload::new("notes", &b"txt"[..]),
        ];
        let kept: Vec<_> = ImageUpload::filter_accepted(uploads)
            .into_iter()
            .map(|u| u.file_name)
            .collect();
        assert_eq!(kept, ["a.png", "b.JPG", "c.jpeg"]);
    }
}
