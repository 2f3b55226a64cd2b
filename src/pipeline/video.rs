//! Video stage: still frames plus optional narration rendered to MP4.
//!
//! Inputs are staged into a scratch directory that lives only for one
//! render.  The generator writes to its own known output location, which is
//! read back into the session and then removed, on success and failure
//! alike, unless [`VideoConfig::keep_rendered`] is set.  Rendering is never
//! memoized.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::VideoConfig;
use crate::generators::{FrameSource, RenderJob, VideoGenerator};

use super::error::{Dependency, StageError, StageResult};
use super::state::{
    lock_session, AudioArtifact, ImageSelection, SharedSession, VideoArtifact, VoiceSelection,
};
use super::upload::ImageUpload;

pub struct VideoController {
    config: VideoConfig,
    generator: Arc<dyn VideoGenerator>,
}

impl VideoController {
    pub fn new(config: VideoConfig, generator: Arc<dyn VideoGenerator>) -> Self {
        Self { config, generator }
    }

    /// Record `selection`, render the video and store it in the session.
    ///
    /// Uploaded images are filtered to PNG / JPEG first.  An empty set is
    /// kept as the selection but cannot be rendered.
    pub async fn run(
        &self,
        session: &SharedSession,
        selection: ImageSelection,
    ) -> StageResult<VideoArtifact> {
        let selection = match selection {
            ImageSelection::Uploaded(images) => {
                ImageSelection::Uploaded(ImageUpload::filter_accepted(images))
            }
            other => other,
        };

        let (voice, audio) = {
            let mut s = lock_session(session);
            s.select_images(selection.clone());
            (s.voice_selection().cloned(), s.audio().cloned())
        };

        let narration = self.narration(voice.as_ref(), audio)?;
        if matches!(&selection, ImageSelection::Uploaded(images) if images.is_empty()) {
            return Err(StageError::MissingDependency(Dependency::Images));
        }

        let work_dir = tempfile::Builder::new()
            .prefix("voiceup-render-")
            .tempdir()
            .map_err(render_failed("could not create scratch directory"))?;

        let result = self
            .render(work_dir.path(), &selection, narration.as_ref())
            .await;

        if let Err(e) = work_dir.close() {
            log::warn!("video: could not remove scratch directory: {e}");
        }
        if !self.config.keep_rendered {
            self.release_output().await;
        }

        let artifact = result?;
        lock_session(session).store_video(artifact.clone())?;
        Ok(artifact)
    }

    /// Remove whatever the generator left at its output location.
    async fn release_output(&self) {
        let path = self.generator.output_path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => log::debug!("video: removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("video: could not remove {}: {e}", path.display()),
        }
    }

    /// Narration to attach, if any.
    fn narration(
        &self,
        voice: Option<&VoiceSelection>,
        audio: Option<AudioArtifact>,
    ) -> StageResult<Option<AudioArtifact>> {
        match voice {
            Some(selection) if selection.is_clone() => audio
                .map(Some)
                .ok_or(StageError::MissingDependency(Dependency::Audio)),
            _ if self.config.include_narration => Ok(audio),
            _ => Ok(None),
        }
    }

    async fn render(
        &self,
        work_dir: &Path,
        selection: &ImageSelection,
        narration: Option<&AudioArtifact>,
    ) -> StageResult<VideoArtifact> {
        let frames = match selection {
            ImageSelection::StaticDefault => FrameSource::StaticDefault,
            ImageSelection::Uploaded(images) => {
                FrameSource::Images(stage_images(work_dir, images).await?)
            }
        };

        let narration = match narration {
            Some(audio) => {
                let path = work_dir.join("narration.mp3");
                tokio::fs::write(&path, &audio.bytes[..])
                    .await
                    .map_err(render_failed("could not stage narration"))?;
                Some(path)
            }
            None => None,
        };

        let job = RenderJob {
            frames,
            narration,
            work_dir: work_dir.to_path_buf(),
        };
        self.generator
            .render_static(&job)
            .await
            .map_err(render_failed("render failed"))?;

        let path = self.generator.output_path();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(render_failed("could not read rendered video"))?;
        log::info!("video: {} bytes at {}", bytes.len(), path.display());

        Ok(VideoArtifact {
            path,
            bytes: bytes.into(),
        })
    }
}

/// Write the uploads into `dir` as `frame-NNN.<ext>`, in order.
async fn stage_images(dir: &Path, images: &[ImageUpload]) -> StageResult<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(images.len());
    for (i, image) in images.iter().enumerate() {
        let ext = image.accepted_extension().unwrap_or_else(|| "png".into());
        let path = dir.join(format!("frame-{i:03}.{ext}"));
        tokio::fs::write(&path, &image.bytes[..])
            .await
            .map_err(render_failed("could not stage image"))?;
        paths.push(path);
    }
    Ok(paths)
}

fn render_failed<E: std::fmt::Display>(what: &'static str) -> impl FnOnce(E) -> StageError {
    move |e| {
        log::error!("video: {what}: {e}");
        StageError::RenderFailed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
