//! `VideoGenerator` trait and the `ffmpeg`-backed implementation.
//!
//! # Frame sources
//!
//! | Source                         | ffmpeg input                              |
//! |--------------------------------|-------------------------------------------|
//! | one image                      | `-loop 1 -i image`                        |
//! | several images                 | concat demuxer, `seconds_per_image` each  |
//! | static default, image set      | `-loop 1 -i default_image`                |
//! | static default, no image set   | `lavfi color=black` frame                 |
//!
//! When narration is attached the clip ends with the shorter of the two
//! streams (`-shortest`); otherwise still frames run for
//! `static_duration_secs`.  Output is always H.264 / yuv420p MP4 written to
//! the generator's fixed [`output_path`](VideoGenerator::output_path).

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::VideoConfig;
use crate::credentials::Credential;

use super::process::run_command;
use super::GeneratorError;

// ---------------------------------------------------------------------------
// Render job
// ---------------------------------------------------------------------------

/// Which still frames make up the video.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameSource {
    /// User-provided images, shown in order.
    Images(Vec<PathBuf>),
    /// The built-in default image.
    StaticDefault,
}

/// Everything one render needs.  Paths must stay valid until the render
/// returns.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub frames: FrameSource,
    /// Narration track muxed under the frames.
    pub narration: Option<PathBuf>,
    /// Scratch directory for intermediate files (e.g. the concat list).
    pub work_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// VideoGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for rendering the final clip.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Where [`render_static`](Self::render_static) writes its output.
    fn output_path(&self) -> PathBuf;

    /// Render `job` into [`output_path`](Self::output_path).
    async fn render_static(&self, job: &RenderJob) -> Result<(), GeneratorError>;
}

// ---------------------------------------------------------------------------
// VideoGeneratorOptions
// ---------------------------------------------------------------------------

/// Optional keys for AI image generation.
///
/// Both may be absent; without them only user images and the static default
/// image are available, which is all the static render path needs.
#[derive(Debug, Clone, Default)]
pub struct VideoGeneratorOptions {
    pub openai_key: Option<Credential>,
    pub stable_diffusion_key: Option<Credential>,
}

impl VideoGeneratorOptions {
    pub fn ai_images_enabled(&self) -> bool {
        self.openai_key.is_some() || self.stable_diffusion_key.is_some()
    }
}

// ---------------------------------------------------------------------------
// FfmpegVideoGenerator
// ---------------------------------------------------------------------------

const FRAME_RATE: u32 = 25;

/// Renders clips by shelling out to `ffmpeg`.
pub struct FfmpegVideoGenerator {
    config: VideoConfig,
    output_dir: PathBuf,
}

impl FfmpegVideoGenerator {
    pub fn new(config: &VideoConfig, output_dir: PathBuf, options: VideoGeneratorOptions) -> Self {
        if !options.ai_images_enabled() {
            log::info!("video: no image-generation keys, AI images disabled");
        }
        Self {
            config: config.clone(),
            output_dir,
        }
    }

    /// Build the ffmpeg argument list for `job`.
    ///
    /// `concat_list` must point at the file produced by [`concat_list`] when
    /// the job has more than one image.
    pub fn ffmpeg_args(
        &self,
        job: &RenderJob,
        concat_list: Option<&Path>,
        output: &Path,
    ) -> Result<Vec<String>, GeneratorError> {
        let (w, h) = (self.config.width, self.config.height);
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-y"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        // true when the frame input is endless and needs an explicit length
        let endless = match &job.frames {
            FrameSource::Images(images) if images.is_empty() => {
                return Err(GeneratorError::Internal("render job has no images".into()));
            }
            FrameSource::Images(images) if images.len() > 1 => {
                let list = concat_list.ok_or_else(|| {
                    GeneratorError::Internal("concat list missing for slideshow".into())
                })?;
                args.extend(
                    ["-f", "concat", "-safe", "0", "-i"]
                        .iter()
                        .map(|s| s.to_string()),
                );
                args.push(list.display().to_string());
                false
            }
            FrameSource::Images(images) => {
                push_looped_image(&mut args, &images[0]);
                true
            }
            FrameSource::StaticDefault => {
                match &self.config.default_image {
                    Some(image) => push_looped_image(&mut args, image),
                    None => {
                        args.extend(["-f", "lavfi", "-i"].iter().map(|s| s.to_string()));
                        args.push(format!("color=c=black:s={w}x{h}:r={FRAME_RATE}"));
                    }
                }
                true
            }
        };

        if let Some(narration) = &job.narration {
            args.push("-i".into());
            args.push(narration.display().to_string());
        }

        args.push("-vf".into());
        args.push(format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,format=yuv420p"
        ));
        args.extend(["-c:v", "libx264", "-r"].iter().map(|s| s.to_string()));
        args.push(FRAME_RATE.to_string());

        if job.narration.is_some() {
            args.extend(
                ["-c:a", "aac", "-b:a", "192k", "-shortest"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        } else if endless {
            args.push("-t".into());
            args.push(format!("{}", self.config.static_duration_secs));
        }

        args.extend(["-movflags", "+faststart"].iter().map(|s| s.to_string()));
        args.push(output.display().to_string());
        Ok(args)
    }
}

fn push_looped_image(args: &mut Vec<String>, image: &Path) {
    args.extend(["-loop", "1", "-framerate"].iter().map(|s| s.to_string()));
    args.push(FRAME_RATE.to_string());
    args.push("-i".into());
    args.push(image.display().to_string());
}

/// Contents of an ffmpeg concat-demuxer list showing each image for
/// `seconds` seconds.
///
/// The last entry is repeated because the demuxer ignores the duration of
/// the final file.
pub fn concat_list(images: &[PathBuf], seconds: f64) -> String {
    let mut list = String::new();
    for image in images {
        list.push_str(&format!("file '{}'\nduration {seconds}\n", quote(image)));
    }
    if let Some(last) = images.last() {
        list.push_str(&format!("file '{}'\n", quote(last)));
    }
    list
}

fn quote(path: &Path) -> String {
    path.display().to_string().replace('\'', r"'\''")
}

#[async_trait]
impl VideoGenerator for FfmpegVideoGenerator {
    fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.config.output_file)
    }

    async fn render_static(&self, job: &RenderJob) -> Result<(), GeneratorError> {
        std::fs::create_dir_all(&self.output_dir)?;

        let concat = match &job.frames {
            FrameSource::Images(images) if images.len() > 1 => {
                let path = job.work_dir.join("frames.txt");
                std::fs::write(&path, concat_list(images, self.config.seconds_per_image))?;
                Some(path)
            }
            _ => None,
        };

        let output = self.output_path();
        let args = self.ffmpeg_args(job, concat.as_deref(), &output)?;
        let program = self.config.ffmpeg_program.clone();

        log::debug!("video: {program} {}", args.join(" "));

        tokio::task::spawn_blocking(move || run_command(&program, &args))
            .await
            .map_err(|e| GeneratorError::Internal(e.to_string()))??;

        log::info!("video: rendered {}", output.display());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
