//! Duration metadata for uploaded audio.
//!
//! [`MediaProbe`] first reads a RIFF/WAV header with `hound` and falls
//! back to `ffprobe` for everything else (MP3, AAC, …).  Every probe returns
//! `None` when the duration cannot be determined; callers treat that as a
//! rejection.

use std::io::{Cursor, Read};
use std::path::Path;

use crate::generators::process::run_command;

/// Reads the playing time of an audio file.
pub trait DurationProbe: Send + Sync {
    /// Duration in seconds, or `None` if it cannot be determined.
    fn duration_secs(&self, path: &Path) -> Option<f64>;
}

// ---------------------------------------------------------------------------
// WAV header parsing
// ---------------------------------------------------------------------------

/// Reads the sample count and rate from a RIFF/WAVE header.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavHeaderProbe;

impl DurationProbe for WavHeaderProbe {
    fn duration_secs(&self, path: &Path) -> Option<f64> {
        match hound::WavReader::open(path) {
            Ok(reader) => reader_duration_secs(&reader),
            Err(e) => {
                log::debug!("probe: {} is not a readable WAV: {e}", path.display());
                None
            }
        }
    }
}

/// Duration of an in-memory WAV file.
pub fn wav_duration_secs(bytes: &[u8]) -> Option<f64> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).ok()?;
    reader_duration_secs(&reader)
}

fn reader_duration_secs<R: Read>(reader: &hound::WavReader<R>) -> Option<f64> {
    let rate = reader.spec().sample_rate;
    (rate > 0).then(|| f64::from(reader.duration()) / f64::from(rate))
}

// ---------------------------------------------------------------------------
// ffprobe
// ---------------------------------------------------------------------------

/// Asks `ffprobe` for `format=duration`.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: String,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl DurationProbe for FfprobeProbe {
    fn duration_secs(&self, path: &Path) -> Option<f64> {
        let args = vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "default=nokey=1:noprint_wrappers=1".to_string(),
            path.display().to_string(),
        ];

        let output = match run_command(&self.program, &args) {
            Ok(output) => output,
            Err(e) => {
                log::warn!("probe: {e}");
                return None;
            }
        };
        parse_seconds(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_seconds(raw: &str) -> Option<f64> {
    let secs = raw.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(secs)
}

// ---------------------------------------------------------------------------
// MediaProbe
// ---------------------------------------------------------------------------

/// WAV header first, `ffprobe` second.
#[derive(Debug, Clone, Default)]
pub struct MediaProbe {
    wav: WavHeaderProbe,
    ffprobe: FfprobeProbe,
}

impl MediaProbe {
    pub fn new(ffprobe_program: impl Into<String>) -> Self {
        Self {
            wav: WavHeaderProbe,
            ffprobe: FfprobeProbe::new(ffprobe_program),
        }
    }
}

impl DurationProbe for MediaProbe {
    fn duration_secs(&self, path: &Path) -> Option<f64> {
        self.wav
            .duration_secs(path)
            .or_else(|| self.ffprobe.duration_secs(path))
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------

/// Build a 16-bit mono PCM WAV file of `secs` seconds of silence.
#[cfg(test)]
pub fn silent_wav(secs: f64, sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut wav = Vec::new();
    let mut writer = hound::WavWriter::new(Cursor::new(&mut wav), spec).expect("wav writer");
    for _ in 0..(secs * f64::from(sample_rate)) as u32 {
        writer.write_sample(0i16).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
    wav
}

/// A probe that reports a fixed duration (or none) for every path.
#[cfg(test)]
pub struct FixedProbe(pub Option<f64>);

#[cfg(test)]
impl DurationProbe for FixedProbe {
    fn duration_secs(&self, _path: &Path) -> Option<f64> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_duration_of_generated_wav() {
        let wav = silent_wav(2.5, 8_000);
        let secs = wav_duration_secs(&wav).unwrap();
        assert!((secs - 2.5).abs() < 1e-3, "got {secs}");
    }

    #[test]
    fn skips_unknown_chunks_before_data() {
        let mut wav = silent_wav(1.0, 8_000);
        let data = wav.windows(4).position(|w| w == b"data").unwrap();
        let mut list = b"LIST".to_vec();
        list.extend_from_slice(&4u32.to_le_bytes());
        list.extend_from_slice(b"abcd");
        let riff_len = u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]) + list.len() as u32;
        wav[4..8].copy_from_slice(&riff_len.to_le_bytes());
        wav.splice(data..data, list);

        let secs = wav_duration_secs(&wav).unwrap();
        assert!((secs - 1.0).abs() < 1e-3, "got {secs}");
    }

    #[test]
    fn stereo_counts_frames_not_samples() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut wav = Vec::new();
        let mut writer = hound::WavWriter::new(Cursor::new(&mut wav), spec).unwrap();
        for _ in 0..2 * 16_000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let secs = wav_duration_secs(&wav).unwrap();
        assert!((secs - 2.0).abs() < 1e-3, "got {secs}");
    }

    #[test]
    fn non_wav_bytes_are_unknown() {
        assert!(wav_duration_secs(b"ID3\x03\x00 not a wav file").is_none());
        assert!(wav_duration_secs(b"").is_none());
    }

    #[test]
    fn data_before_fmt_is_unknown() {
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&12u32.to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&4u32.to_le_bytes());
        wav.extend_from_slice(&[0, 0, 0, 0]);
        assert!(wav_duration_secs(&wav).is_none());
    }

    #[test]
    fn header_probe_reads_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("sample.wav");
        std::fs::write(&path, silent_wav(3.0, 8_000)).unwrap();
        let secs = WavHeaderProbe.duration_secs(&path).unwrap();
        assert!((secs - 3.0).abs() < 1e-3);
    }

    #[test]
    fn missing_file_is_unknown() {
        let probe = MediaProbe::new("voiceup-no-such-ffprobe");
        assert!(probe
            .duration_secs(Path::new("/nonexistent/sample.mp3"))
            .is_none());
    }

    #[test]
    fn parse_seconds_rejects_garbage() {
        assert_eq!(parse_seconds(" 12.5\n"), Some(12.5));
        assert!(parse_seconds("N/A").is_none());
        assert!(parse_seconds("-1").is_none());
        assert!(parse_seconds("inf").is_none());
    }
}
