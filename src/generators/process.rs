//! Blocking helpers for running external media tools (`ffmpeg`, `ffprobe`).
//!
//! Call these from `tokio::task::spawn_blocking`; they wait for the child
//! process to exit.

use std::process::{Command, Output, Stdio};

use super::GeneratorError;

/// Run `program` with `args`, capturing stdout and stderr.
///
/// A missing binary, a spawn failure, or a non-zero exit status all map to
/// [`GeneratorError::Command`]; the trimmed stderr is kept in the detail.
pub fn run_command(program: &str, args: &[String]) -> Result<Output, GeneratorError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| GeneratorError::Command {
            command: program.to_string(),
            detail: if e.kind() == std::io::ErrorKind::NotFound {
                format!("`{program}` not found on PATH")
            } else {
                e.to_string()
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let detail = if stderr.is_empty() {
            output.status.to_string()
        } else {
            format!("{}; stderr: {stderr}", output.status)
        };
        return Err(GeneratorError::Command {
            command: program.to_string(),
            detail,
        });
    }

    Ok(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
