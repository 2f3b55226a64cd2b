//! VoiceUp: turn a story into narrated audio and a short video.
//!
//! The crate is organised leaf-first:
//! * [`credentials`] — provider keys held in memory only.
//! * [`config`] — TOML settings and platform paths.
//! * [`audio`] — duration probing and scoped voice-sample files.
//! * [`generators`] — the external story, voice and video collaborators.
//! * [`cache`] — process-wide memoization of generator calls.
//! * [`guard`] — stage preconditions.
//! * [`pipeline`] — session state, stage controllers and the orchestrator.

pub mod audio;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod generators;
pub mod guard;
pub mod pipeline;
