//! globaldub - Automated Video Dubbing Workflow
//!
//! Downloads short videos, transcribes and translates their speech, synthesizes
//! a dub in the target language and mixes it over the original audio, keeping
//! the output exactly as long as the source video.

pub mod acquire;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod media;
pub mod pipeline;
pub mod publish;
pub mod setup;
pub mod sync;
pub mod synthesize;
pub mod transcribe;
pub mod translate;
pub mod workspace;
