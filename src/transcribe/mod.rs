// Speech-to-text
//
// To add a new transcription service, implement `Transcriber` for it and
// extend the factory.

pub mod whisper;

use async_trait::async_trait;
use std::path::Path;

use crate::config::TranscriberConfig;
use crate::error::Result;
use crate::job::{MediaAsset, Transcript};

/// Main trait for transcription operations
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the audio asset spoken in `source_language`; scratch files go under `workspace`
    async fn transcribe(&self, audio: &MediaAsset, source_language: &str, workspace: &Path) -> Result<Transcript>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Create with default implementation (whisper CLI)
    pub fn create_default(config: TranscriberConfig) -> Box<dyn Transcriber> {
        Box::new(whisper::WhisperTranscriber::new(config))
    }
}
