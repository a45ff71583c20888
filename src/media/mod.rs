// Media processing architecture
//
// This module is the only place that talks to ffmpeg/ffprobe:
// - Commands: command builders and execution
// - Filters: pure filter-graph construction
// - Processor: FFmpeg-backed implementation of the trait below

pub mod commands;
pub mod filters;
pub mod processor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// What ffprobe reports about a media file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaProbe {
    /// Duration in seconds
    pub duration: f64,
    pub has_audio: bool,
    pub has_video: bool,
}

/// Inputs of the final mux
#[derive(Debug, Clone, PartialEq)]
pub struct MuxRequest {
    pub video: PathBuf,
    pub dub: PathBuf,
    pub output: PathBuf,
    /// Length of the output timeline in seconds
    pub duration: f64,
    /// Gain of the original audio; `None` when the video has no audio stream
    pub original_volume: Option<f64>,
}

/// Main trait for media processing operations
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Probe duration and stream layout; unreadable files fail with an asset error
    async fn probe(&self, path: &Path) -> Result<MediaProbe>;

    /// Extract mono PCM audio suitable for transcription
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()>;

    /// Tempo-only change by `factor`; failures are transcode errors
    async fn change_tempo(&self, input: &Path, output: &Path, factor: f64) -> Result<()>;

    /// Cut audio to `duration` seconds
    async fn trim_audio(&self, input: &Path, output: &Path, duration: f64) -> Result<()>;

    /// Write the video stream with the mixed bed and dub
    async fn mux(&self, request: &MuxRequest) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Arc<dyn MediaProcessorTrait> {
        Arc::new(processor::MediaProcessorImpl::new(config))
    }
}
