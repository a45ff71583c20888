// Source acquisition
//
// Fetches the source video into the job's workspace and extracts the
// transcription audio next to it. `trending` discovers sources for batches.

pub mod trending;
pub mod ytdlp;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::config::AcquireConfig;
use crate::error::Result;
use crate::job::MediaAsset;
use crate::media::MediaProcessorTrait;

/// Output of the acquisition stage
#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredMedia {
    pub video: MediaAsset,
    /// Mono PCM audio for transcription
    pub audio: MediaAsset,
}

/// Main trait for acquisition
#[async_trait]
pub trait Acquirer: Send + Sync {
    /// Fetch `locator` into `workspace`; fails with an acquisition error
    async fn acquire(&self, locator: &str, workspace: &Path) -> Result<AcquiredMedia>;
}

/// Factory for creating acquirer instances
pub struct AcquirerFactory;

impl AcquirerFactory {
    pub fn create_default(config: AcquireConfig, media: Arc<dyn MediaProcessorTrait>) -> Box<dyn Acquirer> {
        Box::new(ytdlp::YtDlpAcquirer::new(config, media))
    }
}
