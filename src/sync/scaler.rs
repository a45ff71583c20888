use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Result, DubError};
use crate::job::MediaAsset;
use crate::media::MediaProcessorTrait;

/// Tempo-only time scaling of audio assets.
///
/// A factor of exactly 1.0 copies the file byte for byte. Any other factor goes
/// through ffmpeg; if that fails the error is returned as is and no unscaled
/// copy is ever written in its place.
pub struct AudioTimeScaler {
    media: Arc<dyn MediaProcessorTrait>,
}

impl AudioTimeScaler {
    pub fn new(media: Arc<dyn MediaProcessorTrait>) -> Self {
        Self { media }
    }

    pub async fn scale(&self, input: &MediaAsset, factor: f64, output: &Path) -> Result<MediaAsset> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(DubError::InvalidInput(format!(
                "tempo factor must be positive, got {}",
                factor
            )));
        }

        if factor == 1.0 {
            debug!("Factor 1.0, copying {} unchanged", input.path.display());
            tokio::fs::copy(&input.path, output).await.map_err(|e| {
                DubError::Transcode(format!("cannot copy {}: {}", input.path.display(), e))
            })?;
            return Ok(MediaAsset::audio(output, input.duration));
        }

        info!(
            "Time-scaling {} by {:.3}x ({:.2}s -> ~{:.2}s)",
            input.path.display(),
            factor,
            input.duration,
            input.duration / factor
        );

        self.media.change_tempo(&input.path, output, factor).await?;

        let probe = self.media.probe(output).await.map_err(|e| {
            DubError::Transcode(format!("scaled output is unreadable: {}", e))
        })?;

        Ok(MediaAsset::audio(output, probe.duration))
    }
}
