use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::error::{Result, DubError};
use crate::job::MediaAsset;
use crate::media::{MediaProcessorTrait, MuxRequest};
use super::reconcile::{DubAction, DubPlan};
use super::scaler::AudioTimeScaler;

/// Lays the fitted dub over the attenuated original audio of a video
pub struct TrackMixer {
    media: Arc<dyn MediaProcessorTrait>,
    scaler: AudioTimeScaler,
    duration_tolerance: f64,
}

impl TrackMixer {
    pub fn new(media: Arc<dyn MediaProcessorTrait>, config: &SyncConfig) -> Self {
        Self {
            scaler: AudioTimeScaler::new(media.clone()),
            media,
            duration_tolerance: config.duration_tolerance,
        }
    }

    /// Apply the plan's action to the dub, writing any derived file into `scratch_dir`
    pub async fn prepare_dub(&self, plan: &DubPlan, scratch_dir: &Path) -> Result<MediaAsset> {
        let extension = plan
            .dub
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "mp3".to_string());

        match plan.action {
            DubAction::PassThrough => Ok(plan.dub.clone()),
            DubAction::Scaled { factor } => {
                let output = scratch_dir.join(format!("dub_scaled.{}", extension));
                self.scaler.scale(&plan.dub, factor, &output).await
            }
            DubAction::Truncated { target } => {
                let output = scratch_dir.join(format!("dub_truncated.{}", extension));
                info!(
                    "Dub needs {:.2}x, over the limit; truncating {:.2}s to {:.2}s",
                    plan.required_ratio, plan.dub.duration, target
                );
                self.media.trim_audio(&plan.dub.path, &output, target).await?;

                let written = self.media.probe(&output).await?.duration;
                if (written - target).abs() > self.duration_tolerance {
                    warn!(
                        "Truncated dub is {:.3}s, target {:.3}s (tolerance {:.3}s); final mix trims to the video length",
                        written, target, self.duration_tolerance
                    );
                }
                Ok(MediaAsset::audio(output, written.min(target)))
            }
        }
    }

    /// Produce the dubbed video at `output`.
    ///
    /// The original bed is scaled by `original_volume` and summed with the
    /// fitted dub on a timeline exactly as long as the video.
    pub async fn mix(
        &self,
        plan: &DubPlan,
        original_volume: f64,
        output: &Path,
        scratch_dir: &Path,
    ) -> Result<MediaAsset> {
        if !(0.0..=1.0).contains(&original_volume) {
            return Err(DubError::InvalidInput(format!(
                "original volume must be within [0, 1], got {}",
                original_volume
            )));
        }

        let video_probe = self.media.probe(&plan.video.path).await?;
        if !video_probe.has_video {
            return Err(DubError::Asset(format!(
                "{} has no video stream",
                plan.video.path.display()
            )));
        }

        let dub = self.prepare_dub(plan, scratch_dir).await?;
        self.media.probe(&dub.path).await?;

        let original_volume = if video_probe.has_audio {
            Some(original_volume)
        } else {
            info!("Source video has no audio track; using the dub alone");
            None
        };

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let request = MuxRequest {
            video: plan.video.path.clone(),
            dub: dub.path.clone(),
            output: output.to_path_buf(),
            duration: plan.video.duration,
            original_volume,
        };
        if let Err(e) = self.media.mux(&request).await {
            if let Err(cleanup) = tokio::fs::remove_file(output).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not remove partial output {}: {}", output.display(), cleanup);
                }
            }
            return Err(e);
        }

        info!(
            "Mixed {} dub ({:.3}x) into {}",
            plan.action.name(),
            plan.factor(),
            output.display()
        );
        Ok(MediaAsset::video(output, plan.video.duration))
    }
}
