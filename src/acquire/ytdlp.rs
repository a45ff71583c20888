use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::AcquireConfig;
use crate::error::{Result, DubError};
use crate::job::MediaAsset;
use crate::media::MediaProcessorTrait;
use super::{AcquiredMedia, Acquirer};

const VIDEO_FILE: &str = "source_video.mp4";
const AUDIO_FILE: &str = "source_audio.wav";

/// Downloads with yt-dlp; existing local files are copied instead
pub struct YtDlpAcquirer {
    config: AcquireConfig,
    media: Arc<dyn MediaProcessorTrait>,
}

impl YtDlpAcquirer {
    pub fn new(config: AcquireConfig, media: Arc<dyn MediaProcessorTrait>) -> Self {
        Self { config, media }
    }

    /// yt-dlp arguments for downloading `url` to `output`
    pub fn download_args(&self, url: &str, output: &Path) -> Vec<String> {
        vec![
            "-f".to_string(),
            self.config.format.clone(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "-o".to_string(),
            output.to_string_lossy().to_string(),
            "--no-playlist".to_string(),
            "--socket-timeout".to_string(),
            self.config.socket_timeout.to_string(),
            "--retries".to_string(),
            self.config.retries.to_string(),
            url.to_string(),
        ]
    }

    async fn download(&self, url: &str, output: &Path) -> Result<()> {
        info!("Downloading video from: {}", url);

        let args = self.download_args(url, output);
        debug!("Executing {} {:?}", self.config.binary_path, args);

        let result = Command::new(&self.config.binary_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DubError::Acquisition(format!("Failed to execute {}: {}", self.config.binary_path, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(DubError::Acquisition(format!("yt-dlp failed: {}", stderr.trim())));
        }

        if !output.is_file() {
            return Err(DubError::Acquisition(format!(
                "yt-dlp finished but {} was not written",
                output.display()
            )));
        }

        info!("Video downloaded");
        Ok(())
    }
}

#[async_trait]
impl Acquirer for YtDlpAcquirer {
    async fn acquire(&self, locator: &str, workspace: &Path) -> Result<AcquiredMedia> {
        let video_path = workspace.join(VIDEO_FILE);
        let audio_path = workspace.join(AUDIO_FILE);

        let local = Path::new(locator);
        if !locator.contains("://") && local.is_file() {
            info!("Using local file {}", local.display());
            tokio::fs::copy(local, &video_path).await.map_err(|e| {
                DubError::Acquisition(format!("cannot copy {}: {}", local.display(), e))
            })?;
        } else if locator.contains("://") {
            self.download(locator, &video_path).await?;
        } else {
            return Err(DubError::Acquisition(format!(
                "{} is neither a URL nor an existing file",
                locator
            )));
        }

        let probe = self.media.probe(&video_path).await.map_err(|e| {
            DubError::Acquisition(format!("downloaded video is unreadable: {}", e))
        })?;
        if !probe.has_audio {
            return Err(DubError::Acquisition(
                "source video has no audio track to transcribe".to_string(),
            ));
        }

        info!("Extracting audio...");
        self.media
            .extract_audio(&video_path, &audio_path)
            .await
            .map_err(|e| DubError::Acquisition(e.to_string()))?;

        Ok(AcquiredMedia {
            video: MediaAsset::video(video_path, probe.duration),
            audio: MediaAsset::audio(audio_path, probe.duration),
        })
    }
}
