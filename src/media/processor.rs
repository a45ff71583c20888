use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, debug};

use crate::config::MediaConfig;
use crate::error::{Result, DubError};
use super::{filters, MediaCommandBuilder, MediaProbe, MediaProcessorTrait, MuxCodecs, MuxRequest};

/// Sample rate whisper expects
const TRANSCRIPTION_SAMPLE_RATE: u32 = 16000;

/// Subset of `ffprobe -print_format json -show_format -show_streams`
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    duration: Option<String>,
}

/// Parse ffprobe JSON into a [`MediaProbe`]
pub fn parse_probe_output(json: &[u8], path: &Path) -> Result<MediaProbe> {
    let output: ProbeOutput = serde_json::from_slice(json)
        .map_err(|e| DubError::Asset(format!("{}: unreadable probe output: {}", path.display(), e)))?;

    let has_stream = |kind: &str| {
        output.streams.iter().any(|s| s.codec_type.as_deref() == Some(kind))
    };
    let has_audio = has_stream("audio");
    let has_video = has_stream("video");

    if !has_audio && !has_video {
        return Err(DubError::Asset(format!("{}: no audio or video streams", path.display())));
    }

    let container_duration = output
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok());
    let stream_duration = output
        .streams
        .iter()
        .filter_map(|s| s.duration.as_deref().and_then(|d| d.parse::<f64>().ok()))
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))));

    let duration = container_duration
        .or(stream_duration)
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| DubError::Asset(format!("{}: duration is unknown", path.display())))?;

    Ok(MediaProbe { duration, has_audio, has_video })
}

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path, &config.probe_path);

        Self {
            config,
            command_builder,
        }
    }

    fn codecs(&self) -> MuxCodecs {
        MuxCodecs {
            video_codec: self.config.video_codec.clone(),
            audio_codec: self.config.audio_codec.clone(),
            audio_bitrate: self.config.audio_bitrate.clone(),
            encoding_options: self.config.encoding_options.clone(),
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn probe(&self, path: &Path) -> Result<MediaProbe> {
        if !path.is_file() {
            return Err(DubError::Asset(format!("{} does not exist", path.display())));
        }

        let stdout = self.command_builder.probe(path).run().await?;
        let probe = parse_probe_output(&stdout, path)?;
        debug!("Probed {}: {:?}", path.display(), probe);
        Ok(probe)
    }

    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        self.command_builder
            .extract_audio(video_path, audio_path, TRANSCRIPTION_SAMPLE_RATE)
            .execute()
            .await?;

        info!("Audio extraction completed");
        Ok(())
    }

    async fn change_tempo(&self, input: &Path, output: &Path, factor: f64) -> Result<()> {
        info!("Changing tempo of {} by {:.3}x", input.display(), factor);

        self.command_builder
            .change_tempo(input, output, factor)
            .execute()
            .await
    }

    async fn trim_audio(&self, input: &Path, output: &Path, duration: f64) -> Result<()> {
        info!("Trimming {} to {:.3}s", input.display(), duration);

        self.command_builder
            .trim_audio(input, output, duration)
            .execute()
            .await
    }

    async fn mux(&self, request: &MuxRequest) -> Result<()> {
        info!(
            "Muxing {} + {} -> {} ({:.3}s)",
            request.video.display(),
            request.dub.display(),
            request.output.display(),
            request.duration
        );

        let command = self.command_builder.mux_dub(
            &request.video,
            &request.dub,
            &request.output,
            request.duration,
            request.original_volume,
            &self.codecs(),
        );

        let output = command.run_raw().await.map_err(|e| {
            DubError::ToolMissing(format!("Failed to execute {}: {}", command.binary_path, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(filters::classify_mux_failure(&stderr));
        }

        info!("Mux completed");
        Ok(())
    }
}
