use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::SynthesizeConfig;
use crate::error::{Result, DubError};
use crate::job::MediaAsset;
use crate::media::MediaProcessorTrait;
use super::Synthesizer;

/// Synthesizer running the edge-tts CLI
pub struct EdgeTtsSynthesizer {
    config: SynthesizeConfig,
    media: Arc<dyn MediaProcessorTrait>,
}

impl EdgeTtsSynthesizer {
    pub fn new(config: SynthesizeConfig, media: Arc<dyn MediaProcessorTrait>) -> Self {
        Self { config, media }
    }

    /// The text goes through a file so long scripts never hit argv limits
    pub fn command_args(voice: &str, text_file: &Path, output: &Path) -> Vec<String> {
        vec![
            "--voice".to_string(),
            voice.to_string(),
            "--file".to_string(),
            text_file.to_string_lossy().to_string(),
            "--write-media".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

fn text_file_for(output: &Path) -> PathBuf {
    output.with_extension("txt")
}

#[async_trait]
impl Synthesizer for EdgeTtsSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> Result<MediaAsset> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DubError::Synthesis("nothing to synthesize".to_string()));
        }

        info!("Generating speech with voice {}", voice);

        let text_file = text_file_for(output);
        tokio::fs::write(&text_file, text).await
            .map_err(|e| DubError::Synthesis(format!("cannot write {}: {}", text_file.display(), e)))?;

        let args = Self::command_args(voice, &text_file, output);
        debug!("Executing {} {:?}", self.config.binary_path, args);

        let result = Command::new(&self.config.binary_path)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DubError::Synthesis(format!("Failed to execute {}: {}", self.config.binary_path, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(DubError::Synthesis(format!("edge-tts failed: {}", stderr.trim())));
        }

        let probe = self.media.probe(output).await
            .map_err(|e| DubError::Synthesis(format!("synthesized audio is unreadable: {}", e)))?;
        if probe.duration <= 0.0 {
            return Err(DubError::Synthesis("synthesized audio is empty".to_string()));
        }

        info!("Dub track generated: {:.2}s", probe.duration);
        Ok(MediaAsset::audio(output, probe.duration))
    }
}
