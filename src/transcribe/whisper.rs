use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, DubError};
use crate::job::{MediaAsset, Transcript};
use super::Transcriber;

/// Subdirectory of the job workspace receiving whisper's output files
const OUTPUT_SUBDIR: &str = "whisper";

/// Fields we need from the whisper CLI's JSON output
#[derive(Debug, Clone, Deserialize)]
pub struct WhisperOutput {
    pub text: String,
    pub language: Option<String>,
}

/// Convert whisper JSON into a transcript, rejecting empty speech
pub fn parse_whisper_output(json: &str, source_language: &str) -> Result<Transcript> {
    let output: WhisperOutput = serde_json::from_str(json)
        .map_err(|e| DubError::Transcription(format!("Failed to parse whisper JSON: {}", e)))?;

    let text = output.text.trim().to_string();
    if text.is_empty() {
        return Err(DubError::Transcription("no speech detected".to_string()));
    }

    Ok(Transcript {
        text,
        language: output.language.unwrap_or_else(|| source_language.to_string()),
    })
}

/// Transcriber running the openai-whisper CLI
pub struct WhisperTranscriber {
    config: TranscriberConfig,
}

impl WhisperTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &MediaAsset, source_language: &str, workspace: &Path) -> Result<Transcript> {
        info!(
            "Transcribing {} with whisper ({} model)",
            audio.path.display(),
            self.config.model
        );

        let output_dir = workspace.join(OUTPUT_SUBDIR);
        tokio::fs::create_dir_all(&output_dir).await
            .map_err(|e| DubError::Transcription(format!("Failed to create output directory: {}", e)))?;

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg(&audio.path)
            .arg("--model").arg(&self.config.model)
            .arg("--language").arg(source_language)
            .arg("--task").arg("transcribe")
            .arg("--fp16").arg("False")
            .arg("--output_dir").arg(&output_dir)
            .arg("--output_format").arg("json")
            .kill_on_drop(true);

        debug!("Executing whisper command: {:?}", cmd);

        let output = cmd.output().await
            .map_err(|e| DubError::Transcription(format!("Failed to execute whisper: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DubError::Transcription(format!("Whisper failed: {}", stderr.trim())));
        }

        let json_file = whisper_json_path(&output_dir, &audio.path)
            .ok_or_else(|| DubError::Transcription("Invalid audio filename".to_string()))?;

        let json_content = tokio::fs::read_to_string(&json_file).await
            .map_err(|e| DubError::Transcription(format!("Failed to read output: {}", e)))?;

        let transcript = parse_whisper_output(&json_content, source_language)?;
        info!("Transcription complete: {} characters", transcript.text.chars().count());
        debug!("Transcript: {}", transcript.text);
        Ok(transcript)
    }
}

/// whisper names its JSON after the audio file's stem
fn whisper_json_path(output_dir: &Path, audio: &Path) -> Option<PathBuf> {
    audio
        .file_stem()
        .map(|stem| output_dir.join(format!("{}.json", stem.to_string_lossy())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_text_and_keeps_language() {
        let json = r#"{"text": "  Hello there. ", "segments": [], "language": "en"}"#;
        let transcript = parse_whisper_output(json, "en").unwrap();
        assert_eq!(transcript.text, "Hello there.");
        assert_eq!(transcript.language, "en");
    }

    #[test]
    fn test_parse_defaults_language() {
        let transcript = parse_whisper_output(r#"{"text": "Hi"}"#, "fr").unwrap();
        assert_eq!(transcript.language, "fr");
    }

    #[test]
    fn test_empty_speech_is_an_error() {
        assert!(matches!(
            parse_whisper_output(r#"{"text": "   "}"#, "en"),
            Err(DubError::Transcription(_))
        ));
    }

    #[test]
    fn test_json_path_follows_audio_stem() {
        let path = whisper_json_path(Path::new("/tmp/out"), Path::new("/w/source_audio.wav")).unwrap();
        assert_eq!(path, Path::new("/tmp/out/source_audio.json"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_transcription_error() {
        let workspace = tempfile::tempdir().unwrap();
        let transcriber = WhisperTranscriber::new(TranscriberConfig {
            binary_path: "globaldub-no-such-whisper".to_string(),
            ..TranscriberConfig::default()
        });
        let err = transcriber
            .transcribe(&MediaAsset::audio("/tmp/a.wav", 1.0), "en", workspace.path())
            .await
            .unwrap_err();
        assert!(matches!(err, DubError::Transcription(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_is_written_inside_workspace() {
        use std::os::unix::fs::PermissionsExt;

        let tools = tempfile::tempdir().unwrap();
        let script = tools.path().join("whisper");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             while [ $# -gt 0 ]; do\n\
               if [ \"$1\" = \"--output_dir\" ]; then out=\"$2\"; fi\n\
               shift\n\
             done\n\
             printf '{\"text\": \" Hello from the job. \"}' > \"$out/source_audio.json\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let workspace = tempfile::tempdir().unwrap();
        let transcriber = WhisperTranscriber::new(TranscriberConfig {
            binary_path: script.to_string_lossy().to_string(),
            ..TranscriberConfig::default()
        });
        let audio = MediaAsset::audio(workspace.path().join("source_audio.wav"), 3.0);

        let transcript = transcriber.transcribe(&audio, "en", workspace.path()).await.unwrap();

        assert_eq!(transcript.text, "Hello from the job.");
        assert!(workspace.path().join(OUTPUT_SUBDIR).join("source_audio.json").is_file());
    }
}
