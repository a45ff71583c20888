use serde::Serialize;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{DubError, Result};

/// An external program the pipeline shells out to
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequirement {
    pub name: &'static str,
    pub binary: String,
    pub version_arg: &'static str,
    pub install_hint: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub binary: String,
    pub available: bool,
    /// First line of the version output, or the reason the check failed
    pub detail: String,
    pub install_hint: String,
}

/// Verifies that every configured external tool can be executed
pub struct DependencyChecker {
    requirements: Vec<ToolRequirement>,
}

impl DependencyChecker {
    pub fn new(requirements: Vec<ToolRequirement>) -> Self {
        Self { requirements }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(vec![
            ToolRequirement {
                name: "ffmpeg",
                binary: config.media.binary_path.clone(),
                version_arg: "-version",
                install_hint: "install ffmpeg from your package manager (apt install ffmpeg / brew install ffmpeg)",
            },
            ToolRequirement {
                name: "ffprobe",
                binary: config.media.probe_path.clone(),
                version_arg: "-version",
                install_hint: "ffprobe ships with ffmpeg",
            },
            ToolRequirement {
                name: "yt-dlp",
                binary: config.acquire.binary_path.clone(),
                version_arg: "--version",
                install_hint: "pip install yt-dlp",
            },
            ToolRequirement {
                name: "whisper",
                binary: config.transcriber.binary_path.clone(),
                version_arg: "--help",
                install_hint: "pip install openai-whisper",
            },
            ToolRequirement {
                name: "edge-tts",
                binary: config.synthesize.binary_path.clone(),
                version_arg: "--version",
                install_hint: "pip install edge-tts",
            },
        ])
    }

    pub fn requirements(&self) -> &[ToolRequirement] {
        &self.requirements
    }

    pub async fn check(requirement: &ToolRequirement) -> ToolStatus {
        let result = Command::new(&requirement.binary)
            .arg(requirement.version_arg)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        let (available, detail) = match result {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let first = stdout.lines().next().unwrap_or("").trim().to_string();
                (true, if first.is_empty() { "ok".to_string() } else { first })
            }
            Ok(output) => (false, format!("exited with {}", output.status)),
            Err(e) => (false, e.to_string()),
        };

        ToolStatus {
            name: requirement.name.to_string(),
            binary: requirement.binary.clone(),
            available,
            detail,
            install_hint: requirement.install_hint.to_string(),
        }
    }

    pub async fn check_all(&self) -> Vec<ToolStatus> {
        let mut statuses = Vec::with_capacity(self.requirements.len());
        for requirement in &self.requirements {
            let status = Self::check(requirement).await;
            if status.available {
                info!("{} found: {}", status.name, status.detail);
            } else {
                warn!("{} not available ({}): {}", status.name, status.binary, status.detail);
            }
            statuses.push(status);
        }
        statuses
    }

    /// Fail with a `ToolMissing` error naming every unavailable tool
    pub async fn ensure_all(&self) -> Result<()> {
        let missing: Vec<String> = self
            .check_all()
            .await
            .into_iter()
            .filter(|s| !s.available)
            .map(|s| format!("{} ({})", s.name, s.install_hint))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DubError::ToolMissing(missing.join(", ")))
        }
    }
}

/// Create the output and temp directories named in the configuration
pub fn prepare_directories(config: &Config) -> Result<()> {
    std::fs::create_dir_all(&config.paths.output_dir)?;
    std::fs::create_dir_all(&config.paths.temp_dir)?;
    Ok(())
}

/// Checks run before any dubbing work starts: every tool must be installed,
/// then the working directories are created
pub async fn preflight(config: &Config) -> Result<()> {
    DependencyChecker::from_config(config).ensure_all().await?;
    prepare_directories(config)
}
