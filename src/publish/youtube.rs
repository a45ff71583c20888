use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{AUTHORIZATION, CONTENT_RANGE, LOCATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::config::PublishConfig;
use crate::error::{Result, DubError};
use super::{Publisher, VideoMetadata};

const TOKEN_ENV: &str = "YOUTUBE_ACCESS_TOKEN";

#[derive(Debug, Deserialize)]
struct UploadedVideo {
    id: String,
}

/// Resumable uploads to the YouTube Data API v3
pub struct YoutubePublisher {
    client: Client,
    config: PublishConfig,
}

impl YoutubePublisher {
    pub fn new(config: PublishConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn access_token(&self) -> Result<String> {
        self.config
            .access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var(TOKEN_ENV).ok().filter(|t| !t.trim().is_empty()))
            .ok_or_else(|| {
                DubError::Publish(format!(
                    "no access token: set publish.access_token or {}",
                    TOKEN_ENV
                ))
            })
    }

    async fn start_session(&self, token: &str, metadata: &VideoMetadata, size: u64) -> Result<String> {
        let body = json!({
            "snippet": {
                "title": metadata.title,
                "description": metadata.description,
                "tags": metadata.tags,
                "categoryId": metadata.category_id,
            },
            "status": {
                "privacyStatus": metadata.privacy,
                "selfDeclaredMadeForKids": false,
            }
        });

        let response = self.client
            .post(&self.config.endpoint)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", size.to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| DubError::Publish(format!("upload session request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| DubError::Publish("upload session has no Location header".to_string()))
    }
}

#[async_trait]
impl Publisher for YoutubePublisher {
    async fn publish(&self, video: &Path, metadata: &VideoMetadata) -> Result<String> {
        let token = self.access_token()?;
        let size = tokio::fs::metadata(video).await?.len();
        if size == 0 {
            return Err(DubError::InvalidInput(format!("{} is empty", video.display())));
        }

        info!("Uploading {}: {}", video.display(), metadata.title);
        let session = self.start_session(&token, metadata, size).await?;
        debug!("Resumable session: {}", session);

        let pb = ProgressBar::new(size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut file = tokio::fs::File::open(video).await?;
        let chunk_size = self.config.chunk_size.max(1);
        let mut buffer = vec![0u8; chunk_size];
        let mut offset = 0u64;

        loop {
            let mut filled = 0;
            while filled < chunk_size {
                let read = file.read(&mut buffer[filled..]).await?;
                if read == 0 {
                    break;
                }
                filled += read;
            }
            if filled == 0 {
                pb.abandon();
                return Err(DubError::Publish("upload ended before the server confirmed it".to_string()));
            }

            let response = self.client
                .put(&session)
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .header(CONTENT_RANGE, content_range(offset, filled as u64, size))
                .body(buffer[..filled].to_vec())
                .send()
                .await
                .map_err(|e| DubError::Publish(format!("chunk upload failed: {}", e)))?;

            offset += filled as u64;
            pb.set_position(offset);

            let status = response.status();
            if status.as_u16() == 308 {
                continue;
            }
            if status.is_success() {
                let uploaded: UploadedVideo = response.json().await
                    .map_err(|e| DubError::Publish(format!("unexpected upload response: {}", e)))?;
                pb.finish_with_message("uploaded");
                info!("Upload complete: https://youtube.com/shorts/{}", uploaded.id);
                return Ok(uploaded.id);
            }

            pb.abandon();
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }
    }
}

/// `Content-Range` value for `len` bytes at `start` of a `total`-byte upload
pub fn content_range(start: u64, len: u64, total: u64) -> String {
    format!("bytes {}-{}/{}", start, start + len - 1, total)
}

fn status_error(status: StatusCode, body: &str) -> DubError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DubError::Publish(format!("authorization rejected ({}): {}", status, body.trim()))
        }
        _ => DubError::Publish(format!("YouTube API error {}: {}", status, body.trim())),
    }
}
