use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, DubError};
use super::TranslationBackend;

/// Translation through the public Google Translate web endpoint
pub struct GoogleBackend {
    client: Client,
    config: TranslateConfig,
}

impl GoogleBackend {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!("{}/translate_a/single", self.config.endpoint.trim_end_matches('/'))
    }

    async fn request(&self, text: &str, target_language: &str) -> Result<String> {
        let response = self.client
            .get(self.url())
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| DubError::Translation(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DubError::Translation(format!("Google Translate returned {}", status)));
        }

        let body = response.text().await
            .map_err(|e| DubError::Translation(format!("Failed to read response: {}", e)))?;
        parse_response(&body)
    }
}

#[async_trait]
impl TranslationBackend for GoogleBackend {
    async fn translate_chunk(&self, text: &str, target_language: &str) -> Result<String> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            debug!("Google translation request {}/{}", attempt, attempts);
            match self.request(text, target_language).await {
                Ok(translation) => return Ok(translation),
                Err(e) => {
                    warn!("Translation attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DubError::Translation("no attempts made".to_string())))
    }

    async fn check_availability(&self) -> Result<()> {
        self.request("hello", "es").await?;
        info!("Google Translate is reachable");
        Ok(())
    }
}

/// The endpoint answers with nested arrays; the first element lists
/// `[translated, original, ...]` pairs per sentence
pub fn parse_response(body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| DubError::Translation(format!("Unexpected response: {}", e)))?;

    let segments = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| DubError::Translation("Response has no translation segments".to_string()))?;

    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    let text = text.trim();
    if text.is_empty() {
        return Err(DubError::Translation("Empty translation received".to_string()));
    }
    Ok(text.to_string())
}
