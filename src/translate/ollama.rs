use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, DubError};
use super::{language_name, TranslationBackend};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Translation through a local Ollama model
pub struct OllamaBackend {
    client: Client,
    config: TranslateConfig,
}

impl OllamaBackend {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    async fn request(&self, text: &str, target_language: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: build_prompt(text, target_language),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));
        debug!("Sending translation request to: {}", url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DubError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DubError::Translation(format!(
                "Ollama API error {}: {}", status, error_text
            )));
        }

        let generated: GenerateResponse = response.json().await
            .map_err(|e| DubError::Translation(format!("Failed to parse response: {}", e)))?;

        parse_model_output(&generated.response)
    }
}

#[async_trait]
impl TranslationBackend for OllamaBackend {
    async fn translate_chunk(&self, text: &str, target_language: &str) -> Result<String> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
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
        let url = format!("{}/api/show", self.config.endpoint.trim_end_matches('/'));

        let response = self.client
            .post(&url)
            .json(&json!({ "name": self.config.model }))
            .send()
            .await
            .map_err(|e| DubError::Translation(format!("Failed to connect to Ollama: {}", e)))?;

        if response.status().is_success() {
            info!("Ollama model '{}' is available", self.config.model);
            Ok(())
        } else {
            Err(DubError::Translation(format!(
                "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
                self.config.model, self.config.model
            )))
        }
    }
}

/// Prompt asking for a JSON `{"text": ...}` translation
pub fn build_prompt(text: &str, target_language: &str) -> String {
    let name = language_name(target_language);
    format!(
        "You are a professional translator.\n\
         \n\
         CRITICAL: You must translate the text to {} ONLY. Do not translate to any other language.\n\
         The target language is: {} (language code: {})\n\
         \n\
         Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
         Do not include any explanations, alternatives, or text in other languages.\n\
         \n\
         [Text to translate]\n\
         {}\n",
        name, name, target_language, name, text
    )
}

/// Extract the translation from the model's reply
pub fn parse_model_output(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DubError::Translation("Empty translation received".to_string()));
    }

    if let Ok(result) = serde_json::from_str::<TranslationResult>(raw) {
        let text = result.text.trim();
        if text.is_empty() {
            return Err(DubError::Translation("Empty translation received".to_string()));
        }
        return Ok(text.to_string());
    }

    Ok(clean_response(raw))
}

/// Drop the chatter models sometimes wrap around a plain-text answer
fn clean_response(response: &str) -> String {
    let is_chatter = |line: &str| {
        line.starts_with("Here is")
            || line.starts_with("Here are")
            || line.starts_with("Translation:")
            || line.starts_with("Option")
            || line.starts_with("**Option")
            || (line.starts_with("**") && line.ends_with("**"))
    };

    let kept: Vec<&str> = response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_chatter(line))
        .collect();

    if kept.is_empty() {
        response.trim().to_string()
    } else {
        kept.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_language() {
        let prompt = build_prompt("Hello", "es");
        assert!(prompt.contains("to Spanish ONLY"));
        assert!(prompt.contains("language code: es"));
        assert!(prompt.ends_with("Hello\n"));
    }

    #[test]
    fn test_parse_json_reply() {
        assert_eq!(parse_model_output(r#"{"text": " Hola mundo "}"#).unwrap(), "Hola mundo");
    }

    #[test]
    fn test_parse_plain_reply_drops_chatter() {
        let raw = "Here is the translation:\n\nHola mundo.\n¿Cómo estás?";
        assert_eq!(parse_model_output(raw).unwrap(), "Hola mundo. ¿Cómo estás?");
    }

    #[test]
    fn test_empty_reply_is_error() {
        assert!(matches!(parse_model_output("  "), Err(DubError::Translation(_))));
        assert!(matches!(parse_model_output(r#"{"text": ""}"#), Err(DubError::Translation(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_translation_error() {
        let backend = OllamaBackend::new(TranslateConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            max_retries: 1,
            timeout_secs: 2,
            ..TranslateConfig::default()
        })
        .unwrap();

        let err = backend.translate_chunk("Hello", "es").await.unwrap_err();
        assert!(matches!(err, DubError::Translation(_)));
    }
}
