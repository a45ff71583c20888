// Translation
//
// `ChunkedTranslator` handles the size limits shared by every service; a
// `TranslationBackend` only has to translate one request worth of text.

pub mod chunking;
pub mod google;
pub mod ollama;

use async_trait::async_trait;

use crate::config::{TranslateConfig, TranslationBackendKind};
use crate::error::Result;

pub use chunking::ChunkedTranslator;

/// Main trait for translation operations
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` of any length into `target_language`
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

/// One translation service; requests never exceed the configured chunk threshold
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate_chunk(&self, text: &str, target_language: &str) -> Result<String>;

    /// Check that the service is reachable
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    pub fn create_backend(config: &TranslateConfig) -> Result<Box<dyn TranslationBackend>> {
        Ok(match config.backend {
            TranslationBackendKind::Google => Box::new(google::GoogleBackend::new(config.clone())?),
            TranslationBackendKind::Ollama => Box::new(ollama::OllamaBackend::new(config.clone())?),
        })
    }

    pub fn create_translator(config: &TranslateConfig) -> Result<Box<dyn Translator>> {
        let backend = Self::create_backend(config)?;
        Ok(Box::new(ChunkedTranslator::new(backend, config.chunk_threshold)))
    }
}

/// Full language name for a code, falling back to the code itself
pub fn language_name(code: &str) -> String {
    let base = code.split(['-', '_']).next().unwrap_or(code).to_lowercase();
    let name = match base.as_str() {
        "ar" => "Arabic",
        "bn" => "Bengali",
        "cs" => "Czech",
        "da" => "Danish",
        "de" => "German",
        "el" => "Greek",
        "en" => "English",
        "es" => "Spanish",
        "fi" => "Finnish",
        "fr" => "French",
        "he" => "Hebrew",
        "hi" => "Hindi",
        "hu" => "Hungarian",
        "id" => "Indonesian",
        "it" => "Italian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "nl" => "Dutch",
        "no" => "Norwegian",
        "pl" => "Polish",
        "pt" => "Portuguese",
        "ro" => "Romanian",
        "ru" => "Russian",
        "sv" => "Swedish",
        "th" => "Thai",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        "vi" => "Vietnamese",
        "zh" => "Chinese",
        _ => return code.to_string(),
    };
    name.to_string()
}
