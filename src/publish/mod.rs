// Publishing finished dubs

pub mod youtube;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::PublishConfig;
use crate::error::Result;
use crate::translate::language_name;

const MAX_TITLE_CHARS: usize = 100;

/// Metadata sent along with an upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// private, unlisted or public
    pub privacy: String,
    pub category_id: String,
}

impl VideoMetadata {
    pub fn new(title: impl Into<String>, config: &PublishConfig) -> Self {
        Self {
            title: truncate_title(&title.into()),
            description: String::new(),
            tags: Vec::new(),
            privacy: config.privacy.clone(),
            category_id: config.category_id.clone(),
        }
    }

    /// Default title, description and tags for a dub of `source_url`
    pub fn for_dub(original_title: &str, source_url: &str, language: &str, config: &PublishConfig) -> Self {
        let name = language_name(language);
        let description = format!(
            "This video has been dubbed into {name}!\n\n\
             Original: {source_url}\n\n\
             #shorts #{language} #dubbed #translated #{}",
            name.to_lowercase()
        );

        Self {
            description,
            tags: vec![
                "shorts".to_string(),
                "dubbed".to_string(),
                language.to_string(),
                "translated".to_string(),
                name.clone(),
            ],
            ..Self::new(format!("[{name} Dub] {original_title}"), config)
        }
    }
}

/// What the user asked for on the command line
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub title: String,
    /// Original video URL and dub language; enables the dub title, description and tags
    pub source: Option<(String, String)>,
    pub description: Option<String>,
    /// Comma-separated
    pub tags: Option<String>,
    pub privacy: Option<String>,
}

impl UploadRequest {
    /// Dub defaults when the source is known, then explicit values on top
    pub fn metadata(&self, config: &PublishConfig) -> VideoMetadata {
        let mut metadata = match &self.source {
            Some((url, language)) => VideoMetadata::for_dub(&self.title, url, language, config),
            None => VideoMetadata::new(self.title.as_str(), config),
        };
        if let Some(description) = &self.description {
            metadata.description = description.clone();
        }
        if let Some(tags) = &self.tags {
            metadata.tags = tags
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        }
        if let Some(privacy) = &self.privacy {
            metadata.privacy = privacy.clone();
        }
        metadata
    }
}

fn truncate_title(title: &str) -> String {
    title.trim().chars().take(MAX_TITLE_CHARS).collect()
}

/// Main trait for publishing
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Upload `video`; returns the remote id
    async fn publish(&self, video: &Path, metadata: &VideoMetadata) -> Result<String>;
}

/// Factory for creating publisher instances
pub struct PublisherFactory;

impl PublisherFactory {
    pub fn create_default(config: PublishConfig) -> Result<Box<dyn Publisher>> {
        Ok(Box::new(youtube::YoutubePublisher::new(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dub_metadata() {
        let metadata = VideoMetadata::for_dub(
            "Cat learns to skate",
            "https://youtube.com/shorts/abc",
            "es",
            &PublishConfig::default(),
        );
        assert_eq!(metadata.title, "[Spanish Dub] Cat learns to skate");
        assert!(metadata.description.contains("Original: https://youtube.com/shorts/abc"));
        assert!(metadata.description.contains("#spanish"));
        assert_eq!(metadata.privacy, "private");
        assert!(metadata.tags.contains(&"Spanish".to_string()));
    }

    #[test]
    fn test_upload_with_source_uses_dub_metadata() {
        let request = UploadRequest {
            title: "Cat learns to skate".to_string(),
            source: Some(("https://youtube.com/shorts/abc".to_string(), "pt".to_string())),
            privacy: Some("unlisted".to_string()),
            ..UploadRequest::default()
        };

        let metadata = request.metadata(&PublishConfig::default());
        assert_eq!(metadata.title, "[Portuguese Dub] Cat learns to skate");
        assert!(metadata.description.contains("https://youtube.com/shorts/abc"));
        assert!(metadata.tags.contains(&"pt".to_string()));
        assert_eq!(metadata.privacy, "unlisted");
    }

    #[test]
    fn test_upload_without_source_keeps_title_and_overrides() {
        let request = UploadRequest {
            title: "My dub".to_string(),
            description: Some("Hand written".to_string()),
            tags: Some("a, b,,c ".to_string()),
            ..UploadRequest::default()
        };

        let metadata = request.metadata(&PublishConfig::default());
        assert_eq!(metadata.title, "My dub");
        assert_eq!(metadata.description, "Hand written");
        assert_eq!(metadata.tags, vec!["a", "b", "c"]);
        assert_eq!(metadata.privacy, "private");
    }

    #[test]
    fn test_explicit_tags_replace_dub_tags() {
        let request = UploadRequest {
            title: "Clip".to_string(),
            source: Some(("https://youtube.com/shorts/abc".to_string(), "es".to_string())),
            tags: Some("custom".to_string()),
            ..UploadRequest::default()
        };
        assert_eq!(request.metadata(&PublishConfig::default()).tags, vec!["custom"]);
    }

    #[test]
    fn test_title_is_capped() {
        let metadata = VideoMetadata::new("x".repeat(150), &PublishConfig::default());
        assert_eq!(metadata.title.chars().count(), 100);
    }
}
