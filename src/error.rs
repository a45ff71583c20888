use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DubError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Acquisition error: {0}")]
    Acquisition(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Transcode error: {0}")]
    Transcode(String),

    #[error("Unreadable media asset: {0}")]
    Asset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Required tool not available: {0}")]
    ToolMissing(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse classification of a [`DubError`], recorded in job reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Acquisition,
    Transcription,
    Translation,
    Synthesis,
    Transcode,
    Asset,
    Io,
    Publish,
    Config,
    ToolMissing,
    Serialization,
    Http,
}

impl DubError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Acquisition(_) => ErrorKind::Acquisition,
            Self::Transcription(_) => ErrorKind::Transcription,
            Self::Translation(_) => ErrorKind::Translation,
            Self::Synthesis(_) => ErrorKind::Synthesis,
            Self::Transcode(_) => ErrorKind::Transcode,
            Self::Asset(_) => ErrorKind::Asset,
            Self::Io(_) => ErrorKind::Io,
            Self::Publish(_) => ErrorKind::Publish,
            Self::Config(_) => ErrorKind::Config,
            Self::ToolMissing(_) => ErrorKind::ToolMissing,
            Self::Json(_) => ErrorKind::Serialization,
            Self::Http(_) => ErrorKind::Http,
        }
    }
}

pub type Result<T> = std::result::Result<T, DubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(DubError::Transcode("x".into()).kind(), ErrorKind::Transcode);
        assert_eq!(
            DubError::Io(std::io::Error::other("disk full")).kind(),
            ErrorKind::Io
        );
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InvalidInput).unwrap();
        assert_eq!(json, "\"invalid_input\"");
    }
}
