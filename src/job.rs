use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Result, DubError};

/// One end-to-end unit of work: one source video dubbed into one language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// URL or local path of the source video
    pub locator: String,
    pub target_language: String,
    /// File name of the finished video; derived from the locator when absent
    pub output_name: Option<String>,
    /// Keep the job's scratch directory after the run
    pub keep_temp: bool,
}

impl Job {
    pub fn new<S1, S2>(locator: S1, target_language: S2) -> Result<Self>
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        let locator = locator.into().trim().to_string();
        let target_language = target_language.into().trim().to_string();

        if locator.is_empty() {
            return Err(DubError::InvalidInput("job locator is empty".to_string()));
        }
        if target_language.is_empty() {
            return Err(DubError::InvalidInput("target language is empty".to_string()));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            locator,
            target_language,
            output_name: None,
            keep_temp: false,
        })
    }

    pub fn with_output_name<S: Into<String>>(mut self, name: Option<S>) -> Self {
        self.output_name = name.map(Into::into).filter(|n: &String| !n.trim().is_empty());
        self
    }

    pub fn keep_temp(mut self, keep: bool) -> Self {
        self.keep_temp = keep;
        self
    }

    /// Name of the finished video file
    pub fn resolved_output_name(&self) -> String {
        match &self.output_name {
            Some(name) => name.clone(),
            None => format!(
                "dubbed_{}_{}.mp4",
                sanitize_file_component(&source_id(&self.locator)),
                sanitize_file_component(&self.target_language)
            ),
        }
    }

    /// First eight hex digits of the job id
    pub fn short_id(&self) -> String {
        self.id.simple().to_string().chars().take(8).collect()
    }

    /// Resolved output name with the short id appended to its stem
    pub fn disambiguated_output_name(&self) -> String {
        let name = self.resolved_output_name();
        let path = Path::new(&name);
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| name.clone());
        match path.extension() {
            Some(ext) => format!("{}_{}.{}", stem, self.short_id(), ext.to_string_lossy()),
            None => format!("{}_{}", stem, self.short_id()),
        }
    }
}

/// Best-effort identifier for a source: `v=` parameter, last URL segment, or file stem
fn source_id(locator: &str) -> String {
    if locator.contains("://") {
        let query_id = locator
            .split_once("?v=")
            .or_else(|| locator.split_once("&v="))
            .and_then(|(_, rest)| rest.split(['&', '#']).next());
        if let Some(id) = query_id.filter(|id| !id.is_empty()) {
            return id.to_string();
        }

        let without_query = locator.split(['?', '#']).next().unwrap_or(locator);
        if let Some(segment) = without_query.trim_end_matches('/').rsplit('/').next() {
            if !segment.is_empty() {
                return segment.to_string();
            }
        }
        return "video".to_string();
    }

    Path::new(locator)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "video".to_string())
}

fn sanitize_file_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

/// A media file produced by one stage and consumed by the next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub kind: MediaKind,
    /// Duration in seconds
    pub duration: f64,
}

impl MediaAsset {
    pub fn video<P: Into<PathBuf>>(path: P, duration: f64) -> Self {
        Self { path: path.into(), kind: MediaKind::Video, duration }
    }

    pub fn audio<P: Into<PathBuf>>(path: P, duration: f64) -> Self {
        Self { path: path.into(), kind: MediaKind::Audio, duration }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub language: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_fields() {
        assert!(matches!(Job::new("  ", "es"), Err(DubError::InvalidInput(_))));
        assert!(matches!(Job::new("https://youtu.be/abc", ""), Err(DubError::InvalidInput(_))));
    }

    #[test]
    fn test_output_name_from_watch_url() {
        let job = Job::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10", "pt").unwrap();
        assert_eq!(job.resolved_output_name(), "dubbed_dQw4w9WgXcQ_pt.mp4");
    }

    #[test]
    fn test_output_name_from_shorts_url() {
        let job = Job::new("https://youtube.com/shorts/AbC123xyz_-?feature=share", "es").unwrap();
        assert_eq!(job.resolved_output_name(), "dubbed_AbC123xyz_-_es.mp4");
    }

    #[test]
    fn test_output_name_from_local_path() {
        let job = Job::new("/videos/my clip.mp4", "de").unwrap();
        assert_eq!(job.resolved_output_name(), "dubbed_my_clip_de.mp4");
    }

    #[test]
    fn test_explicit_output_name_wins() {
        let job = Job::new("https://youtube.com/shorts/abc", "es")
            .unwrap()
            .with_output_name(Some("final.mp4"));
        assert_eq!(job.resolved_output_name(), "final.mp4");

        let blank = Job::new("https://youtube.com/shorts/abc", "es")
            .unwrap()
            .with_output_name(Some("  "));
        assert_eq!(blank.resolved_output_name(), "dubbed_abc_es.mp4");
    }

    #[test]
    fn test_disambiguated_name_keeps_extension() {
        let job = Job::new("/videos/a/clip.mp4", "es").unwrap();
        let name = job.disambiguated_output_name();
        assert_eq!(name, format!("dubbed_clip_es_{}.mp4", job.short_id()));
        assert_eq!(job.short_id().len(), 8);

        let bare = Job::new("/videos/a/clip.mp4", "es").unwrap().with_output_name(Some("final"));
        assert_eq!(bare.disambiguated_output_name(), format!("final_{}", bare.short_id()));
    }

    #[test]
    fn test_jobs_get_distinct_ids() {
        let a = Job::new("a.mp4", "es").unwrap();
        let b = Job::new("a.mp4", "es").unwrap();
        assert_ne!(a.id, b.id);
    }
}
