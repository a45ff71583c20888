use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{DubError, Result};
use crate::job::Job;
use crate::pipeline::{JobReport, Pipeline};

/// File extensions picked up when a batch source is a directory
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm", "avi", "m4v"];

/// Reports of a batch, in job order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<JobReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Batch report written to {}", path.display());
        Ok(())
    }
}

/// Runs jobs one after another; a failing job never stops the batch
pub struct BatchRunner {
    pipeline: Pipeline,
    show_progress: bool,
}

impl BatchRunner {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline, show_progress: false }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub async fn run(&self, jobs: &[Job]) -> BatchReport {
        let started_at = Utc::now();
        info!("Processing batch of {} jobs", jobs.len());

        let pb = self.progress_bar(jobs.len() as u64);
        let mut results = Vec::with_capacity(jobs.len());
        let mut claimed = HashSet::new();

        for (idx, job) in jobs.iter().enumerate() {
            pb.set_message(job.locator.clone());
            info!("Batch job {}/{}: {}", idx + 1, jobs.len(), job.locator);

            let job = claim_output_name(job, &mut claimed);
            let report = self.pipeline.run(&job).await;
            if !report.is_success() {
                warn!("Batch job {}/{} failed, continuing", idx + 1, jobs.len());
            }
            results.push(report);
            pb.inc(1);
        }
        pb.finish_and_clear();

        let report = BatchReport {
            results,
            started_at,
            finished_at: Utc::now(),
        };
        info!("Batch finished: {} succeeded, {} failed", report.succeeded(), report.failed());
        report
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

/// `job` with an output name that no earlier job of the batch resolved to
fn claim_output_name(job: &Job, claimed: &mut HashSet<String>) -> Job {
    let name = job.resolved_output_name();
    if claimed.insert(name.clone()) {
        return job.clone();
    }

    let unique = job.disambiguated_output_name();
    warn!("{} is already taken in this batch, writing {} instead", name, unique);
    claimed.insert(unique.clone());
    job.clone().with_output_name(Some(unique))
}

/// Locators of a batch source.
///
/// A directory yields its video files (recursively, sorted); a file yields one
/// locator per line, skipping blank lines and `#` comments.
pub fn load_locators<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();

    if path.is_dir() {
        let mut files: Vec<String> = WalkDir::new(path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .map(|ext| ext.to_string_lossy().to_lowercase())
                    .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
            })
            .map(|entry| entry.path().to_string_lossy().to_string())
            .collect();
        files.sort();
        return Ok(files);
    }

    if path.is_file() {
        let content = std::fs::read_to_string(path)?;
        return Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect());
    }

    Err(DubError::InvalidInput(format!(
        "{} is neither a directory nor a list file",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pipeline::testing::{fake_pipeline, BROKEN};
    use crate::pipeline::{JobOutcome, PipelineStage};
    use assert_fs::prelude::*;

    #[tokio::test]
    async fn test_failed_job_does_not_stop_batch() {
        let root = tempfile::tempdir().unwrap();
        let (pipeline, _media) = fake_pipeline(root.path(), 30.0, 28.0);
        let runner = BatchRunner::new(pipeline);

        let jobs = vec![
            Job::new("https://youtube.com/shorts/one", "es").unwrap(),
            Job::new(format!("https://youtube.com/shorts/{}", BROKEN), "es").unwrap(),
            Job::new("https://youtube.com/shorts/three", "es").unwrap(),
        ];

        let report = runner.run(&jobs).await;

        assert_eq!(report.results.len(), 3);
        assert!(report.results[0].is_success());
        match &report.results[1].outcome {
            JobOutcome::Failed { stage, kind, .. } => {
                assert_eq!(*stage, PipelineStage::Acquiring);
                assert_eq!(*kind, ErrorKind::Acquisition);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(report.results[2].is_success());
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_succeeded());

        let ids: Vec<_> = report.results.iter().map(|r| r.job.id).collect();
        assert_eq!(ids, jobs.iter().map(|j| j.id).collect::<Vec<_>>());
        assert!(root.path().join("output/dubbed_one_es.mp4").exists());
        assert!(root.path().join("output/dubbed_three_es.mp4").exists());
    }

    #[tokio::test]
    async fn test_same_file_name_in_different_directories_gets_distinct_outputs() {
        let root = tempfile::tempdir().unwrap();
        let (pipeline, _media) = fake_pipeline(root.path(), 30.0, 28.0);
        let jobs = vec![
            Job::new("/videos/a/clip.mp4", "es").unwrap(),
            Job::new("/videos/b/clip.mp4", "es").unwrap(),
        ];

        let report = BatchRunner::new(pipeline).run(&jobs).await;

        let outputs: Vec<_> = report
            .results
            .iter()
            .map(|r| match &r.outcome {
                JobOutcome::Done { output, .. } => output.clone(),
                other => panic!("expected success, got {:?}", other),
            })
            .collect();
        assert_ne!(outputs[0], outputs[1]);
        assert_eq!(outputs[0], root.path().join("output/dubbed_clip_es.mp4"));
        assert_eq!(
            outputs[1],
            root.path().join(format!("output/dubbed_clip_es_{}.mp4", jobs[1].short_id()))
        );
        assert!(outputs.iter().all(|o| o.exists()));
        assert_eq!(report.results[1].job.id, jobs[1].id);
    }

    #[tokio::test]
    async fn test_explicit_duplicate_names_are_disambiguated() {
        let root = tempfile::tempdir().unwrap();
        let (pipeline, _media) = fake_pipeline(root.path(), 30.0, 28.0);
        let jobs = vec![
            Job::new("https://youtube.com/shorts/one", "es").unwrap().with_output_name(Some("dub.mp4")),
            Job::new("https://youtube.com/shorts/two", "es").unwrap().with_output_name(Some("dub.mp4")),
            Job::new("https://youtube.com/shorts/three", "es").unwrap().with_output_name(Some("dub.mp4")),
        ];

        let report = BatchRunner::new(pipeline).run(&jobs).await;

        let names: HashSet<String> = report.results.iter().map(|r| r.job.resolved_output_name()).collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains("dub.mp4"));
        assert!(report.all_succeeded());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let root = tempfile::tempdir().unwrap();
        let (pipeline, _media) = fake_pipeline(root.path(), 30.0, 28.0);
        let report = BatchRunner::new(pipeline).run(&[]).await;
        assert!(report.results.is_empty());
        assert!(report.all_succeeded());
    }

    #[tokio::test]
    async fn test_report_saved_as_json() {
        let root = tempfile::tempdir().unwrap();
        let (pipeline, _media) = fake_pipeline(root.path(), 30.0, 28.0);
        let report = BatchRunner::new(pipeline)
            .run(&[Job::new("https://youtube.com/shorts/one", "de").unwrap()])
            .await;

        let path = root.path().join("reports/batch.json");
        report.save_json(&path).unwrap();

        let loaded: BatchReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.succeeded(), 1);
        assert_eq!(loaded.results[0].job.target_language, "de");
    }

    #[test]
    fn test_list_file_skips_comments_and_blanks() {
        let temp = assert_fs::TempDir::new().unwrap();
        let list = temp.child("shorts.txt");
        list.write_str("# trending\nhttps://youtube.com/shorts/a\n\n  https://youtube.com/shorts/b  \n#done\n")
            .unwrap();

        let locators = load_locators(list.path()).unwrap();
        assert_eq!(locators, vec!["https://youtube.com/shorts/a", "https://youtube.com/shorts/b"]);
    }

    #[test]
    fn test_directory_yields_video_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("b.mp4").touch().unwrap();
        temp.child("nested/a.MKV").touch().unwrap();
        temp.child("notes.txt").touch().unwrap();

        let locators = load_locators(temp.path()).unwrap();
        assert_eq!(locators.len(), 2);
        assert!(locators[0].ends_with("b.mp4"));
        assert!(locators[1].ends_with("a.MKV"));
    }

    #[test]
    fn test_missing_source_is_invalid_input() {
        assert!(matches!(
            load_locators("/no/such/batch"),
            Err(DubError::InvalidInput(_))
        ));
    }
}
