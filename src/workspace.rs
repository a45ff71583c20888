use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::job::Job;

/// Per-job scratch directory.
///
/// Every temporary artifact of a job lives here. The directory is removed when
/// the workspace is released or dropped, unless the job asked to keep it.
/// Removal errors are logged and never surface to the caller.
pub struct ScopedWorkspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScopedWorkspace {
    /// Create a fresh directory for `job` under `root`
    pub fn create(root: &Path, job: &Job) -> Result<Self> {
        std::fs::create_dir_all(root)?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("job-{}-", job.id.simple()))
            .tempdir_in(root)?;
        let path = dir.path().to_path_buf();

        debug!("Created workspace {} for job {}", path.display(), job.id);
        Ok(Self { dir: Some(dir), path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a named artifact inside the workspace
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Release the workspace. Returns the retained path when `keep` is set.
    pub fn release(mut self, keep: bool) -> Option<PathBuf> {
        let dir = self.dir.take()?;

        if keep {
            #[allow(deprecated)]
            let kept = dir.into_path();
            info!("Keeping temporary files in {}", kept.display());
            return Some(kept);
        }

        if let Err(e) = dir.close() {
            warn!("Failed to remove workspace {}: {}", self.path.display(), e);
        } else {
            debug!("Removed workspace {}", self.path.display());
        }
        None
    }
}

impl Drop for ScopedWorkspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                warn!("Failed to remove workspace {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new("https://youtube.com/shorts/abc", "es").unwrap()
    }

    #[test]
    fn test_release_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let workspace = ScopedWorkspace::create(root.path(), &job()).unwrap();
        let path = workspace.path().to_path_buf();
        std::fs::write(workspace.file("dub.mp3"), b"data").unwrap();

        assert!(workspace.release(false).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_release_keeps_directory_on_request() {
        let root = tempfile::tempdir().unwrap();
        let workspace = ScopedWorkspace::create(root.path(), &job()).unwrap();
        std::fs::write(workspace.file("dub.mp3"), b"data").unwrap();

        let kept = workspace.release(true).unwrap();
        assert!(kept.join("dub.mp3").exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let workspace = ScopedWorkspace::create(root.path(), &job()).unwrap();
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_jobs_get_separate_directories() {
        let root = tempfile::tempdir().unwrap();
        let a = ScopedWorkspace::create(root.path(), &job()).unwrap();
        let b = ScopedWorkspace::create(root.path(), &job()).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
