use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

/// Which stage produced a local file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactStage {
    RawAudio,
    EncodedAudio,
}

/// A file on local disk owned by one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalArtifact {
    pub path: PathBuf,
    pub stage: ArtifactStage,
}

/// Scratch directory of a single run.
///
/// Every artifact of the run is allocated inside it, so concurrent runs of the
/// same title never share a path. The directory and everything in it is removed
/// by [`RunScope::cleanup`], or on drop when a stage fails before cleanup.
pub struct RunScope {
    run_id: Uuid,
    dir: Option<TempDir>,
    artifacts: Vec<LocalArtifact>,
}

impl RunScope {
    pub async fn create(work_dir: &Path, run_id: Uuid) -> io::Result<Self> {
        fs_err::tokio::create_dir_all(work_dir).await?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("run-{}-", run_id))
            .tempdir_in(work_dir)?;

        tracing::debug!("Created run directory {}", dir.path().display());

        Ok(Self {
            run_id,
            dir: Some(dir),
            artifacts: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir
            .as_ref()
            .map(TempDir::path)
            .unwrap_or_else(|| Path::new(""))
    }

    /// Reserve `<title>.<extension>` for a stage and track it for cleanup
    pub fn allocate(
        &mut self,
        stage: ArtifactStage,
        sanitized_title: &str,
        extension: &str,
    ) -> LocalArtifact {
        let artifact = LocalArtifact {
            path: self.path().join(format!("{}.{}", sanitized_title, extension)),
            stage,
        };
        self.artifacts.push(artifact.clone());
        artifact
    }

    pub fn artifacts(&self) -> &[LocalArtifact] {
        &self.artifacts
    }

    /// Remove every artifact and the run directory. Best effort: failures are logged.
    ///
    /// Returns how many artifact files were removed.
    pub async fn cleanup(mut self) -> usize {
        let mut removed = 0;

        for artifact in &self.artifacts {
            match tokio::fs::remove_file(&artifact.path).await {
                Ok(()) => {
                    tracing::debug!("Removed {:?} artifact {}", artifact.stage, artifact.path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("Failed to remove {}: {}", artifact.path.display(), e);
                }
            }
        }

        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!("Failed to remove run directory {}: {}", path.display(), e);
            }
        }

        removed
    }
}

impl Drop for RunScope {
    fn drop(&mut self) {
        if let Some(dir) = &self.dir {
            tracing::debug!(
                "Run {} ended early, discarding {}",
                self.run_id,
                dir.path().display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cleanup_removes_artifacts_and_directory() {
        let work_dir = TempDir::new().unwrap();
        let mut scope = RunScope::create(work_dir.path(), Uuid::new_v4()).await.unwrap();

        let raw = scope.allocate(ArtifactStage::RawAudio, "Test", "webm");
        let encoded = scope.allocate(ArtifactStage::EncodedAudio, "Test", "mp3");
        fs_err::write(&raw.path, b"raw").unwrap();
        fs_err::write(&encoded.path, b"mp3").unwrap();

        let run_dir = scope.path().to_path_buf();
        assert!(run_dir.starts_with(work_dir.path()));
        assert_eq!(raw.path, run_dir.join("Test.webm"));

        assert_eq!(scope.cleanup().await, 2);
        assert!(!run_dir.exists());
        assert_eq!(std::fs::read_dir(work_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_tolerates_missing_artifacts() {
        let work_dir = TempDir::new().unwrap();
        let mut scope = RunScope::create(work_dir.path(), Uuid::new_v4()).await.unwrap();

        let raw = scope.allocate(ArtifactStage::RawAudio, "Test", "webm");
        scope.allocate(ArtifactStage::EncodedAudio, "Test", "mp3");
        fs_err::write(&raw.path, b"raw").unwrap();

        assert_eq!(scope.cleanup().await, 1);
        assert_eq!(std::fs::read_dir(work_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_drop_removes_partial_artifacts() {
        let work_dir = TempDir::new().unwrap();
        let run_dir = {
            let mut scope = RunScope::create(work_dir.path(), Uuid::new_v4()).await.unwrap();
            let raw = scope.allocate(ArtifactStage::RawAudio, "Test", "webm");
            fs_err::write(&raw.path, b"partial").unwrap();
            scope.path().to_path_buf()
        };

        assert!(!run_dir.exists());
    }

    #[tokio::test]
    async fn test_same_title_runs_do_not_collide() {
        let work_dir = TempDir::new().unwrap();
        let mut first = RunScope::create(work_dir.path(), Uuid::new_v4()).await.unwrap();
        let mut second = RunScope::create(work_dir.path(), Uuid::new_v4()).await.unwrap();

        let a = first.allocate(ArtifactStage::RawAudio, "Test", "webm");
        let b = second.allocate(ArtifactStage::RawAudio, "Test", "webm");
        assert_ne!(a.path, b.path);
    }

    #[tokio::test]
    async fn test_creates_missing_work_dir() {
        let root = TempDir::new().unwrap();
        let work_dir = root.path().join("nested").join("work");

        let scope = RunScope::create(&work_dir, Uuid::new_v4()).await.unwrap();
        assert!(scope.path().starts_with(&work_dir));
        scope.cleanup().await;
        assert!(work_dir.exists());
    }
}
