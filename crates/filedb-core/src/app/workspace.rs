//! Workspace - アップロードのステージング用スクラッチディレクトリ
//!
//! `<workspace>/temp/<token>/<file>` にステージングし、ingest の終了時に
//! `<token>` ディレクトリごと消します（`StagingArea`）。

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use ulid::Ulid;

const STAGING_DIR: &str = "temp";

/// Scratch directory handed to each workflow call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Shared parent of all staging areas.
    pub fn staging_root(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    pub async fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }
}

/// Staging directory scoped to one ingest call.
///
/// `release()` removes it on the happy path; `Drop` removes it on every other
/// exit path (early `?`, panic, cancelled future).
#[derive(Debug)]
pub struct StagingArea {
    dir: PathBuf,
    released: bool,
}

impl StagingArea {
    pub async fn create(workspace: &Workspace) -> io::Result<Self> {
        let dir = workspace.staging_root().join(Ulid::new().to_string());
        fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "staging area created");
        Ok(Self {
            dir,
            released: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `content` to `<dir>/<name>`. `name` must be a single path component.
    pub async fn stage(&self, name: &str, content: &[u8]) -> io::Result<PathBuf> {
        let path = self.dir.join(name);
        fs::write(&path, content).await?;
        Ok(path)
    }

    /// Remove a staged file unless registration already consumed it.
    pub async fn discard(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    pub async fn release(mut self) -> io::Result<()> {
        self.released = true;
        match fs::remove_dir_all(&self.dir).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.dir)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(dir = %self.dir.display(), error = %e, "failed to clean up staging area");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn staged_entries(workspace: &Workspace) -> usize {
        std::fs::read_dir(workspace.staging_root())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn release_removes_the_staging_dir() {
        let tmp = TempDir::new().unwrap();
        let workspace = Workspace::new(tmp.path());

        let staging = StagingArea::create(&workspace).await.unwrap();
        staging.stage("a.csv", b"1,2").await.unwrap();
        assert_eq!(staged_entries(&workspace), 1);

        staging.release().await.unwrap();
        assert_eq!(staged_entries(&workspace), 0);
    }

    #[tokio::test]
    async fn drop_removes_the_staging_dir() {
        let tmp = TempDir::new().unwrap();
        let workspace = Workspace::new(tmp.path());

        {
            let staging = StagingArea::create(&workspace).await.unwrap();
            staging.stage("a.csv", b"1,2").await.unwrap();
        }

        assert_eq!(staged_entries(&workspace), 0);
    }

    #[tokio::test]
    async fn discard_tolerates_consumed_files() {
        let tmp = TempDir::new().unwrap();
        let workspace = Workspace::new(tmp.path());
        let staging = StagingArea::create(&workspace).await.unwrap();

        let path = staging.stage("a.csv", b"1").await.unwrap();
        std::fs::remove_file(&path).unwrap();

        staging.discard(&path).await.unwrap();
        staging.release().await.unwrap();
    }
}
