//! On-disk layout shared by the storage adapters.
//!
//! `<root>/<database key>/<collection key>/<file name>`

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::ports::{ItemTransfer, StoreResult};

pub(crate) async fn create_managed_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await
}

/// Remove a managed directory tree. Already gone counts as success.
pub(crate) async fn remove_managed_dir(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Bring `source` into `dir` under its own file name.
pub(crate) async fn transfer_item(
    source: &Path,
    dir: &Path,
    transfer: ItemTransfer,
) -> StoreResult<PathBuf> {
    let name = source.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("item source has no file name: {}", source.display()),
        )
    })?;
    let target = dir.join(name);

    match transfer {
        ItemTransfer::Move => move_file(source, &target).await?,
        ItemTransfer::Copy => {
            fs::copy(source, &target).await?;
        }
    }

    debug!(source = %source.display(), target = %target.display(), ?transfer, "item registered");
    Ok(target)
}

async fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target).await {
        // workspace と database root が別デバイスにある場合
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(source, target).await?;
            fs::remove_file(source).await
        }
        other => other,
    }
}

/// Regular files directly under `dir`. A missing directory lists as empty.
pub(crate) async fn list_item_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn move_consumes_the_source() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.csv");
        std::fs::write(&source, b"x,y\n1,2\n").unwrap();
        let dir = tmp.path().join("col");
        create_managed_dir(&dir).await.unwrap();

        let target = transfer_item(&source, &dir, ItemTransfer::Move).await.unwrap();

        assert_eq!(target, dir.join("a.csv"));
        assert!(!source.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"x,y\n1,2\n");
    }

    #[tokio::test]
    async fn copy_keeps_the_source() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("b.txt");
        std::fs::write(&source, b"hello").unwrap();
        let dir = tmp.path().join("col");
        create_managed_dir(&dir).await.unwrap();

        transfer_item(&source, &dir, ItemTransfer::Copy).await.unwrap();

        assert!(source.exists());
        assert!(dir.join("b.txt").exists());
    }

    #[tokio::test]
    async fn list_skips_directories_and_tolerates_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("col");
        assert!(list_item_names(&dir).await.unwrap().is_empty());

        create_managed_dir(&dir.join("nested")).await.unwrap();
        std::fs::write(dir.join("a.csv"), b"1").unwrap();

        assert_eq!(list_item_names(&dir).await.unwrap(), vec!["a.csv".to_string()]);
    }

    #[tokio::test]
    async fn removing_a_missing_dir_is_ok() {
        let tmp = TempDir::new().unwrap();
        remove_managed_dir(&tmp.path().join("gone")).await.unwrap();
    }
}
