//! StorageClient port - file database / file collection の正本
//!
//! StorageClient は以下を管理します：
//! - catalog レコード（FileDatabase, FileCollection, meta）
//! - 管理下のディレクトリ（`<root>/<database>/<collection>/<file>`）
//! - アイテムの登録（move / copy）と列挙
//!
//! # 実装
//! - `impls::InMemoryStorageClient`: catalog はメモリ、ファイルはディスク
//! - `impls::SqliteStorageClient`: catalog は SQLite（sqlx）、ファイルはディスク

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    FileCollectionId, FileCollectionRecord, FileDatabaseId, FileDatabaseRecord, Meta,
};

/// Result type of the storage port.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The operation would break catalog consistency.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

/// How `add_item` brings a file into the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemTransfer {
    /// Rename into place; the source no longer exists afterwards.
    Move,
    /// Leave the source untouched.
    Copy,
}

/// StorageClient は catalog とディスクの正本
///
/// # 設計原則
/// - レコードとディレクトリは一緒に作られ、一緒に消える
/// - 子コレクションを持つ database は削除できない（`Conflict`）
/// - 列挙順は保証しない
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Create a database rooted at `<root>/<new id>`.
    async fn create_database(&self, root: &Path, meta: Meta) -> StoreResult<FileDatabaseRecord>;

    async fn get_database(&self, id: FileDatabaseId) -> StoreResult<FileDatabaseRecord>;

    async fn list_databases(&self) -> StoreResult<Vec<FileDatabaseRecord>>;

    /// Remove the record and its directory. Fails with `Conflict` while collections remain.
    async fn delete_database(&self, id: FileDatabaseId) -> StoreResult<()>;

    /// Create a collection at `<database path>/<new id>`.
    async fn create_collection(
        &self,
        database_id: FileDatabaseId,
        meta: Meta,
    ) -> StoreResult<FileCollectionRecord>;

    async fn get_collection(&self, id: FileCollectionId) -> StoreResult<FileCollectionRecord>;

    /// Fails with `NotFound` when the database does not exist.
    async fn list_collections(
        &self,
        database_id: FileDatabaseId,
    ) -> StoreResult<Vec<FileCollectionRecord>>;

    async fn count_collections(&self, database_id: FileDatabaseId) -> StoreResult<usize>;

    /// Register `source` into the collection under its file name.
    /// Returns the managed path of the new item.
    async fn add_item(
        &self,
        collection_id: FileCollectionId,
        source: &Path,
        transfer: ItemTransfer,
    ) -> StoreResult<PathBuf>;

    /// Names of the files currently stored in the collection directory.
    async fn list_items(&self, collection_id: FileCollectionId) -> StoreResult<Vec<String>>;

    /// Remove the record and its directory. The owning database is untouched.
    async fn delete_collection(&self, id: FileCollectionId) -> StoreResult<()>;
}
