//! InMemoryStorageClient - 開発用・テスト用の storage client
//!
//! # 実装詳細
//! - catalog（レコード）は `tokio::sync::Mutex<HashMap<..>>` に保持
//! - ファイルは実ディスクに置く（layout は SQLite 版と同じ）
//! - プロセスが終わると catalog は消える（ディレクトリは残る）

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::SubsecRound;
use tokio::sync::Mutex;
use tracing::debug;

use super::layout;
use crate::domain::{
    FileCollectionId, FileCollectionRecord, FileDatabaseId, FileDatabaseRecord, Meta,
};
use crate::ports::{
    Clock, IdGenerator, ItemTransfer, StorageClient, StoreError, StoreResult, SystemClock,
    UlidGenerator,
};

#[derive(Default)]
struct InMemoryCatalog {
    databases: HashMap<FileDatabaseId, FileDatabaseRecord>,
    collections: HashMap<FileCollectionId, FileCollectionRecord>,
}

impl InMemoryCatalog {
    fn database(&self, id: FileDatabaseId) -> StoreResult<&FileDatabaseRecord> {
        self.databases
            .get(&id)
            .ok_or_else(|| StoreError::not_found("file database", id))
    }

    fn collection(&self, id: FileCollectionId) -> StoreResult<&FileCollectionRecord> {
        self.collections
            .get(&id)
            .ok_or_else(|| StoreError::not_found("file collection", id))
    }

    fn collections_of(
        &self,
        database_id: FileDatabaseId,
    ) -> impl Iterator<Item = &FileCollectionRecord> {
        self.collections
            .values()
            .filter(move |c| c.file_database_id == database_id)
    }
}

pub struct InMemoryStorageClient {
    state: Arc<Mutex<InMemoryCatalog>>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStorageClient {
    pub fn new() -> Self {
        Self::with_parts(Arc::new(UlidGenerator::new(SystemClock)), Arc::new(SystemClock))
    }

    pub fn with_parts(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryCatalog::default())),
            ids,
            clock,
        }
    }
}

impl Default for InMemoryStorageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageClient for InMemoryStorageClient {
    async fn create_database(&self, root: &Path, meta: Meta) -> StoreResult<FileDatabaseRecord> {
        let id = self.ids.generate_database_id();
        let path = root.join(id.key());
        layout::create_managed_dir(&path).await?;

        let record = FileDatabaseRecord {
            id,
            path,
            meta,
            created_at: self.clock.now().trunc_subsecs(3),
        };
        self.state.lock().await.databases.insert(id, record.clone());

        debug!(database_id = %id, path = %record.path.display(), "database created");
        Ok(record)
    }

    async fn get_database(&self, id: FileDatabaseId) -> StoreResult<FileDatabaseRecord> {
        self.state.lock().await.database(id).cloned()
    }

    async fn list_databases(&self) -> StoreResult<Vec<FileDatabaseRecord>> {
        Ok(self.state.lock().await.databases.values().cloned().collect())
    }

    async fn delete_database(&self, id: FileDatabaseId) -> StoreResult<()> {
        let record = {
            let mut state = self.state.lock().await;
            state.database(id)?;

            let remaining = state.collections_of(id).count();
            if remaining > 0 {
                return Err(StoreError::conflict(format!(
                    "file database {id} still owns {remaining} collection(s)"
                )));
            }
            state
                .databases
                .remove(&id)
                .ok_or_else(|| StoreError::not_found("file database", id))?
        };

        layout::remove_managed_dir(&record.path).await?;
        debug!(database_id = %id, "database deleted");
        Ok(())
    }

    async fn create_collection(
        &self,
        database_id: FileDatabaseId,
        meta: Meta,
    ) -> StoreResult<FileCollectionRecord> {
        // database の削除と競合しないよう、ディレクトリ作成の間もロックを保持する
        let mut state = self.state.lock().await;
        let database_path = state.database(database_id)?.path.clone();

        let id = self.ids.generate_collection_id();
        let path = database_path.join(id.key());
        layout::create_managed_dir(&path).await?;

        let record = FileCollectionRecord {
            id,
            file_database_id: database_id,
            path,
            meta,
            created_at: self.clock.now().trunc_subsecs(3),
        };
        state.collections.insert(id, record.clone());

        debug!(collection_id = %id, database_id = %database_id, "collection created");
        Ok(record)
    }

    async fn get_collection(&self, id: FileCollectionId) -> StoreResult<FileCollectionRecord> {
        self.state.lock().await.collection(id).cloned()
    }

    async fn list_collections(
        &self,
        database_id: FileDatabaseId,
    ) -> StoreResult<Vec<FileCollectionRecord>> {
        let state = self.state.lock().await;
        state.database(database_id)?;
        Ok(state.collections_of(database_id).cloned().collect())
    }

    async fn count_collections(&self, database_id: FileDatabaseId) -> StoreResult<usize> {
        Ok(self.state.lock().await.collections_of(database_id).count())
    }

    async fn add_item(
        &self,
        collection_id: FileCollectionId,
        source: &Path,
        transfer: ItemTransfer,
    ) -> StoreResult<PathBuf> {
        let dir = self.state.lock().await.collection(collection_id)?.path.clone();
        layout::transfer_item(source, &dir, transfer).await
    }

    async fn list_items(&self, collection_id: FileCollectionId) -> StoreResult<Vec<String>> {
        let dir = self.state.lock().await.collection(collection_id)?.path.clone();
        Ok(layout::list_item_names(&dir).await?)
    }

    async fn delete_collection(&self, id: FileCollectionId) -> StoreResult<()> {
        let record = self
            .state
            .lock()
            .await
            .collections
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("file collection", id))?;

        layout::remove_managed_dir(&record.path).await?;
        debug!(collection_id = %id, "collection deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn create_database_makes_its_directory() {
        let tmp = TempDir::new().unwrap();
        let store = InMemoryStorageClient::new();

        let db = store
            .create_database(tmp.path(), Meta::named("Basin A"))
            .await
            .unwrap();

        assert!(db.path.is_dir());
        assert_eq!(db.path, tmp.path().join(db.id.key()));
        assert_eq!(store.get_database(db.id).await.unwrap(), db);
    }

    #[tokio::test]
    async fn collection_lives_under_its_database() {
        let tmp = TempDir::new().unwrap();
        let store = InMemoryStorageClient::new();
        let db = store
            .create_database(tmp.path(), Meta::named("db"))
            .await
            .unwrap();

        let col = store
            .create_collection(db.id, Meta::named("col"))
            .await
            .unwrap();

        assert!(col.path.starts_with(&db.path));
        assert_eq!(store.count_collections(db.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn create_collection_for_unknown_database_is_not_found() {
        let store = InMemoryStorageClient::new();
        let missing = FileDatabaseId::from(ulid::Ulid::new());

        let err = store
            .create_collection(missing, Meta::named("col"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn database_with_collections_cannot_be_deleted() {
        let tmp = TempDir::new().unwrap();
        let store = InMemoryStorageClient::new();
        let db = store
            .create_database(tmp.path(), Meta::named("db"))
            .await
            .unwrap();
        store
            .create_collection(db.id, Meta::named("col"))
            .await
            .unwrap();

        let err = store.delete_database(db.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(db.path.is_dir());
    }

    #[tokio::test]
    async fn delete_collection_twice_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = InMemoryStorageClient::new();
        let db = store
            .create_database(tmp.path(), Meta::named("db"))
            .await
            .unwrap();
        let col = store
            .create_collection(db.id, Meta::named("col"))
            .await
            .unwrap();

        store.delete_collection(col.id).await.unwrap();
        assert!(!col.path.exists());

        let err = store.delete_collection(col.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
