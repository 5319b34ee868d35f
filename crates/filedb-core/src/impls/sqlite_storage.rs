//! SqliteStorageClient - catalog を SQLite に永続化する storage client
//!
//! ファイル本体は `impls::layout` のディレクトリ構成でディスクに置き、
//! レコード（id, path, meta, created_at）を sqlx 経由で SQLite に保存します。
//!
//! # テーブル
//! - `file_databases(id, path, meta, created_at)`
//! - `file_collections(id, file_database_id -> file_databases.id, path, meta, created_at)`
//!
//! `meta` は JSON テキスト、`created_at` は Unix ミリ秒（レコード側もミリ秒に丸める）。

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, info, warn};

use super::layout;
use crate::domain::ids::IdMarker;
use crate::domain::{
    FileCollectionId, FileCollectionRecord, FileDatabaseId, FileDatabaseRecord, Id, Meta,
};
use crate::ports::{
    Clock, IdGenerator, ItemTransfer, StorageClient, StoreError, StoreResult, SystemClock,
    UlidGenerator,
};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS file_databases (
        id TEXT PRIMARY KEY,
        path TEXT NOT NULL,
        meta TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS file_collections (
        id TEXT PRIMARY KEY,
        file_database_id TEXT NOT NULL REFERENCES file_databases(id),
        path TEXT NOT NULL,
        meta TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_file_collections_database
        ON file_collections(file_database_id)"#,
];

/// Storage client backed by a SQLite catalog.
#[derive(Clone)]
pub struct SqliteStorageClient {
    pool: SqlitePool,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl SqliteStorageClient {
    /// Open or create a catalog at the given path.
    ///
    /// Creates all tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let client = Self::from_pool(pool);
        client.ensure_schema().await?;

        info!(path = %path.display(), "catalog opened");
        Ok(client)
    }

    /// In-memory catalog (for testing). One connection, so every query sees the same database.
    pub async fn open_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let client = Self::from_pool(pool);
        client.ensure_schema().await?;
        Ok(client)
    }

    fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            ids: Arc::new(UlidGenerator::new(SystemClock)),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the id generator and clock (deterministic tests).
    pub fn with_parts(mut self, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        self.ids = ids;
        self.clock = clock;
        self
    }

    /// Get the underlying connection pool (escape hatch for ad-hoc queries).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA.iter().copied() {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn collection_path(&self, id: FileCollectionId) -> StoreResult<PathBuf> {
        let row = sqlx::query("SELECT path FROM file_collections WHERE id = ?")
            .bind(id.key())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("file collection", id))?;
        Ok(PathBuf::from(row.try_get::<String, _>("path")?))
    }
}

#[async_trait]
impl StorageClient for SqliteStorageClient {
    async fn create_database(&self, root: &Path, meta: Meta) -> StoreResult<FileDatabaseRecord> {
        let id = self.ids.generate_database_id();
        let path = root.join(id.key());
        let created_at = self.clock.now().trunc_subsecs(3);
        let meta_json = serde_json::to_string(&meta)?;

        layout::create_managed_dir(&path).await?;

        let inserted = sqlx::query(
            "INSERT INTO file_databases (id, path, meta, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(id.key())
        .bind(path_text(&path))
        .bind(meta_json)
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await;

        if let Err(e) = inserted {
            // レコードが無いディレクトリを残さない
            if let Err(cleanup) = layout::remove_managed_dir(&path).await {
                warn!(
                    path = %path.display(),
                    error = %cleanup,
                    "failed to remove orphan database directory"
                );
            }
            return Err(e.into());
        }

        debug!(database_id = %id, path = %path.display(), "database created");
        Ok(FileDatabaseRecord {
            id,
            path,
            meta,
            created_at,
        })
    }

    async fn get_database(&self, id: FileDatabaseId) -> StoreResult<FileDatabaseRecord> {
        let row = sqlx::query("SELECT id, path, meta, created_at FROM file_databases WHERE id = ?")
            .bind(id.key())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("file database", id))?;
        database_from_row(&row)
    }

    async fn list_databases(&self) -> StoreResult<Vec<FileDatabaseRecord>> {
        let rows = sqlx::query("SELECT id, path, meta, created_at FROM file_databases")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(database_from_row).collect()
    }

    async fn delete_database(&self, id: FileDatabaseId) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT path FROM file_databases WHERE id = ?")
            .bind(id.key())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::not_found("file database", id))?;
        let path = PathBuf::from(row.try_get::<String, _>("path")?);

        let remaining: i64 =
            sqlx::query("SELECT COUNT(*) AS n FROM file_collections WHERE file_database_id = ?")
                .bind(id.key())
                .fetch_one(&mut *tx)
                .await?
                .try_get("n")?;
        if remaining > 0 {
            return Err(StoreError::conflict(format!(
                "file database {id} still owns {remaining} collection(s)"
            )));
        }

        sqlx::query("DELETE FROM file_databases WHERE id = ?")
            .bind(id.key())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        layout::remove_managed_dir(&path).await?;
        debug!(database_id = %id, "database deleted");
        Ok(())
    }

    async fn create_collection(
        &self,
        database_id: FileDatabaseId,
        meta: Meta,
    ) -> StoreResult<FileCollectionRecord> {
        let database = self.get_database(database_id).await?;

        let id = self.ids.generate_collection_id();
        let path = database.path.join(id.key());
        let created_at = self.clock.now().trunc_subsecs(3);
        let meta_json = serde_json::to_string(&meta)?;

        layout::create_managed_dir(&path).await?;

        let inserted = sqlx::query(
            r#"INSERT INTO file_collections (id, file_database_id, path, meta, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(id.key())
        .bind(database_id.key())
        .bind(path_text(&path))
        .bind(meta_json)
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await;

        if let Err(e) = inserted {
            if let Err(cleanup) = layout::remove_managed_dir(&path).await {
                warn!(
                    path = %path.display(),
                    error = %cleanup,
                    "failed to remove orphan collection directory"
                );
            }
            return Err(e.into());
        }

        debug!(collection_id = %id, database_id = %database_id, "collection created");
        Ok(FileCollectionRecord {
            id,
            file_database_id: database_id,
            path,
            meta,
            created_at,
        })
    }

    async fn get_collection(&self, id: FileCollectionId) -> StoreResult<FileCollectionRecord> {
        let row = sqlx::query(
            r#"SELECT id, file_database_id, path, meta, created_at
               FROM file_collections WHERE id = ?"#,
        )
        .bind(id.key())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("file collection", id))?;
        collection_from_row(&row)
    }

    async fn list_collections(
        &self,
        database_id: FileDatabaseId,
    ) -> StoreResult<Vec<FileCollectionRecord>> {
        self.get_database(database_id).await?;

        let rows = sqlx::query(
            r#"SELECT id, file_database_id, path, meta, created_at
               FROM file_collections WHERE file_database_id = ?"#,
        )
        .bind(database_id.key())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(collection_from_row).collect()
    }

    async fn count_collections(&self, database_id: FileDatabaseId) -> StoreResult<usize> {
        let n: i64 =
            sqlx::query("SELECT COUNT(*) AS n FROM file_collections WHERE file_database_id = ?")
                .bind(database_id.key())
                .fetch_one(&self.pool)
                .await?
                .try_get("n")?;
        decode_count(n)
    }

    async fn add_item(
        &self,
        collection_id: FileCollectionId,
        source: &Path,
        transfer: ItemTransfer,
    ) -> StoreResult<PathBuf> {
        let dir = self.collection_path(collection_id).await?;
        layout::transfer_item(source, &dir, transfer).await
    }

    async fn list_items(&self, collection_id: FileCollectionId) -> StoreResult<Vec<String>> {
        let dir = self.collection_path(collection_id).await?;
        Ok(layout::list_item_names(&dir).await?)
    }

    async fn delete_collection(&self, id: FileCollectionId) -> StoreResult<()> {
        let path = self.collection_path(id).await?;

        let result = sqlx::query("DELETE FROM file_collections WHERE id = ?")
            .bind(id.key())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("file collection", id));
        }

        layout::remove_managed_dir(&path).await?;
        debug!(collection_id = %id, "collection deleted");
        Ok(())
    }
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn decode_id<T: IdMarker>(row: &SqliteRow, column: &str) -> StoreResult<Id<T>> {
    let raw: String = row.try_get(column)?;
    Id::parse(&raw).map_err(|e| StoreError::Sqlx(sqlx::Error::Decode(Box::new(e))))
}

fn decode_count(n: i64) -> StoreResult<usize> {
    usize::try_from(n).map_err(|e| StoreError::Sqlx(sqlx::Error::Decode(Box::new(e))))
}

fn decode_meta(row: &SqliteRow) -> StoreResult<Meta> {
    let raw: String = row.try_get("meta")?;
    Ok(serde_json::from_str(&raw)?)
}

fn decode_created_at(row: &SqliteRow) -> StoreResult<DateTime<Utc>> {
    let millis: i64 = row.try_get("created_at")?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        StoreError::Sqlx(sqlx::Error::Decode(
            format!("created_at out of range: {millis}").into(),
        ))
    })
}

fn database_from_row(row: &SqliteRow) -> StoreResult<FileDatabaseRecord> {
    Ok(FileDatabaseRecord {
        id: decode_id(row, "id")?,
        path: PathBuf::from(row.try_get::<String, _>("path")?),
        meta: decode_meta(row)?,
        created_at: decode_created_at(row)?,
    })
}

fn collection_from_row(row: &SqliteRow) -> StoreResult<FileCollectionRecord> {
    Ok(FileCollectionRecord {
        id: decode_id(row, "id")?,
        file_database_id: decode_id(row, "file_database_id")?,
        path: PathBuf::from(row.try_get::<String, _>("path")?),
        meta: decode_meta(row)?,
        created_at: decode_created_at(row)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::ports::FixedClock;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_catalog_file() {
        let tmp = TempDir::new().unwrap();
        let catalog = tmp.path().join("catalog").join("files.sqlite3");

        let store = SqliteStorageClient::open(&catalog).await.unwrap();
        assert!(catalog.exists());

        store.close().await;
    }

    #[test]
    fn negative_count_is_a_decode_error() {
        assert_eq!(decode_count(3).unwrap(), 3);
        assert!(matches!(
            decode_count(-1),
            Err(StoreError::Sqlx(sqlx::Error::Decode(_)))
        ));
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let catalog = tmp.path().join("files.sqlite3");
        let root = tmp.path().join("root");

        let store = SqliteStorageClient::open(&catalog).await.unwrap();
        let db = store
            .create_database(&root, Meta::named("Basin A").with("region", "north"))
            .await
            .unwrap();
        let col = store
            .create_collection(db.id, Meta::named("Survey1"))
            .await
            .unwrap();
        store.close().await;

        let store = SqliteStorageClient::open(&catalog).await.unwrap();
        assert_eq!(store.get_database(db.id).await.unwrap(), db);
        assert_eq!(store.get_collection(col.id).await.unwrap(), col);
        assert_eq!(store.count_collections(db.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn created_at_comes_from_the_clock() {
        let tmp = TempDir::new().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = FixedClock::new(at);
        let store = SqliteStorageClient::open_memory()
            .await
            .unwrap()
            .with_parts(Arc::new(UlidGenerator::new(clock)), Arc::new(clock));

        let db = store
            .create_database(tmp.path(), Meta::named("db"))
            .await
            .unwrap();

        assert_eq!(db.created_at, at);
        assert_eq!(store.get_database(db.id).await.unwrap().created_at, at);
    }

    #[tokio::test]
    async fn database_with_collections_cannot_be_deleted() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteStorageClient::open_memory().await.unwrap();
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
        assert!(store.get_database(db.id).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = SqliteStorageClient::open_memory().await.unwrap();
        let db = FileDatabaseId::from(ulid::Ulid::new());
        let col = FileCollectionId::from(ulid::Ulid::new());

        assert!(matches!(
            store.list_collections(db).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete_database(db).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete_collection(col).await,
            Err(StoreError::NotFound { .. })
        ));
        assert_eq!(store.count_collections(db).await.unwrap(), 0);
    }
}
