//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! 設定・カタログ（StorageClient）・ワークスペースを束ねて `FilesApp` を作ります。
//! 起動時に検証し、足りないものがあれば `BuildError` を返します（Fail-fast）。

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use super::collections;
use super::databases;
use super::forms::{
    AddFileDatabaseForm, InvalidSelection, SelectOption, UploadFilesForm, database_select_options,
};
use super::ingest::{self, FIELD_DATABASE, IngestRequest};
use super::workspace::Workspace;
use crate::config::{AppConfig, CatalogConfig};
use crate::domain::{
    CollectionSummary, DatabaseSummary, FileCollectionId, FileCollectionRecord, FileDatabaseId,
    FileDatabaseRecord, FilesError, UploadedFile,
};
use crate::impls::{InMemoryStorageClient, SqliteStorageClient};
use crate::ports::{StorageClient, StoreError, StoreResult};

/// AppBuilder は FilesApp を構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .config(AppConfig::from_env()?)
///     .with_configured_storage()
///     .await?
///     .build()
///     .await?;
/// ```
pub struct AppBuilder {
    config: AppConfig,
    storage: Option<Arc<dyn StorageClient>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no storage client configured. Call `storage()` or `with_configured_storage()`.")]
    MissingStorage,

    #[error("failed to open catalog: {0}")]
    Storage(#[from] StoreError),

    #[error("workspace root {path} is not usable: {source}")]
    Workspace {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            storage: None,
        }
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn storage(mut self, storage: Arc<dyn StorageClient>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Open the catalog named by `config.catalog`.
    pub async fn with_configured_storage(self) -> Result<Self, BuildError> {
        let storage = Self::open_storage(&self.config.catalog).await?;
        Ok(self.storage(storage))
    }

    pub async fn open_storage(catalog: &CatalogConfig) -> StoreResult<Arc<dyn StorageClient>> {
        match catalog {
            CatalogConfig::Memory => {
                debug!("using in-memory catalog");
                Ok(Arc::new(InMemoryStorageClient::new()))
            }
            CatalogConfig::Sqlite { path } => {
                let client = SqliteStorageClient::open(path).await?;
                Ok(Arc::new(client))
            }
        }
    }

    /// Validate and build.
    ///
    /// # 検証
    /// - storage が設定されていること
    /// - workspace root が作成できること
    pub async fn build(self) -> Result<FilesApp, BuildError> {
        let storage = self.storage.ok_or(BuildError::MissingStorage)?;

        let workspace = Workspace::new(self.config.workspace_root.clone());
        workspace
            .ensure()
            .await
            .map_err(|source| BuildError::Workspace {
                path: workspace.path().to_path_buf(),
                source,
            })?;

        info!(
            workspace = %workspace.path().display(),
            database_root = %self.config.database_root().display(),
            "files app ready"
        );

        Ok(FilesApp {
            storage,
            workspace,
            config: self.config,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// FilesApp はワークフローの入口
///
/// 各メソッドは `app::{databases, collections, ingest}` の関数に
/// storage と workspace を渡すだけです。
#[derive(Clone)]
pub struct FilesApp {
    storage: Arc<dyn StorageClient>,
    workspace: Workspace,
    config: AppConfig,
}

impl FilesApp {
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn storage(&self) -> &dyn StorageClient {
        self.storage.as_ref()
    }

    pub async fn create_database(&self, name: &str) -> Result<FileDatabaseRecord, FilesError> {
        databases::create_database(self.storage(), self.config.database_root(), name).await
    }

    pub async fn ingest(&self, request: IngestRequest) -> Result<FileCollectionRecord, FilesError> {
        ingest::ingest(
            self.storage(),
            &self.workspace,
            request,
            &self.config.ingest_options(),
        )
        .await
    }

    pub async fn list_databases(&self) -> Result<Vec<DatabaseSummary>, FilesError> {
        databases::list_databases(self.storage()).await
    }

    pub async fn list_collections(
        &self,
        database_id: FileDatabaseId,
    ) -> Result<Vec<CollectionSummary>, FilesError> {
        collections::list_collections(self.storage(), database_id).await
    }

    pub async fn delete_database(&self, id: FileDatabaseId) -> Result<(), FilesError> {
        databases::delete_database(self.storage(), id).await
    }

    pub async fn delete_collection(&self, id: FileCollectionId) -> Result<(), FilesError> {
        collections::delete_collection(self.storage(), id).await
    }

    /// Databases for the home page, `None` when there are none yet.
    pub async fn home(&self) -> Result<Option<Vec<DatabaseSummary>>, FilesError> {
        let databases = self.list_databases().await?;
        Ok((!databases.is_empty()).then_some(databases))
    }

    pub async fn database_select_options(&self) -> Result<Vec<SelectOption>, FilesError> {
        Ok(database_select_options(&self.list_databases().await?))
    }

    /// Handle a submitted upload form.
    ///
    /// An unparsable `database-select` is reported together with every other
    /// field error, in form order.
    pub async fn submit_upload(
        &self,
        form: UploadFilesForm,
        files: Vec<UploadedFile>,
    ) -> Result<FileCollectionRecord, FilesError> {
        let (request, invalid) = form.into_request(files);

        if let Some(InvalidSelection(raw)) = invalid {
            let mut errors = ingest::check_request(&request, &self.config.ingest_options());
            errors.replace(FIELD_DATABASE, "Selected Database is invalid");
            debug!(selection = %raw, "rejected upload with unparsable database selection");
            return Err(FilesError::Validation(errors));
        }

        self.ingest(request).await
    }

    pub async fn submit_add_database(
        &self,
        form: AddFileDatabaseForm,
    ) -> Result<FileDatabaseRecord, FilesError> {
        self.create_database(form.name.as_deref().unwrap_or_default())
            .await
    }
}
