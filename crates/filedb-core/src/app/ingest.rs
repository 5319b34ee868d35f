//! Ingest - アップロードされたファイルから新しいコレクションを作る
//!
//! # フロー
//! 1. 入力を検証（エラーは全部まとめて返す。ストレージは一切触らない）
//! 2. database の存在確認（NotFound）
//! 3. ステージング領域を確保
//! 4. コレクション作成（meta = `{name}`）
//! 5. ファイルごとに: ステージング → `add_item(Move)` → 残っていれば削除
//! 6. ステージング領域を解放（失敗時は Drop で解放）

use std::collections::HashSet;

use tracing::{info, warn};

use super::workspace::{StagingArea, Workspace};
use crate::domain::{
    FileCollectionRecord, FileDatabaseId, FilesError, Meta, UploadedFile, ValidationErrors,
};
use crate::ports::{ItemTransfer, StorageClient};

/// Form field names, used as keys of `FieldError`.
pub const FIELD_NAME: &str = "name";
pub const FIELD_DATABASE: &str = "database-select";
pub const FIELD_FILES: &str = "upload-files";

#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub database_id: Option<FileDatabaseId>,
    pub name: String,
    pub notes: Option<String>,
    pub files: Vec<UploadedFile>,
}

/// Knobs coming from `AppConfig`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Maximum number of files in one upload.
    pub max_files: Option<usize>,

    /// Store non-empty notes as `meta.notes`. Off by default: the form accepts
    /// notes but the collection meta only carries `name`.
    pub persist_notes: bool,
}

/// Collect every problem with `request`.
pub fn check_request(request: &IngestRequest, options: &IngestOptions) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if request.name.trim().is_empty() {
        errors.push(FIELD_NAME, "Name is required");
    }

    if request.database_id.is_none() {
        errors.push(FIELD_DATABASE, "Selected Database is required");
    }

    if request.files.is_empty() {
        errors.push(FIELD_FILES, "Files to upload are required");
    }

    if let Some(max) = options.max_files
        && request.files.len() > max
    {
        errors.push(FIELD_FILES, format!("At most {max} files may be uploaded"));
    }

    let mut seen = HashSet::new();
    for file in &request.files {
        match file.plain_name() {
            None => errors.push(FIELD_FILES, format!("Invalid file name: {:?}", file.name)),
            Some(name) if !seen.insert(name) => {
                errors.push(FIELD_FILES, format!("Duplicate file name: {name}"))
            }
            Some(_) => {}
        }
    }

    errors
}

/// Validate and return the selected database.
pub fn validate(
    request: &IngestRequest,
    options: &IngestOptions,
) -> Result<FileDatabaseId, FilesError> {
    let errors = check_request(request, options);
    match request.database_id {
        Some(id) if errors.is_empty() => Ok(id),
        _ => Err(FilesError::Validation(errors)),
    }
}

pub async fn ingest(
    store: &dyn StorageClient,
    workspace: &Workspace,
    request: IngestRequest,
    options: &IngestOptions,
) -> Result<FileCollectionRecord, FilesError> {
    let database_id = validate(&request, options)?;
    store.get_database(database_id).await?;

    let staging = StagingArea::create(workspace).await?;

    let mut meta = Meta::named(request.name.trim());
    if options.persist_notes
        && let Some(notes) = request.notes.as_deref().map(str::trim)
        && !notes.is_empty()
    {
        meta = meta.with("notes", notes);
    }

    let collection = store.create_collection(database_id, meta).await?;

    for file in &request.files {
        // check_request で検証済み
        let Some(name) = file.plain_name() else {
            continue;
        };

        let staged = staging.stage(name, &file.content).await?;
        if let Err(e) = store.add_item(collection.id, &staged, ItemTransfer::Move).await {
            warn!(
                collection_id = %collection.id,
                file = name,
                error = %e,
                "item registration failed; collection left partially filled"
            );
            return Err(e.into());
        }
        staging.discard(&staged).await?;
    }

    staging.release().await?;

    info!(
        collection_id = %collection.id,
        database_id = %database_id,
        files = request.files.len(),
        "files ingested"
    );
    Ok(collection)
}
