//! Database workflows: create, list, cascading delete.

use std::path::Path;

use tracing::{info, warn};

use super::ingest::FIELD_NAME;
use crate::domain::{
    DatabaseSummary, FileDatabaseId, FileDatabaseRecord, FilesError, Meta, ValidationErrors,
};
use crate::ports::{StorageClient, StoreError};

/// Create a database rooted at `<root_directory>/<id>` with meta `{name}`.
pub async fn create_database(
    store: &dyn StorageClient,
    root_directory: &Path,
    name: &str,
) -> Result<FileDatabaseRecord, FilesError> {
    let mut errors = ValidationErrors::new();
    if name.trim().is_empty() {
        errors.push(FIELD_NAME, "Name is required");
    }
    errors.into_result()?;

    let record = store
        .create_database(root_directory, Meta::named(name.trim()))
        .await?;

    info!(database_id = %record.id, path = %record.path.display(), "file database created");
    Ok(record)
}

/// All databases with a live collection count. Order is unspecified.
pub async fn list_databases(
    store: &dyn StorageClient,
) -> Result<Vec<DatabaseSummary>, FilesError> {
    let records = store.list_databases().await?;

    let mut summaries = Vec::with_capacity(records.len());
    for record in records {
        let collection_count = store.count_collections(record.id).await?;
        summaries.push(DatabaseSummary {
            id: record.id,
            name: record.meta.name.clone(),
            path: record.path,
            collection_count,
            meta: record.meta,
        });
    }
    Ok(summaries)
}

/// Delete every collection of the database, then the database itself.
///
/// No rollback: if a collection fails to delete, the error propagates and the
/// database keeps the collections not yet reached. Calling again finishes the job.
pub async fn delete_database(
    store: &dyn StorageClient,
    id: FileDatabaseId,
) -> Result<(), FilesError> {
    let collections = store.list_collections(id).await?;

    for collection in &collections {
        match store.delete_collection(collection.id).await {
            Ok(()) => {}
            // 別リクエストが先に消した
            Err(StoreError::NotFound { .. }) => {}
            Err(e) => {
                warn!(
                    database_id = %id,
                    collection_id = %collection.id,
                    error = %e,
                    "cascading delete interrupted"
                );
                return Err(e.into());
            }
        }
    }

    store.delete_database(id).await?;

    info!(database_id = %id, collections = collections.len(), "file database deleted");
    Ok(())
}
