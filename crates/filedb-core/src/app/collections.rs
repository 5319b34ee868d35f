//! Collection workflows: list with live file enumeration, delete one.

use tracing::info;

use crate::domain::{CollectionSummary, FileCollectionId, FileDatabaseId, FilesError};
use crate::ports::StorageClient;

/// Collections of one database. `NotFound` when the database does not exist.
pub async fn list_collections(
    store: &dyn StorageClient,
    database_id: FileDatabaseId,
) -> Result<Vec<CollectionSummary>, FilesError> {
    let records = store.list_collections(database_id).await?;

    let mut summaries = Vec::with_capacity(records.len());
    for record in records {
        let files = store.list_items(record.id).await?;
        summaries.push(CollectionSummary {
            id: record.id,
            path: record.path,
            meta: record.meta,
            files,
        });
    }
    Ok(summaries)
}

/// Delete one collection and its files. The owning database is untouched.
pub async fn delete_collection(
    store: &dyn StorageClient,
    id: FileCollectionId,
) -> Result<(), FilesError> {
    store.delete_collection(id).await?;
    info!(collection_id = %id, "file collection deleted");
    Ok(())
}
