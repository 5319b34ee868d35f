//! Catalog records and listing views.
//!
//! Records are plain data. All behaviour lives on the `StorageClient` port and
//! the workflow functions in `app`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{FileCollectionId, FileDatabaseId};
use super::meta::Meta;

/// A named root container of file collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDatabaseRecord {
    pub id: FileDatabaseId,

    /// `<root_directory>/<id>`
    pub path: PathBuf,

    pub meta: Meta,
    pub created_at: DateTime<Utc>,
}

/// A group of files living in a subdirectory of its database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCollectionRecord {
    pub id: FileCollectionId,
    pub file_database_id: FileDatabaseId,

    /// `<database path>/<id>`
    pub path: PathBuf,

    pub meta: Meta,
    pub created_at: DateTime<Utc>,
}

/// Row of the database listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseSummary {
    pub id: FileDatabaseId,
    pub name: String,
    pub path: PathBuf,

    /// Live count, never cached.
    pub collection_count: usize,

    pub meta: Meta,
}

/// Row of the collection listing for one database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub id: FileCollectionId,
    pub path: PathBuf,
    pub meta: Meta,

    /// Live enumeration of the collection directory.
    pub files: Vec<String>,
}
