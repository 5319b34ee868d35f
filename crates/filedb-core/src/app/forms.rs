//! Forms - HTTP フォームの値をワークフローの入力へ変換
//!
//! フィールド名は HTML 側と揃えています（`name`, `notes`, `database-select`,
//! `upload-files`）。ファイル本体は multipart 側で別途受け取り、
//! `into_request` に渡します。

use serde::{Deserialize, Serialize};

use super::ingest::IngestRequest;
use crate::domain::{DatabaseSummary, FileDatabaseId, UploadedFile};

/// Text fields of the upload form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadFilesForm {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default, rename = "database-select")]
    pub database_select: Option<String>,
}

/// The database selection was present but did not parse as a database id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSelection(pub String);

impl UploadFilesForm {
    /// Build the ingest request. An unparsable selection becomes `database_id: None`
    /// and is reported next to the request so it can be merged with the other
    /// field errors.
    pub fn into_request(
        self,
        files: Vec<UploadedFile>,
    ) -> (IngestRequest, Option<InvalidSelection>) {
        let selection = self
            .database_select
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty());

        let (database_id, invalid) = match selection {
            None => (None, None),
            Some(raw) => match raw.parse::<FileDatabaseId>() {
                Ok(id) => (Some(id), None),
                Err(_) => (None, Some(InvalidSelection(raw))),
            },
        };

        let request = IngestRequest {
            database_id,
            name: self.name.unwrap_or_default(),
            notes: self.notes,
            files,
        };
        (request, invalid)
    }
}

/// Fields of the "add database" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AddFileDatabaseForm {
    #[serde(default)]
    pub name: Option<String>,
}

/// One `<option>` of the database selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

/// Label is `<name>-<id>` so databases sharing a name stay distinguishable.
pub fn database_select_options(databases: &[DatabaseSummary]) -> Vec<SelectOption> {
    databases
        .iter()
        .map(|db| SelectOption {
            label: format!("{}-{}", db.name, db.id),
            value: db.id.to_string(),
        })
        .collect()
}
