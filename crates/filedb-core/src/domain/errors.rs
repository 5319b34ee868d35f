//! Errors - エラー型と分類
//!
//! # 分類
//! - **Validation**: ユーザーが直せる入力エラー（全フィールド分をまとめて返す）
//! - **NotFound**: 参照された database / collection が存在しない
//! - **Storage**: ファイルシステム・カタログの障害（ローカルで回復しない）

use std::fmt;

use thiserror::Error;

use crate::ports::StoreError;

/// One violated form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name (`name`, `database-select`, `upload-files`).
    pub field: &'static str,
    pub message: String,
}

/// All field errors of one submission, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Replace every message of `field` with `message` (or add it).
    pub fn replace(&mut self, field: &'static str, message: impl Into<String>) {
        let message = message.into();
        let mut replaced = false;
        self.errors.retain_mut(|e| {
            if e.field != field {
                return true;
            }
            if replaced {
                return false;
            }
            e.message = message.clone();
            replaced = true;
            true
        });
        if !replaced {
            self.push(field, message);
        }
    }

    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), FilesError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(FilesError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Please fix errors. ({})", self.messages().join(", "))
    }
}

/// FilesError はワークフローのエラー
#[derive(Debug, Error)]
pub enum FilesError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl FilesError {
    pub fn not_found(kind: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for FilesError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Storage(other),
        }
    }
}

impl From<std::io::Error> for FilesError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(StoreError::Io(err))
    }
}
