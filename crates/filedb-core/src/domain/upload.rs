//! Uploaded file (transient).
//!
//! アップロードされたファイルはリクエストの間だけ存在します。
//! ingest でステージング → コレクションへ move → 削除。

use std::path::{Component, Path};

/// A file received from a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// The name as a single path component, or `None` when it would escape the
    /// staging directory (`../x`, `a/b`, `.`, empty, absolute).
    pub fn plain_name(&self) -> Option<&str> {
        let mut components = Path::new(&self.name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => part.to_str(),
            _ => None,
        }
    }
}
