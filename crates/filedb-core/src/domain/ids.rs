//! Domain identifiers (strongly-typed IDs).
//!
//! ULID ベースの ID を Phantom type パターンで型付けします。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: timestamp が先頭にあるため、生成順序でソートできる
//! - **分散生成可能**: 調整なしで生成できる
//! - **UUID互換**: 128-bit で UUID と同じサイズ
//!
//! ## Phantom Type パターン
//! `Id<T>` で共通実装を持ちつつ、`FileDatabaseId` と `FileCollectionId` は
//! コンパイル時に混同できません。
//!
//! ## 文字列表現
//! - Display: `fdb-01H...` / `fcol-01H...`（プレフィックス付き）
//! - パース: プレフィックスあり・なしの両方を受け付ける（フォームの select 値など）
//! - serde: Display と同じ文字列としてシリアライズ

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス（例: "fdb-", "fcol-"）
    fn prefix() -> &'static str;

    /// エラーメッセージ用のラベル
    fn label() -> &'static str;
}

/// Error returned when parsing an identifier fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {label}: {value:?}")]
pub struct IdParseError {
    label: &'static str,
    value: String,
}

/// ジェネリック ID 型
///
/// # 例
/// ```ignore
/// let db_id: FileDatabaseId = Id::from(Ulid::new());
/// let col_id: FileCollectionId = Id::from(Ulid::new());
/// // db_id と col_id は異なる型なので、混同できない
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// ULID から Id を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }

    /// Parse `fdb-<ulid>` / `<ulid>` style strings.
    pub fn parse(value: &str) -> Result<Self, IdParseError> {
        let trimmed = value.trim();
        let raw = trimmed.strip_prefix(T::prefix()).unwrap_or(trimmed);
        Ulid::from_string(raw)
            .map(Self::from_ulid)
            .map_err(|_| IdParseError {
                label: T::label(),
                value: value.to_string(),
            })
    }

    /// Storage key (bare ULID, no prefix). Used for directory names and catalog rows.
    pub fn key(&self) -> String {
        self.ulid.to_string()
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

impl<T: IdMarker> FromStr for Id<T> {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// FileDatabase のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileDatabase {}

impl IdMarker for FileDatabase {
    fn prefix() -> &'static str {
        "fdb-"
    }

    fn label() -> &'static str {
        "file database id"
    }
}

/// FileCollection のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileCollection {}

impl IdMarker for FileCollection {
    fn prefix() -> &'static str {
        "fcol-"
    }

    fn label() -> &'static str {
        "file collection id"
    }
}

/// Identifier of a FileDatabase (root container of collections).
pub type FileDatabaseId = Id<FileDatabase>;

/// Identifier of a FileCollection (independently deletable group of files).
pub type FileCollectionId = Id<FileCollection>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let ulid1 = Ulid::new();
        let ulid2 = Ulid::new();

        let db = FileDatabaseId::from_ulid(ulid1);
        let col = FileCollectionId::from_ulid(ulid2);

        assert_eq!(db.as_ulid(), ulid1);
        assert_eq!(col.as_ulid(), ulid2);

        assert!(db.to_string().starts_with("fdb-"));
        assert!(col.to_string().starts_with("fcol-"));

        // let _: FileDatabaseId = col; // <- does not compile
    }

    #[test]
    fn parse_accepts_prefixed_and_bare_forms() {
        let id = FileDatabaseId::from_ulid(Ulid::new());

        assert_eq!(FileDatabaseId::parse(&id.to_string()).unwrap(), id);
        assert_eq!(FileDatabaseId::parse(&id.key()).unwrap(), id);
        assert_eq!(id.to_string().parse::<FileDatabaseId>().unwrap(), id);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = FileCollectionId::parse("not-an-id").unwrap_err();
        assert!(err.to_string().contains("file collection id"));

        // 別の種類のプレフィックスは受け付けない
        let db = FileDatabaseId::from_ulid(Ulid::new());
        assert!(FileCollectionId::parse(&db.to_string()).is_err());
    }

    #[test]
    fn ids_serialize_as_display_string() {
        let id = FileCollectionId::from_ulid(Ulid::new());

        let serialized = serde_json::to_string(&id).unwrap();
        assert_eq!(serialized, format!("\"{id}\""));

        let back: FileCollectionId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<FileDatabaseId>(), size_of::<Ulid>());
        assert_eq!(size_of::<FileCollectionId>(), size_of::<Ulid>());
    }
}
