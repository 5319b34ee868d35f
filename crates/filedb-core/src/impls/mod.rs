//! Impls - StorageClient の実装
//!
//! # 含まれる実装
//! - **InMemoryStorageClient**: 開発用・テスト用（catalog はメモリ）
//! - **SqliteStorageClient**: catalog を SQLite に永続化
//!
//! どちらもファイル本体は同じディレクトリ構成（`layout`）でディスクに置きます。

mod layout;

pub mod inmem_storage;
pub mod sqlite_storage;

pub use self::inmem_storage::InMemoryStorageClient;
pub use self::sqlite_storage::SqliteStorageClient;
