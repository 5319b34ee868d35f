//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてワークフローを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder / FilesApp**: 構築とワイヤリング、フォームの入口
//! - **databases**: database の作成・一覧・カスケード削除
//! - **collections**: collection の一覧・削除
//! - **ingest**: アップロードから collection を作る
//! - **forms**: フォーム値 → ワークフロー入力
//! - **workspace**: ステージング用スクラッチディレクトリ

pub mod builder;
pub mod collections;
pub mod databases;
pub mod forms;
pub mod ingest;
pub mod workspace;

// 主要な型を再エクスポート
pub use self::builder::{AppBuilder, BuildError, FilesApp};
pub use self::collections::{delete_collection, list_collections};
pub use self::databases::{create_database, delete_database, list_databases};
pub use self::forms::{AddFileDatabaseForm, SelectOption, UploadFilesForm};
pub use self::ingest::{IngestOptions, IngestRequest, ingest};
pub use self::workspace::{StagingArea, Workspace};
