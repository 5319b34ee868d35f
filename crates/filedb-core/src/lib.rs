//! filedb-core
//!
//! File databases and collections: named directories of uploaded files with a
//! catalog of their metadata.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, meta, records, upload, errors）
//! - **ports**: 抽象化レイヤー（StorageClient, IdGenerator, Clock）
//! - **impls**: StorageClient の実装（メモリ / SQLite）
//! - **app**: ワークフロー（ingest, databases, collections）と AppBuilder
//! - **config**: AppConfig（JSON / 環境変数）
//! - **logging**: tracing subscriber の初期化

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod logging;
pub mod ports;
