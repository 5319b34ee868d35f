//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! ワークフローは具体的な catalog（メモリ / SQLite）を知りません。

pub mod clock;
pub mod id_generator;
pub mod storage_client;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::storage_client::{ItemTransfer, StorageClient, StoreError, StoreResult};
