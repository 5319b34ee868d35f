//! IdGenerator port - ID 生成の抽象化
//!
//! テスト容易性のために trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::{FileCollectionId, FileDatabaseId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は catalog のレコード ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（storage client から共有される）
pub trait IdGenerator: Send + Sync {
    fn generate_database_id(&self) -> FileDatabaseId;

    fn generate_collection_id(&self) -> FileCollectionId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_database_id(&self) -> FileDatabaseId {
        FileDatabaseId::from(self.next_ulid())
    }

    fn generate_collection_id(&self) -> FileCollectionId {
        FileCollectionId::from(self.next_ulid())
    }
}
