use async_trait::async_trait;
use tagpulse_core::AppResult;

/// Port for the persisted key-value collaborator behind the snapshot.
///
/// Only single-key writes need to be atomic; no multi-key transactions are
/// expected from implementations.
#[async_trait]
pub trait SnapshotKeyValueStore: Send + Sync {
    /// Reads a scalar value.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Overwrites a scalar value.
    async fn set(&self, key: &str, value: String) -> AppResult<()>;

    /// Prepends one element to a list.
    async fn push_front(&self, key: &str, value: String) -> AppResult<()>;

    /// Returns list elements between `start` and `stop`, both inclusive.
    async fn range(&self, key: &str, start: usize, stop: usize) -> AppResult<Vec<String>>;

    /// Keeps only list elements between `start` and `stop`, both inclusive.
    async fn trim(&self, key: &str, start: usize, stop: usize) -> AppResult<()>;
}
