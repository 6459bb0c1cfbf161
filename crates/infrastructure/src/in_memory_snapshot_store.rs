use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tagpulse_application::SnapshotKeyValueStore;
use tagpulse_core::AppResult;
use tokio::sync::RwLock;

/// Process-local snapshot store for development and tests.
///
/// Not durable across restarts.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    scalars: RwLock<HashMap<String, String>>,
    lists: RwLock<HashMap<String, VecDeque<String>>>,
}

impl InMemorySnapshotStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotKeyValueStore for InMemorySnapshotStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.scalars.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        self.scalars.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn push_front(&self, key: &str, value: String) -> AppResult<()> {
        self.lists
            .write()
            .await
            .entry(key.to_owned())
            .or_default()
            .push_front(value);
        Ok(())
    }

    async fn range(&self, key: &str, start: usize, stop: usize) -> AppResult<Vec<String>> {
        let lists = self.lists.read().await;
        let Some(list) = lists.get(key) else {
            return Ok(Vec::new());
        };

        Ok(list
            .iter()
            .skip(start)
            .take(stop.saturating_sub(start).saturating_add(1))
            .cloned()
            .collect())
    }

    async fn trim(&self, key: &str, start: usize, stop: usize) -> AppResult<()> {
        let mut lists = self.lists.write().await;
        if let Some(list) = lists.get_mut(key) {
            list.truncate(stop.saturating_add(1));
            list.drain(..start.min(list.len()));
        }

        Ok(())
    }
}
