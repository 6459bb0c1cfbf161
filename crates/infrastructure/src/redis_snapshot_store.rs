//! Redis-backed snapshot key-value store.

use async_trait::async_trait;
use redis::AsyncCommands;
use tagpulse_application::SnapshotKeyValueStore;
use tagpulse_core::{AppError, AppResult};

/// Redis implementation of the snapshot key-value port.
#[derive(Clone)]
pub struct RedisSnapshotStore {
    client: redis::Client,
}

impl RedisSnapshotStore {
    /// Creates a store with a configured Redis client.
    #[must_use]
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }
}

fn list_index(value: usize) -> AppResult<isize> {
    isize::try_from(value)
        .map_err(|error| AppError::Internal(format!("invalid redis list index {value}: {error}")))
}

#[async_trait]
impl SnapshotKeyValueStore for RedisSnapshotStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut connection = self.connection().await?;
        connection.get(key).await.map_err(|error| {
            AppError::Internal(format!("failed to read snapshot key '{key}': {error}"))
        })
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        let mut connection = self.connection().await?;
        connection.set(key, value).await.map_err(|error| {
            AppError::Internal(format!("failed to write snapshot key '{key}': {error}"))
        })
    }

    async fn push_front(&self, key: &str, value: String) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let _length: usize = connection.lpush(key, value).await.map_err(|error| {
            AppError::Internal(format!("failed to push snapshot history '{key}': {error}"))
        })?;
        Ok(())
    }

    async fn range(&self, key: &str, start: usize, stop: usize) -> AppResult<Vec<String>> {
        let mut connection = self.connection().await?;
        connection
            .lrange(key, list_index(start)?, list_index(stop)?)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read snapshot history '{key}': {error}"))
            })
    }

    async fn trim(&self, key: &str, start: usize, stop: usize) -> AppResult<()> {
        let mut connection = self.connection().await?;
        connection
            .ltrim(key, list_index(start)?, list_index(stop)?)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to trim snapshot history '{key}': {error}"))
            })
    }
}
