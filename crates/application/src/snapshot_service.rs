use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tagpulse_core::{AppError, AppResult};
use tagpulse_domain::{AggregateResult, HistoryEntry, SnapshotView};
use tracing::warn;

use crate::counting_ports::Clock;
use crate::pipeline_config::SnapshotConfig;
use crate::snapshot_ports::SnapshotKeyValueStore;


/// Durable `{latest, history}` pair and its no-network read path.
///
/// `latest` is last-write-wins. History appends are not transactional: each
/// writer trims after its own push, so racing writers may briefly exceed the
/// bound but never grow it without limit.
#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn SnapshotKeyValueStore>,
    clock: Arc<dyn Clock>,
    config: SnapshotConfig,
    corrupt_entries: Arc<AtomicU64>,
}

impl SnapshotStore {
    /// Creates a snapshot store over a key-value collaborator.
    #[must_use]
    pub fn new(
        store: Arc<dyn SnapshotKeyValueStore>,
        clock: Arc<dyn Clock>,
        config: SnapshotConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
            corrupt_entries: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Overwrites `latest` and prepends one trimmed history entry.
    ///
    /// Only resolved results may be persisted.
    pub async fn write_latest_and_append_history(
        &self,
        result: &AggregateResult,
    ) -> AppResult<HistoryEntry> {
        let total = result.total.ok_or_else(|| {
            AppError::Internal("refusing to persist a throttled result".to_owned())
        })?;

        let latest = serde_json::to_string(result).map_err(|error| {
            AppError::Internal(format!("failed to encode latest snapshot: {error}"))
        })?;
        self.store.set(&self.config.latest_key(), latest).await?;

        let entry = HistoryEntry {
            timestamp_ms: self.clock.now().timestamp_millis(),
            total,
        };
        let encoded_entry = serde_json::to_string(&entry).map_err(|error| {
            AppError::Internal(format!("failed to encode history entry: {error}"))
        })?;

        let history_key = self.config.history_key();
        self.store.push_front(&history_key, encoded_entry).await?;
        self.store
            .trim(&history_key, 0, self.config.history_limit() - 1)
            .await?;

        Ok(entry)
    }

    /// Returns the persisted snapshot, or [`SnapshotView::NotReady`] on cold start.
    ///
    /// Undecodable entries are dropped and counted rather than returned.
    pub async fn read_latest_with_history(&self) -> AppResult<SnapshotView> {
        let Some(encoded_latest) = self.store.get(&self.config.latest_key()).await? else {
            return Ok(SnapshotView::NotReady);
        };

        let latest = match serde_json::from_str::<AggregateResult>(encoded_latest.as_str()) {
            Ok(latest) => latest,
            Err(error) => {
                self.record_corrupt_entry();
                warn!(
                    key = %self.config.latest_key(),
                    error = %error,
                    "dropping undecodable latest snapshot"
                );
                return Ok(SnapshotView::NotReady);
            }
        };

        let history = self
            .store
            .range(&self.config.history_key(), 0, self.config.history_limit() - 1)
            .await?
            .into_iter()
            .filter_map(|raw| match serde_json::from_str::<HistoryEntry>(raw.as_str()) {
                Ok(entry) => Some(entry),
                Err(error) => {
                    self.record_corrupt_entry();
                    warn!(
                        key = %self.config.history_key(),
                        error = %error,
                        "dropping undecodable history entry"
                    );
                    None
                }
            })
            .collect();

        Ok(SnapshotView::Ready {
            latest: Box::new(latest),
            history,
        })
    }

    /// Number of undecodable entries dropped by this store so far.
    #[must_use]
    pub fn corrupt_entry_count(&self) -> u64 {
        self.corrupt_entries.load(Ordering::Relaxed)
    }

    fn record_corrupt_entry(&self) {
        self.corrupt_entries.fetch_add(1, Ordering::Relaxed);
    }
}
