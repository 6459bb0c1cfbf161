use serde::{Deserialize, Serialize};

use crate::AggregateResult;

/// Default number of history entries kept: one day of 15-minute runs plus slack.
pub const DEFAULT_HISTORY_LIMIT: usize = 101;

/// Compact trend point appended after every persisted refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Persist instant in epoch milliseconds.
    #[serde(rename = "ts")]
    pub timestamp_ms: i64,
    /// Total recorded at that instant.
    pub total: u64,
}

/// What the read path sees in the persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotView {
    /// No refresh has been persisted yet.
    NotReady,
    /// Latest result plus most-recent-first history.
    Ready {
        /// Last persisted aggregate.
        latest: Box<AggregateResult>,
        /// Trend points, most recent first.
        history: Vec<HistoryEntry>,
    },
}

impl SnapshotView {
    /// Returns true when a refresh has been persisted.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}
