use tagpulse_core::{AppError, AppResult};
use tagpulse_domain::{CountQuery, RateLimitInfo, RetryAdvice};
use tracing::info;

use crate::count_service::{CountOutcome, CountService, UpstreamFailure};
use crate::snapshot_service::SnapshotStore;

#[cfg(test)]
mod tests;

/// Terminal state of one scheduled refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Snapshot overwritten and history appended.
    Persisted {
        /// Persisted total.
        total: u64,
        /// Telemetry echoed from the upstream.
        rate_limit: RateLimitInfo,
    },
    /// Upstream throttled; the previous snapshot was left untouched.
    SkippedThrottled {
        /// Telemetry echoed from the upstream.
        rate_limit: RateLimitInfo,
        /// When the next attempt is expected to succeed.
        retry: RetryAdvice,
    },
    /// Upstream failed; the previous snapshot was left untouched.
    UpstreamError(UpstreamFailure),
    /// Server configuration prevented the fetch.
    ConfigError(String),
}

/// Scheduled pipeline: count the configured query and persist the result.
///
/// Runs exactly once per trigger; retrying is left to the next trigger.
#[derive(Clone)]
pub struct RefreshService {
    count_service: CountService,
    snapshot_store: SnapshotStore,
    query: CountQuery,
}

impl RefreshService {
    /// Creates a refresh service for one fixed query.
    #[must_use]
    pub fn new(
        count_service: CountService,
        snapshot_store: SnapshotStore,
        query: CountQuery,
    ) -> Self {
        Self {
            count_service,
            snapshot_store,
            query,
        }
    }

    /// Returns the query this service refreshes.
    #[must_use]
    pub fn query(&self) -> &CountQuery {
        &self.query
    }

    /// Runs one refresh. Store failures surface as errors; every upstream
    /// condition is a terminal outcome.
    pub async fn run(&self) -> AppResult<RefreshOutcome> {
        let outcome = match self.count_service.count_query(&self.query).await {
            Ok(outcome) => outcome,
            Err(AppError::Config(message)) => return Ok(RefreshOutcome::ConfigError(message)),
            Err(error) => return Err(error),
        };

        match outcome {
            CountOutcome::Counted(result) => {
                let entry = self
                    .snapshot_store
                    .write_latest_and_append_history(&result)
                    .await?;
                info!(
                    evaluated_query = %result.evaluated_query,
                    total = entry.total,
                    "snapshot refreshed"
                );

                Ok(RefreshOutcome::Persisted {
                    total: entry.total,
                    rate_limit: result.rate_limit,
                })
            }
            CountOutcome::Throttled { result, retry } => Ok(RefreshOutcome::SkippedThrottled {
                rate_limit: result.rate_limit,
                retry,
            }),
            CountOutcome::UpstreamError(failure) => Ok(RefreshOutcome::UpstreamError(failure)),
        }
    }
}
