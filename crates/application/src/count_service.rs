use std::sync::Arc;

use tagpulse_core::{AppError, AppResult};
use tagpulse_domain::{
    AggregateResult, CountQuery, Granularity, RateLimitInfo, RetryAdvice, TimeWindow, aggregate,
};
use tracing::{debug, warn};

use crate::counting_ports::{Clock, CountRequest, CountingApi, FetchOutcome};
use crate::pipeline_config::PipelineConfig;


/// Caller input for the on-demand path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountInput {
    /// Base query; required.
    pub query: Option<String>,
    /// Bucket size; defaults to hourly.
    pub granularity: Option<Granularity>,
    /// Whether retweets are counted; defaults to true.
    pub include_retweets: Option<bool>,
}

/// Upstream failure preserved for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure {
    /// Upstream HTTP status; `None` for transport failures.
    pub status: Option<u16>,
    /// Raw upstream body or transport error description.
    pub body: String,
    /// Telemetry read from the failed response.
    pub rate_limit: RateLimitInfo,
}

/// Terminal result of one counting invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountOutcome {
    /// Upstream answered and the buckets were aggregated.
    Counted(AggregateResult),
    /// Upstream quota exhausted; `result.total` is `None`.
    Throttled {
        /// Unresolved result echoing the query and window.
        result: AggregateResult,
        /// When to try again.
        retry: RetryAdvice,
    },
    /// Upstream answered with an error or never answered.
    UpstreamError(UpstreamFailure),
}

/// Window, fetch, rate-limit policy and aggregation for one query.
#[derive(Clone)]
pub struct CountService {
    counting_api: Arc<dyn CountingApi>,
    clock: Arc<dyn Clock>,
    config: PipelineConfig,
}

impl CountService {
    /// Creates a counting service.
    #[must_use]
    pub fn new(
        counting_api: Arc<dyn CountingApi>,
        clock: Arc<dyn Clock>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            counting_api,
            clock,
            config,
        }
    }

    /// Validates raw caller input and counts it.
    pub async fn count(&self, input: CountInput) -> AppResult<CountOutcome> {
        let query = CountQuery::new(
            input.query.unwrap_or_default(),
            input.include_retweets.unwrap_or(true),
            input.granularity.unwrap_or_default(),
        )?;

        self.count_query(&query).await
    }

    /// Counts an already validated query.
    ///
    /// Fails with [`AppError::Config`] before any network call when no
    /// credential is configured.
    pub async fn count_query(&self, query: &CountQuery) -> AppResult<CountOutcome> {
        let bearer_token = self.config.bearer_token.as_deref().ok_or_else(|| {
            AppError::Config("missing upstream bearer token (X_BEARER_TOKEN)".to_owned())
        })?;

        let window = TimeWindow::ending_before(self.clock.now(), &self.config.window)?;
        let request = CountRequest {
            query: query.clone(),
            window,
        };

        let response = self
            .counting_api
            .fetch_counts(&request, bearer_token)
            .await?;
        let now = self.clock.now();

        debug!(
            evaluated_query = %query.evaluated_query(),
            remaining = ?response.rate_limit.remaining,
            reset = ?response.rate_limit.reset,
            "counting request completed"
        );

        Ok(match response.outcome {
            FetchOutcome::Success(raw) => {
                CountOutcome::Counted(aggregate(query, window, raw, response.rate_limit, now))
            }
            FetchOutcome::Throttled => {
                let retry = RetryAdvice::from_rate_limit(
                    &response.rate_limit,
                    now,
                    self.config.throttle_fallback,
                );
                warn!(
                    evaluated_query = %query.evaluated_query(),
                    retry_after_seconds = retry.retry_after_seconds,
                    "counting request throttled"
                );

                CountOutcome::Throttled {
                    result: AggregateResult::throttled(query, window, response.rate_limit, now),
                    retry,
                }
            }
            FetchOutcome::UpstreamError { status, body } => {
                warn!(
                    evaluated_query = %query.evaluated_query(),
                    status = ?status,
                    "counting request failed upstream"
                );

                CountOutcome::UpstreamError(UpstreamFailure {
                    status,
                    body,
                    rate_limit: response.rate_limit,
                })
            }
        })
    }
}
