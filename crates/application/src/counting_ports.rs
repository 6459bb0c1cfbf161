use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tagpulse_core::AppResult;
use tagpulse_domain::{CountQuery, RateLimitInfo, RawCounts, TimeWindow};

/// One counting request: the built query plus the window it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRequest {
    /// Validated query, including the retweet flag and granularity.
    pub query: CountQuery,
    /// Interval to count.
    pub window: TimeWindow,
}

/// Classified upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx with a parseable payload.
    Success(RawCounts),
    /// HTTP 429.
    Throttled,
    /// Any other failure. `status` is `None` when no response arrived at all.
    UpstreamError {
        /// Upstream HTTP status, if a response was received.
        status: Option<u16>,
        /// Raw response body or transport error description.
        body: String,
    },
}

/// Upstream response with telemetry read regardless of outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Rate-limit headers of the response; all unknown on transport failure.
    pub rate_limit: RateLimitInfo,
    /// Classified result.
    pub outcome: FetchOutcome,
}

impl FetchResponse {
    /// Builds the response reported when the request never got an answer.
    #[must_use]
    pub fn transport_failure(description: impl Into<String>) -> Self {
        Self {
            rate_limit: RateLimitInfo::default(),
            outcome: FetchOutcome::UpstreamError {
                status: None,
                body: description.into(),
            },
        }
    }
}

/// Port for the rate-limited counting endpoint.
///
/// Implementations issue exactly one request per call and must report
/// throttling as [`FetchOutcome::Throttled`] rather than as an error.
#[async_trait]
pub trait CountingApi: Send + Sync {
    /// Issues one counting request.
    async fn fetch_counts(
        &self,
        request: &CountRequest,
        bearer_token: &str,
    ) -> AppResult<FetchResponse>;
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
