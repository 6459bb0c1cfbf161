use serde::{Deserialize, Serialize};
use tagpulse_domain::{AggregateResult, HistoryEntry, RateLimitInfo, RetryAdvice};

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Query string of the on-demand counting endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct CountParams {
    pub q: Option<String>,
    pub granularity: Option<String>,
    pub retweets: Option<String>,
}

/// Throttled on-demand result: unresolved counts plus retry guidance.
#[derive(Debug, Serialize)]
pub struct ThrottledCountResponse {
    #[serde(flatten)]
    pub result: AggregateResult,
    pub note: &'static str,
    #[serde(flatten)]
    pub retry: RetryAdvice,
    pub retry_after_ms: u64,
}

/// Upstream failure echoed with its diagnostics.
#[derive(Debug, Serialize)]
pub struct UpstreamErrorResponse {
    pub error: &'static str,
    pub status: Option<u16>,
    pub body: String,
    pub rate_limit: RateLimitInfo,
}

/// Snapshot feed before the first refresh was persisted.
#[derive(Debug, Serialize)]
pub struct SnapshotPendingResponse {
    pub ready: bool,
    pub note: &'static str,
}

/// Snapshot feed with the latest result inlined.
#[derive(Debug, Serialize)]
pub struct SnapshotReadyResponse {
    pub ready: bool,
    pub hashtag: String,
    #[serde(flatten)]
    pub latest: AggregateResult,
    pub history: Vec<HistoryEntry>,
}

/// Outcome of one scheduled refresh trigger.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryAdvice>,
    pub rate: RateLimitInfo,
}

#[derive(Debug, Serialize)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub snapshot_store: HealthDependencyStatus,
    pub corrupt_snapshot_entries: u64,
}
