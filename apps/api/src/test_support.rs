use std::sync::Arc;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tagpulse_application::{
    Clock, CountRequest, CountService, CountingApi, FetchOutcome, FetchResponse, PipelineConfig,
    RefreshService, SnapshotConfig, SnapshotStore,
};
use tagpulse_core::AppResult;
use tagpulse_domain::{CachePolicy, CountQuery, Granularity, RateLimitInfo, RawBucket, RawCounts};
use tagpulse_infrastructure::InMemorySnapshotStore;

use crate::state::AppState;

pub(crate) struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// 2025-01-01T12:00:00Z.
pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_735_732_800_000)
        .single()
        .unwrap_or_else(|| unreachable!())
}

/// Upstream fake that replays one canned response.
pub(crate) struct CannedCountingApi {
    response: FetchResponse,
}

#[async_trait]
impl CountingApi for CannedCountingApi {
    async fn fetch_counts(
        &self,
        _request: &CountRequest,
        _bearer_token: &str,
    ) -> AppResult<FetchResponse> {
        Ok(self.response.clone())
    }
}

pub(crate) fn success_response(counts: &[u64]) -> FetchResponse {
    FetchResponse {
        rate_limit: RateLimitInfo {
            remaining: Some(299),
            limit: Some(300),
            reset: Some(fixed_now().timestamp() + 900),
        },
        outcome: FetchOutcome::Success(RawCounts {
            data: Some(
                counts
                    .iter()
                    .map(|count| RawBucket {
                        start: "2025-01-01T10:00:00.000Z".to_owned(),
                        end: "2025-01-01T11:00:00.000Z".to_owned(),
                        tweet_count: Some(*count),
                    })
                    .collect(),
            ),
            meta: None,
        }),
    }
}

pub(crate) fn throttled_response(reset: i64) -> FetchResponse {
    FetchResponse {
        rate_limit: RateLimitInfo {
            remaining: Some(0),
            limit: Some(300),
            reset: Some(reset),
        },
        outcome: FetchOutcome::Throttled,
    }
}

pub(crate) fn app_state(response: FetchResponse, bearer_token: Option<&str>) -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(fixed_now()));
    let count_service = CountService::new(
        Arc::new(CannedCountingApi { response }),
        clock.clone(),
        PipelineConfig::new(bearer_token.map(str::to_owned)),
    );
    let snapshot_store = SnapshotStore::new(
        Arc::new(InMemorySnapshotStore::new()),
        clock,
        SnapshotConfig::for_hashtag("#21MWithPrivacy").unwrap_or_else(|_| unreachable!()),
    );
    let query = CountQuery::new("#21MWithPrivacy", true, Granularity::Hour)
        .unwrap_or_else(|_| unreachable!());
    let refresh_service =
        RefreshService::new(count_service.clone(), snapshot_store.clone(), query);

    AppState {
        count_service,
        snapshot_store,
        refresh_service,
        on_demand_cache: CachePolicy::on_demand(),
        snapshot_cache: CachePolicy::snapshot_feed(),
        cron_secret: None,
        redis_client: None,
    }
}

pub(crate) fn header_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

pub(crate) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|_| unreachable!());
    serde_json::from_slice(&bytes).unwrap_or_else(|_| unreachable!())
}
