use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::window::iso_millis;
use crate::{CountQuery, Granularity, RateLimitInfo, TimeWindow};

/// Counting endpoint payload as returned on success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawCounts {
    /// Per-bucket counts in upstream order.
    #[serde(default)]
    pub data: Option<Vec<RawBucket>>,
    /// Response metadata, including the optional authoritative total.
    #[serde(default)]
    pub meta: Option<RawCountsMeta>,
}

/// One upstream bucket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawBucket {
    /// Bucket start as sent by the upstream.
    pub start: String,
    /// Bucket end as sent by the upstream.
    pub end: String,
    /// Matches inside the bucket.
    #[serde(default)]
    pub tweet_count: Option<u64>,
}

/// Upstream response metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawCountsMeta {
    /// Authoritative total across all buckets.
    #[serde(default)]
    pub total_tweet_count: Option<u64>,
}

/// Count of matches within one granularity-sized sub-interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBucket {
    /// Bucket start.
    pub start: String,
    /// Bucket end.
    pub end: String,
    /// Matches inside the bucket.
    pub count: u64,
}

/// Result of one counting pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Caller-supplied query.
    #[serde(alias = "hashtag")]
    pub query: String,
    /// Query string actually sent upstream.
    pub evaluated_query: String,
    /// Whether retweets were counted.
    pub include_retweets: bool,
    /// Counted interval.
    #[serde(flatten)]
    pub window: TimeWindow,
    /// Bucket size.
    pub granularity: Granularity,
    /// Total matches; `None` only when the fetch was throttled.
    pub total: Option<u64>,
    /// Buckets in chronological order.
    #[serde(rename = "per")]
    pub buckets: Vec<CountBucket>,
    /// Telemetry echoed from the upstream response.
    pub rate_limit: RateLimitInfo,
    /// Instant the upstream response was processed.
    #[serde(with = "iso_millis")]
    pub fetched_at: DateTime<Utc>,
}

impl AggregateResult {
    /// Builds the unresolved result reported for a throttled fetch.
    #[must_use]
    pub fn throttled(
        query: &CountQuery,
        window: TimeWindow,
        rate_limit: RateLimitInfo,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            query: query.base_query().to_owned(),
            evaluated_query: query.evaluated_query(),
            include_retweets: query.include_retweets(),
            window,
            granularity: query.granularity(),
            total: None,
            buckets: Vec::new(),
            rate_limit,
            fetched_at,
        }
    }

    /// Returns true when the result carries no resolved total.
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        self.total.is_none()
    }
}

/// Reduces an upstream payload into an aggregate result.
///
/// An authoritative upstream total wins; otherwise buckets are summed with
/// missing counts treated as zero.
#[must_use]
pub fn aggregate(
    query: &CountQuery,
    window: TimeWindow,
    raw: RawCounts,
    rate_limit: RateLimitInfo,
    fetched_at: DateTime<Utc>,
) -> AggregateResult {
    let buckets: Vec<CountBucket> = raw
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|bucket| CountBucket {
            start: bucket.start,
            end: bucket.end,
            count: bucket.tweet_count.unwrap_or(0),
        })
        .collect();

    let total = raw
        .meta
        .and_then(|meta| meta.total_tweet_count)
        .unwrap_or_else(|| {
            buckets
                .iter()
                .fold(0_u64, |sum, bucket| sum.saturating_add(bucket.count))
        });

    AggregateResult {
        query: query.base_query().to_owned(),
        evaluated_query: query.evaluated_query(),
        include_retweets: query.include_retweets(),
        window,
        granularity: query.granularity(),
        total: Some(total),
        buckets,
        rate_limit,
        fetched_at,
    }
}
