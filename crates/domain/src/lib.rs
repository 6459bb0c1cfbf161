//! Domain types and pure algorithms for post counting.

#![forbid(unsafe_code)]

mod cache;
mod counts;
mod query;
mod rate_limit;
mod snapshot;
mod window;

pub use cache::CachePolicy;
pub use counts::{AggregateResult, CountBucket, RawBucket, RawCounts, RawCountsMeta, aggregate};
pub use query::{CountQuery, Granularity, RETWEET_EXCLUSION};
pub use rate_limit::{
    DEFAULT_THROTTLE_FALLBACK_MINUTES, MAX_THROTTLE_FALLBACK_MINUTES, RATE_LIMIT_LIMIT_HEADER,
    RATE_LIMIT_REMAINING_HEADER, RATE_LIMIT_RESET_HEADER, RateLimitInfo, RetryAdvice,
};
pub use snapshot::{DEFAULT_HISTORY_LIMIT, HistoryEntry, SnapshotView};
pub use window::{
    DEFAULT_LOOKBACK_HOURS, DEFAULT_WINDOW_BUFFER_SECONDS, MAX_LOOKBACK_HOURS,
    MAX_WINDOW_BUFFER_SECONDS, TimeWindow, WindowSettings, format_iso_millis,
};
