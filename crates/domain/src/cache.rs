use crate::RetryAdvice;

/// Intermediary cache lifetimes attached to one response surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Shared-cache freshness for resolved results.
    pub max_age_seconds: u32,
    /// Window in which a stale copy may be served while revalidating.
    pub stale_while_revalidate_seconds: u32,
    /// Upper bound on shared-cache freshness for throttled results.
    pub throttled_max_age_seconds: u32,
}

impl CachePolicy {
    /// Lifetimes for the on-demand counting endpoint.
    #[must_use]
    pub fn on_demand() -> Self {
        Self {
            max_age_seconds: 60,
            stale_while_revalidate_seconds: 600,
            throttled_max_age_seconds: 15,
        }
    }

    /// Lifetimes for the snapshot feed, which never reaches the upstream.
    #[must_use]
    pub fn snapshot_feed() -> Self {
        Self {
            max_age_seconds: 30,
            stale_while_revalidate_seconds: 300,
            throttled_max_age_seconds: 15,
        }
    }

    /// Returns the `Cache-Control` value for a resolved result.
    #[must_use]
    pub fn cache_control(&self) -> String {
        format!(
            "s-maxage={}, stale-while-revalidate={}",
            self.max_age_seconds, self.stale_while_revalidate_seconds
        )
    }

    /// Returns the `Cache-Control` value for a throttled result.
    ///
    /// Never outlives the retry advice and never serves stale copies.
    #[must_use]
    pub fn throttled_cache_control(&self, advice: &RetryAdvice) -> String {
        let max_age = u64::from(self.throttled_max_age_seconds).min(advice.retry_after_seconds);
        format!("s-maxage={max_age}")
    }
}
