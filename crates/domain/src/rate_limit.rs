use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::window::iso_millis;

/// Header carrying the remaining request quota.
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-rate-limit-remaining";
/// Header carrying the quota size of the current window.
pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-rate-limit-limit";
/// Header carrying the quota reset instant in epoch seconds.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Default retry delay used when the upstream omits a usable reset value.
pub const DEFAULT_THROTTLE_FALLBACK_MINUTES: i64 = 15;

/// Largest configurable fallback retry delay.
pub const MAX_THROTTLE_FALLBACK_MINUTES: i64 = 24 * 60;

/// Rate-limit telemetry read from one upstream response.
///
/// Every field is optional because the upstream may omit or garble any header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    /// Requests left in the current quota window.
    pub remaining: Option<i64>,
    /// Quota size of the current window.
    pub limit: Option<i64>,
    /// Quota reset instant in epoch seconds.
    pub reset: Option<i64>,
}

impl RateLimitInfo {
    /// Builds telemetry from raw header values, discarding non-numeric ones.
    #[must_use]
    pub fn from_header_values(
        remaining: Option<&str>,
        limit: Option<&str>,
        reset: Option<&str>,
    ) -> Self {
        Self {
            remaining: parse_header_integer(remaining),
            limit: parse_header_integer(limit),
            reset: parse_header_integer(reset),
        }
    }
}

fn parse_header_integer(value: Option<&str>) -> Option<i64> {
    value.and_then(|raw| raw.trim().parse::<i64>().ok())
}

/// Retry guidance computed for a throttled fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryAdvice {
    /// Absolute instant after which a retry is expected to succeed.
    #[serde(with = "iso_millis")]
    pub retry_at: DateTime<Utc>,
    /// Whole seconds to wait, never below one.
    pub retry_after_seconds: u64,
}

impl RetryAdvice {
    /// Computes retry guidance from throttling telemetry.
    ///
    /// Uses the advertised reset instant when present and falls back to
    /// `now + fallback` otherwise.
    #[must_use]
    pub fn from_rate_limit(
        rate_limit: &RateLimitInfo,
        now: DateTime<Utc>,
        fallback: TimeDelta,
    ) -> Self {
        let retry_at = rate_limit
            .reset
            .and_then(|reset| reset.checked_mul(1000))
            .and_then(|reset_ms| Utc.timestamp_millis_opt(reset_ms).single())
            .unwrap_or_else(|| {
                now.checked_add_signed(fallback)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            });

        let remaining_ms = u64::try_from((retry_at - now).num_milliseconds()).unwrap_or(0);
        let retry_after_seconds = remaining_ms.div_ceil(1000).max(1);

        Self {
            retry_at,
            retry_after_seconds,
        }
    }

    /// Returns the retry delay in milliseconds.
    #[must_use]
    pub fn retry_after_ms(&self) -> u64 {
        self.retry_after_seconds.saturating_mul(1000)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};

    use super::{RateLimitInfo, RetryAdvice};

    fn fixed_now() -> chrono::DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_250)
            .single()
            .unwrap_or_else(|| unreachable!())
    }

    #[test]
    fn header_values_tolerate_garbage() {
        let info = RateLimitInfo::from_header_values(Some(" 12 "), Some("abc"), None);
        assert_eq!(info.remaining, Some(12));
        assert_eq!(info.limit, None);
        assert_eq!(info.reset, None);
    }

    #[test]
    fn reset_header_drives_retry_time() {
        let now = fixed_now();
        let reset = now.timestamp() + 100;
        let info = RateLimitInfo {
            remaining: Some(0),
            limit: Some(300),
            reset: Some(reset),
        };

        let advice = RetryAdvice::from_rate_limit(&info, now, TimeDelta::minutes(15));

        assert_eq!(advice.retry_at.timestamp_millis(), reset * 1000);
        assert!((99..=101).contains(&advice.retry_after_seconds));
    }

    #[test]
    fn missing_reset_falls_back_to_fifteen_minutes() {
        let now = fixed_now();
        let advice = RetryAdvice::from_rate_limit(
            &RateLimitInfo::from_header_values(None, None, Some("soon")),
            now,
            TimeDelta::minutes(15),
        );

        assert_eq!(advice.retry_at, now + TimeDelta::minutes(15));
        assert_eq!(advice.retry_after_seconds, 900);
        assert_eq!(advice.retry_after_ms(), 900_000);
    }

    #[test]
    fn reset_in_the_past_still_waits_one_second() {
        let now = fixed_now();
        let info = RateLimitInfo {
            remaining: Some(0),
            limit: None,
            reset: Some(now.timestamp() - 60),
        };

        let advice = RetryAdvice::from_rate_limit(&info, now, TimeDelta::minutes(15));

        assert_eq!(advice.retry_after_seconds, 1);
    }

    #[test]
    fn partial_seconds_round_up() {
        let now = fixed_now();
        let info = RateLimitInfo {
            remaining: None,
            limit: None,
            reset: Some(now.timestamp() + 600),
        };

        let advice = RetryAdvice::from_rate_limit(&info, now, TimeDelta::minutes(15));

        // now carries 250ms past the second, so 599.75s rounds up to 600.
        assert_eq!(advice.retry_after_seconds, 600);
        assert_eq!(advice.retry_after_ms(), 600_000);
    }

    #[test]
    fn oversized_fallback_saturates_instead_of_overflowing() {
        let now = fixed_now();
        let advice = RetryAdvice::from_rate_limit(&RateLimitInfo::default(), now, TimeDelta::MAX);

        assert_eq!(advice.retry_at, chrono::DateTime::<Utc>::MAX_UTC);
        assert!(advice.retry_after_seconds > 1);
    }
}
