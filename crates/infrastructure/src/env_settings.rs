//! Environment-driven pipeline settings shared by the API and worker binaries.

use std::time::Duration;

use chrono::TimeDelta;
use tagpulse_application::{PipelineConfig, SnapshotConfig};
use tagpulse_core::{AppError, AppResult};
use tagpulse_domain::{
    CachePolicy, CountQuery, DEFAULT_HISTORY_LIMIT, DEFAULT_LOOKBACK_HOURS,
    DEFAULT_THROTTLE_FALLBACK_MINUTES, DEFAULT_WINDOW_BUFFER_SECONDS, Granularity,
    MAX_THROTTLE_FALLBACK_MINUTES, WindowSettings,
};

use crate::http_counting_api::DEFAULT_COUNTING_API_BASE_URL;

/// Hashtag refreshed by the scheduled pipeline when none is configured.
pub const DEFAULT_HASHTAG: &str = "#21MWithPrivacy";

const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 15;
const MAX_UPSTREAM_TIMEOUT_SECONDS: u64 = 300;

/// Resolved pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Upstream bearer credential, if configured.
    pub bearer_token: Option<String>,
    /// Upstream API origin.
    pub api_base_url: String,
    /// Per-request timeout of the upstream HTTP client.
    pub upstream_timeout: Duration,
    /// Query counted by the scheduled pipeline.
    pub hashtag: String,
    /// Whether the scheduled query counts retweets.
    pub include_retweets: bool,
    /// Bucket size of the scheduled query.
    pub granularity: Granularity,
    /// Window sizing shared by both paths.
    pub window: WindowSettings,
    /// Retry delay used when a throttled response carries no reset.
    pub throttle_fallback: TimeDelta,
    /// Snapshot key prefix.
    pub snapshot_key_prefix: String,
    /// History entries kept per write.
    pub history_limit: usize,
    /// Cache lifetimes of the on-demand endpoint.
    pub on_demand_cache: CachePolicy,
    /// Cache lifetimes of the snapshot feed.
    pub snapshot_cache: CachePolicy,
}

impl PipelineSettings {
    /// Loads settings from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let hashtag = env
            .non_empty("HASHTAG")
            .unwrap_or_else(|| DEFAULT_HASHTAG.to_owned());
        let snapshot_key_prefix = env.non_empty("SNAPSHOT_KEY_PREFIX").unwrap_or_else(|| {
            format!("hashtag:{}", hashtag.trim().trim_start_matches('#'))
        });

        let granularity = match env.non_empty("GRANULARITY") {
            Some(value) => Granularity::parse_transport(&value).map_err(|error| {
                AppError::Config(format!("invalid GRANULARITY value '{value}': {error}"))
            })?,
            None => Granularity::default(),
        };

        let buffer = env.parse_duration(
            "WINDOW_BUFFER_SECONDS",
            DEFAULT_WINDOW_BUFFER_SECONDS,
            TimeDelta::try_seconds,
        )?;
        let lookback = env.parse_duration(
            "WINDOW_LOOKBACK_HOURS",
            DEFAULT_LOOKBACK_HOURS,
            TimeDelta::try_hours,
        )?;
        let window = WindowSettings::new(buffer, lookback)
            .map_err(|error| AppError::Config(error.to_string()))?;

        let throttle_fallback = env.parse_duration(
            "THROTTLE_FALLBACK_MINUTES",
            DEFAULT_THROTTLE_FALLBACK_MINUTES,
            TimeDelta::try_minutes,
        )?;
        if throttle_fallback <= TimeDelta::zero()
            || throttle_fallback > TimeDelta::minutes(MAX_THROTTLE_FALLBACK_MINUTES)
        {
            return Err(AppError::Config(format!(
                "THROTTLE_FALLBACK_MINUTES must be between 1 and {MAX_THROTTLE_FALLBACK_MINUTES}"
            )));
        }

        let upstream_timeout_seconds =
            env.parse_u64("UPSTREAM_TIMEOUT_SECONDS", DEFAULT_UPSTREAM_TIMEOUT_SECONDS)?;
        if !(1..=MAX_UPSTREAM_TIMEOUT_SECONDS).contains(&upstream_timeout_seconds) {
            return Err(AppError::Config(format!(
                "UPSTREAM_TIMEOUT_SECONDS must be between 1 and {MAX_UPSTREAM_TIMEOUT_SECONDS}"
            )));
        }

        let on_demand_defaults = CachePolicy::on_demand();
        let snapshot_defaults = CachePolicy::snapshot_feed();
        let throttled_max_age = env.parse_u32(
            "THROTTLED_CACHE_MAX_AGE_SECONDS",
            on_demand_defaults.throttled_max_age_seconds,
        )?;

        Ok(Self {
            bearer_token: env.non_empty("X_BEARER_TOKEN"),
            api_base_url: env
                .non_empty("X_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_COUNTING_API_BASE_URL.to_owned()),
            upstream_timeout: Duration::from_secs(upstream_timeout_seconds),
            include_retweets: env.parse_bool("INCLUDE_RETWEETS", true)?,
            granularity,
            window,
            throttle_fallback,
            snapshot_key_prefix,
            history_limit: env.parse_usize("HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?,
            on_demand_cache: CachePolicy {
                max_age_seconds: env.parse_u32(
                    "X_COUNT_CACHE_MAX_AGE_SECONDS",
                    on_demand_defaults.max_age_seconds,
                )?,
                stale_while_revalidate_seconds: env.parse_u32(
                    "X_COUNT_CACHE_STALE_SECONDS",
                    on_demand_defaults.stale_while_revalidate_seconds,
                )?,
                throttled_max_age_seconds: throttled_max_age,
            },
            snapshot_cache: CachePolicy {
                max_age_seconds: env.parse_u32(
                    "HASHTAG_CACHE_MAX_AGE_SECONDS",
                    snapshot_defaults.max_age_seconds,
                )?,
                stale_while_revalidate_seconds: env.parse_u32(
                    "HASHTAG_CACHE_STALE_SECONDS",
                    snapshot_defaults.stale_while_revalidate_seconds,
                )?,
                throttled_max_age_seconds: throttled_max_age,
            },
            hashtag,
        })
    }

    /// Counting configuration derived from these settings.
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            window: self.window,
            throttle_fallback: self.throttle_fallback,
            ..PipelineConfig::new(self.bearer_token.clone())
        }
    }

    /// Snapshot key layout derived from these settings.
    pub fn snapshot_config(&self) -> AppResult<SnapshotConfig> {
        SnapshotConfig::new(self.snapshot_key_prefix.clone(), self.history_limit)
    }

    /// Query refreshed by the scheduled pipeline.
    pub fn refresh_query(&self) -> AppResult<CountQuery> {
        CountQuery::new(self.hashtag.clone(), self.include_retweets, self.granularity)
            .map_err(|error| AppError::Config(format!("invalid HASHTAG: {error}")))
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn non_empty(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn parse_i64(&self, name: &str, default: i64) -> AppResult<i64> {
        match self.non_empty(name) {
            Some(value) => value.parse::<i64>().map_err(|error| {
                AppError::Config(format!("invalid {name} value '{value}': {error}"))
            }),
            None => Ok(default),
        }
    }

    fn parse_u64(&self, name: &str, default: u64) -> AppResult<u64> {
        match self.non_empty(name) {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Config(format!("invalid {name} value '{value}': {error}"))
            }),
            None => Ok(default),
        }
    }

    fn parse_duration(
        &self,
        name: &str,
        default: i64,
        to_duration: fn(i64) -> Option<TimeDelta>,
    ) -> AppResult<TimeDelta> {
        let amount = self.parse_i64(name, default)?;
        to_duration(amount)
            .ok_or_else(|| AppError::Config(format!("{name} value '{amount}' is out of range")))
    }

    fn parse_u32(&self, name: &str, default: u32) -> AppResult<u32> {
        match self.non_empty(name) {
            Some(value) => value.parse::<u32>().map_err(|error| {
                AppError::Config(format!("invalid {name} value '{value}': {error}"))
            }),
            None => Ok(default),
        }
    }

    fn parse_usize(&self, name: &str, default: usize) -> AppResult<usize> {
        match self.non_empty(name) {
            Some(value) => value.parse::<usize>().map_err(|error| {
                AppError::Config(format!("invalid {name} value '{value}': {error}"))
            }),
            None => Ok(default),
        }
    }

    fn parse_bool(&self, name: &str, default: bool) -> AppResult<bool> {
        match self.non_empty(name) {
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" => Ok(false),
                _ => Err(AppError::Config(format!(
                    "invalid {name} value '{value}': expected true or false"
                ))),
            },
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use chrono::TimeDelta;
    use tagpulse_core::AppError;
    use tagpulse_domain::Granularity;

    use super::PipelineSettings;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<PipelineSettings, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        PipelineSettings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_follow_the_hashtag_feed() {
        let settings = settings_from(&[]).unwrap_or_else(|_| unreachable!());

        assert_eq!(settings.hashtag, "#21MWithPrivacy");
        assert_eq!(settings.snapshot_key_prefix, "hashtag:21MWithPrivacy");
        assert_eq!(settings.api_base_url, "https://api.x.com");
        assert_eq!(settings.granularity, Granularity::Hour);
        assert_eq!(settings.history_limit, 101);
        assert!(settings.include_retweets);
        assert!(settings.bearer_token.is_none());
        assert_eq!(
            settings.on_demand_cache.cache_control(),
            "s-maxage=60, stale-while-revalidate=600"
        );
        assert_eq!(
            settings.snapshot_cache.cache_control(),
            "s-maxage=30, stale-while-revalidate=300"
        );
    }

    #[test]
    fn overrides_are_applied() {
        let settings = settings_from(&[
            ("X_BEARER_TOKEN", "secret"),
            ("HASHTAG", "#zcash"),
            ("INCLUDE_RETWEETS", "false"),
            ("GRANULARITY", "day"),
            ("HISTORY_LIMIT", "7"),
        ])
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(settings.bearer_token.as_deref(), Some("secret"));
        assert_eq!(settings.snapshot_key_prefix, "hashtag:zcash");
        assert_eq!(settings.granularity, Granularity::Day);

        let query = settings.refresh_query().unwrap_or_else(|_| unreachable!());
        assert_eq!(query.evaluated_query(), "#zcash -is:retweet");

        let snapshot = settings.snapshot_config().unwrap_or_else(|_| unreachable!());
        assert_eq!(snapshot.history_limit(), 7);
        assert_eq!(snapshot.latest_key(), "hashtag:zcash:latest");
    }

    #[test]
    fn non_positive_buffer_is_a_config_error() {
        let result = settings_from(&[("WINDOW_BUFFER_SECONDS", "0")]);

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn oversized_window_buffer_is_a_config_error() {
        for value in ["3600", "10000000000000", "9223372036854775807"] {
            assert!(matches!(
                settings_from(&[("WINDOW_BUFFER_SECONDS", value)]),
                Err(AppError::Config(_))
            ));
        }
    }

    #[test]
    fn oversized_lookback_is_a_config_error() {
        for value in ["169", "100000000000000", "9223372036854775807"] {
            assert!(matches!(
                settings_from(&[("WINDOW_LOOKBACK_HOURS", value)]),
                Err(AppError::Config(_))
            ));
        }

        let weekly = settings_from(&[("WINDOW_LOOKBACK_HOURS", "168")])
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(weekly.window.lookback(), TimeDelta::hours(168));
    }

    #[test]
    fn throttle_fallback_is_bounded() {
        for value in ["0", "1441", "9223372036854775807"] {
            assert!(matches!(
                settings_from(&[("THROTTLE_FALLBACK_MINUTES", value)]),
                Err(AppError::Config(_))
            ));
        }

        let daily = settings_from(&[("THROTTLE_FALLBACK_MINUTES", "1440")])
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(daily.throttle_fallback, TimeDelta::minutes(1440));
    }

    #[test]
    fn upstream_timeout_is_shared_and_bounded() {
        let defaults = settings_from(&[]).unwrap_or_else(|_| unreachable!());
        assert_eq!(defaults.upstream_timeout, Duration::from_secs(15));

        let custom = settings_from(&[("UPSTREAM_TIMEOUT_SECONDS", "5")])
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(custom.upstream_timeout, Duration::from_secs(5));

        assert!(matches!(
            settings_from(&[("UPSTREAM_TIMEOUT_SECONDS", "0")]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn unknown_granularity_is_a_config_error() {
        let result = settings_from(&[("GRANULARITY", "week")]);

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn malformed_numbers_are_config_errors() {
        assert!(matches!(
            settings_from(&[("HISTORY_LIMIT", "lots")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            settings_from(&[("INCLUDE_RETWEETS", "maybe")]),
            Err(AppError::Config(_))
        ));
    }
}
