use chrono::TimeDelta;
use tagpulse_core::{AppError, AppResult};
use tagpulse_domain::{DEFAULT_HISTORY_LIMIT, DEFAULT_THROTTLE_FALLBACK_MINUTES, WindowSettings};

/// Settings shared by the on-demand and scheduled counting paths.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Window sizing.
    pub window: WindowSettings,
    /// Retry delay used when a throttled response carries no reset value.
    pub throttle_fallback: TimeDelta,
    /// Upstream bearer credential; absence is reported per invocation.
    pub bearer_token: Option<String>,
}

impl PipelineConfig {
    /// Creates a pipeline configuration with default window and fallback.
    #[must_use]
    pub fn new(bearer_token: Option<String>) -> Self {
        Self {
            window: WindowSettings::default(),
            throttle_fallback: TimeDelta::minutes(DEFAULT_THROTTLE_FALLBACK_MINUTES),
            bearer_token: bearer_token.filter(|token| !token.trim().is_empty()),
        }
    }
}

/// Key layout and trim bound of the persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotConfig {
    key_prefix: String,
    history_limit: usize,
}

impl SnapshotConfig {
    /// Creates a snapshot configuration.
    pub fn new(key_prefix: impl Into<String>, history_limit: usize) -> AppResult<Self> {
        let key_prefix = key_prefix.into();
        if key_prefix.trim().is_empty() {
            return Err(AppError::Config(
                "snapshot key prefix must not be empty".to_owned(),
            ));
        }

        if history_limit == 0 {
            return Err(AppError::Config(
                "snapshot history limit must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            key_prefix,
            history_limit,
        })
    }

    /// Creates a configuration keyed after a hashtag, e.g. `hashtag:zec`.
    pub fn for_hashtag(hashtag: &str) -> AppResult<Self> {
        Self::new(
            format!("hashtag:{}", hashtag.trim().trim_start_matches('#')),
            DEFAULT_HISTORY_LIMIT,
        )
    }

    /// Key of the overwritten latest result.
    #[must_use]
    pub fn latest_key(&self) -> String {
        format!("{}:latest", self.key_prefix)
    }

    /// Key of the bounded history list.
    #[must_use]
    pub fn history_key(&self) -> String {
        format!("{}:history", self.key_prefix)
    }

    /// Maximum number of history entries kept by each writer.
    #[must_use]
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }
}

#[cfg(test)]
mod tests {
    use super::{PipelineConfig, SnapshotConfig};

    #[test]
    fn hashtag_keys_drop_the_hash_sign() {
        let config =
            SnapshotConfig::for_hashtag("#21MWithPrivacy").unwrap_or_else(|_| unreachable!());
        assert_eq!(config.latest_key(), "hashtag:21MWithPrivacy:latest");
        assert_eq!(config.history_key(), "hashtag:21MWithPrivacy:history");
        assert_eq!(config.history_limit(), 101);
    }

    #[test]
    fn zero_history_limit_is_rejected() {
        assert!(SnapshotConfig::new("hashtag:zec", 0).is_err());
    }

    #[test]
    fn blank_bearer_token_counts_as_missing() {
        assert!(PipelineConfig::new(Some("  ".to_owned())).bearer_token.is_none());
    }
}
