use serde::{Deserialize, Serialize};
use tagpulse_core::{AppError, AppResult, NonEmptyString};

use crate::TimeWindow;

/// Query modifier that drops retweets from the upstream match set.
pub const RETWEET_EXCLUSION: &str = "-is:retweet";

/// Bucket size requested from the counting endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One bucket per minute.
    Minute,
    /// One bucket per hour.
    #[default]
    Hour,
    /// One bucket per day.
    Day,
}

impl Granularity {
    /// Parses a transport value.
    pub fn parse_transport(value: &str) -> AppResult<Self> {
        match value {
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            _ => Err(AppError::InvalidInput(format!(
                "unknown granularity '{value}', expected minute, hour or day"
            ))),
        }
    }

    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}

/// A validated counting query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountQuery {
    base_query: NonEmptyString,
    include_retweets: bool,
    granularity: Granularity,
}

impl CountQuery {
    /// Creates a counting query; an empty base query is rejected.
    pub fn new(
        base_query: impl Into<String>,
        include_retweets: bool,
        granularity: Granularity,
    ) -> AppResult<Self> {
        let base_query = NonEmptyString::new(base_query).map_err(|_| {
            AppError::InvalidInput("query must not be empty (e.g. %23zec for #zec)".to_owned())
        })?;

        Ok(Self {
            base_query,
            include_retweets,
            granularity,
        })
    }

    /// Returns the caller-supplied query.
    #[must_use]
    pub fn base_query(&self) -> &str {
        self.base_query.as_str()
    }

    /// Returns whether retweets are counted.
    #[must_use]
    pub fn include_retweets(&self) -> bool {
        self.include_retweets
    }

    /// Returns the requested bucket size.
    #[must_use]
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Returns the query string actually sent upstream.
    #[must_use]
    pub fn evaluated_query(&self) -> String {
        if self.include_retweets {
            self.base_query.as_str().to_owned()
        } else {
            format!("{} {RETWEET_EXCLUSION}", self.base_query.as_str())
        }
    }

    /// Returns the ordered request parameters for one window.
    #[must_use]
    pub fn request_params(&self, window: &TimeWindow) -> Vec<(&'static str, String)> {
        vec![
            ("query", self.evaluated_query()),
            ("start_time", window.start_iso()),
            ("end_time", window.end_iso()),
            ("granularity", self.granularity.as_str().to_owned()),
        ]
    }
}
