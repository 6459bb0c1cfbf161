use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tagpulse_core::{AppError, AppResult};

/// Default distance kept between the window end and "now".
pub const DEFAULT_WINDOW_BUFFER_SECONDS: i64 = 30;

/// Default window length.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;

/// Exclusive upper bound of the window buffer.
pub const MAX_WINDOW_BUFFER_SECONDS: i64 = 3_600;

/// Inclusive upper bound of the window length; the recent counts endpoint
/// only covers the last seven days.
pub const MAX_LOOKBACK_HOURS: i64 = 7 * 24;

/// Validated window sizing shared by every pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSettings {
    buffer: TimeDelta,
    lookback: TimeDelta,
}

impl WindowSettings {
    /// Creates window settings.
    ///
    /// The buffer must lie in `(0, 1h)` and the lookback in `(0, 7d]`.
    pub fn new(buffer: TimeDelta, lookback: TimeDelta) -> AppResult<Self> {
        let max_buffer = TimeDelta::seconds(MAX_WINDOW_BUFFER_SECONDS);
        if buffer <= TimeDelta::zero() || buffer >= max_buffer {
            return Err(AppError::InvalidInput(format!(
                "window buffer must be positive and below {MAX_WINDOW_BUFFER_SECONDS}s"
            )));
        }

        let max_lookback = TimeDelta::hours(MAX_LOOKBACK_HOURS);
        if lookback <= TimeDelta::zero() || lookback > max_lookback {
            return Err(AppError::InvalidInput(format!(
                "window lookback must be positive and at most {MAX_LOOKBACK_HOURS}h"
            )));
        }

        Ok(Self { buffer, lookback })
    }

    /// Returns the safety buffer before "now".
    #[must_use]
    pub fn buffer(&self) -> TimeDelta {
        self.buffer
    }

    /// Returns the window length.
    #[must_use]
    pub fn lookback(&self) -> TimeDelta {
        self.lookback
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            buffer: TimeDelta::seconds(DEFAULT_WINDOW_BUFFER_SECONDS),
            lookback: TimeDelta::hours(DEFAULT_LOOKBACK_HOURS),
        }
    }
}

/// Half-open `[start, end)` interval sent to the counting endpoint.
///
/// The upstream rejects windows that end too close to the present, so `end`
/// always trails `now` by the configured buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(rename = "start_time", with = "iso_millis")]
    start: DateTime<Utc>,
    #[serde(rename = "end_time", with = "iso_millis")]
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Derives the window that ends `buffer` before `now`.
    ///
    /// Fails only when the window would leave the representable time range.
    pub fn ending_before(now: DateTime<Utc>, settings: &WindowSettings) -> AppResult<Self> {
        let end = now.checked_sub_signed(settings.buffer);
        let start = end.and_then(|end| end.checked_sub_signed(settings.lookback));

        match (start, end) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(AppError::Internal(format!(
                "counting window before {} is out of range",
                format_iso_millis(&now)
            ))),
        }
    }

    /// Returns the inclusive window start.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the exclusive window end.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns the start rendered the way the upstream expects it.
    #[must_use]
    pub fn start_iso(&self) -> String {
        format_iso_millis(&self.start)
    }

    /// Returns the end rendered the way the upstream expects it.
    #[must_use]
    pub fn end_iso(&self) -> String {
        format_iso_millis(&self.end)
    }
}

/// Renders an instant as RFC 3339 with millisecond precision and a `Z` suffix.
#[must_use]
pub fn format_iso_millis(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(super::format_iso_millis(value).as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(raw.as_str())
            .map(|value| value.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
