use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tagpulse_core::{AppError, AppResult};
use tagpulse_domain::{RateLimitInfo, RawBucket, RawCounts};
use tokio::sync::Mutex;

use crate::{Clock, CountRequest, CountingApi, FetchOutcome, FetchResponse, SnapshotKeyValueStore};

pub(crate) struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_735_732_800_000)
        .single()
        .unwrap_or_else(|| unreachable!())
}

pub(crate) fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(fixed_now()))
}

pub(crate) fn raw_counts(counts: &[u64]) -> RawCounts {
    RawCounts {
        data: Some(
            counts
                .iter()
                .enumerate()
                .map(|(index, count)| RawBucket {
                    start: format!("2025-01-01T{index:02}:00:00.000Z"),
                    end: format!("2025-01-01T{:02}:00:00.000Z", index + 1),
                    tweet_count: Some(*count),
                })
                .collect(),
        ),
        meta: None,
    }
}

/// Counting API fake that replays one canned response and records requests.
pub(crate) struct FakeCountingApi {
    response: FetchResponse,
    pub requests: Mutex<Vec<(CountRequest, String)>>,
    pub calls: AtomicUsize,
}

impl FakeCountingApi {
    pub(crate) fn new(response: FetchResponse) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn success(counts: &[u64]) -> Self {
        Self::new(FetchResponse {
            rate_limit: RateLimitInfo {
                remaining: Some(299),
                limit: Some(300),
                reset: Some(fixed_now().timestamp() + 900),
            },
            outcome: FetchOutcome::Success(raw_counts(counts)),
        })
    }

    pub(crate) fn throttled(reset: Option<i64>) -> Self {
        Self::new(FetchResponse {
            rate_limit: RateLimitInfo {
                remaining: Some(0),
                limit: Some(300),
                reset,
            },
            outcome: FetchOutcome::Throttled,
        })
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CountingApi for FakeCountingApi {
    async fn fetch_counts(
        &self,
        request: &CountRequest,
        bearer_token: &str,
    ) -> AppResult<FetchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .await
            .push((request.clone(), bearer_token.to_owned()));
        Ok(self.response.clone())
    }
}

/// Key-value fake with list semantics matching the persisted store.
#[derive(Default)]
pub(crate) struct FakeKeyValueStore {
    pub scalars: Mutex<HashMap<String, String>>,
    pub lists: Mutex<HashMap<String, Vec<String>>>,
    pub fail_writes: bool,
}

impl FakeKeyValueStore {
    pub(crate) fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    fn check_writable(&self) -> AppResult<()> {
        if self.fail_writes {
            return Err(AppError::Internal("store unavailable".to_owned()));
        }

        Ok(())
    }
}

#[async_trait]
impl SnapshotKeyValueStore for FakeKeyValueStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.scalars.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        self.check_writable()?;
        self.scalars.lock().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn push_front(&self, key: &str, value: String) -> AppResult<()> {
        self.check_writable()?;
        self.lists
            .lock()
            .await
            .entry(key.to_owned())
            .or_default()
            .insert(0, value);
        Ok(())
    }

    async fn range(&self, key: &str, start: usize, stop: usize) -> AppResult<Vec<String>> {
        Ok(self
            .lists
            .lock()
            .await
            .get(key)
            .map(|list| {
                list.iter()
                    .skip(start)
                    .take(stop.saturating_sub(start).saturating_add(1))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn trim(&self, key: &str, start: usize, stop: usize) -> AppResult<()> {
        self.check_writable()?;
        if let Some(list) = self.lists.lock().await.get_mut(key) {
            let kept: Vec<String> = list
                .iter()
                .skip(start)
                .take(stop.saturating_sub(start).saturating_add(1))
                .cloned()
                .collect();
            *list = kept;
        }
        Ok(())
    }
}
