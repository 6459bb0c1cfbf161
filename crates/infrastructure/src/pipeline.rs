//! Wiring of the counting and snapshot services from resolved settings.

use std::sync::Arc;
use std::time::Duration;

use tagpulse_application::{
    Clock, CountService, RefreshService, SnapshotKeyValueStore, SnapshotStore, SystemClock,
};
use tagpulse_core::{AppError, AppResult};
use tracing::{info, warn};

use crate::env_settings::PipelineSettings;
use crate::http_counting_api::HttpCountingApi;
use crate::in_memory_snapshot_store::InMemorySnapshotStore;
use crate::redis_snapshot_store::RedisSnapshotStore;

/// Services shared by every surface of one process.
#[derive(Clone)]
pub struct Pipeline {
    /// On-demand counting.
    pub count_service: CountService,
    /// Snapshot persistence and read path.
    pub snapshot_store: SnapshotStore,
    /// Scheduled refresh of the configured hashtag.
    pub refresh_service: RefreshService,
}

impl Pipeline {
    /// Builds the services over an HTTP client and a key-value backend.
    pub fn build(
        settings: &PipelineSettings,
        http_client: reqwest::Client,
        key_value_store: Arc<dyn SnapshotKeyValueStore>,
    ) -> AppResult<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let counting_api = Arc::new(HttpCountingApi::new(
            http_client,
            settings.api_base_url.as_str(),
        )?);

        let count_service =
            CountService::new(counting_api, clock.clone(), settings.pipeline_config());
        let snapshot_store = SnapshotStore::new(
            key_value_store,
            clock,
            settings.snapshot_config()?,
        );
        let refresh_service = RefreshService::new(
            count_service.clone(),
            snapshot_store.clone(),
            settings.refresh_query()?,
        );

        Ok(Self {
            count_service,
            snapshot_store,
            refresh_service,
        })
    }
}

/// Builds the upstream HTTP client shared by every counting request.
pub fn build_http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))
}

/// Key-value backend selected for the process.
#[derive(Clone)]
pub struct SnapshotBackend {
    /// Store handed to the snapshot services.
    pub store: Arc<dyn SnapshotKeyValueStore>,
    /// Redis client, when Redis backs the store.
    pub redis_client: Option<redis::Client>,
}

impl SnapshotBackend {
    /// Returns true when snapshots outlive the process and are visible to
    /// other processes.
    #[must_use]
    pub fn is_durable(&self) -> bool {
        self.redis_client.is_some()
    }
}

/// Selects the snapshot backend: Redis when a URL is configured, otherwise
/// a process-local store.
pub fn connect_snapshot_backend(redis_url: Option<&str>) -> AppResult<SnapshotBackend> {
    match redis_url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => {
            let client = redis::Client::open(url)
                .map_err(|error| AppError::Config(format!("invalid REDIS_URL: {error}")))?;
            info!("snapshot backend: redis");
            Ok(SnapshotBackend {
                store: Arc::new(RedisSnapshotStore::new(client.clone())),
                redis_client: Some(client),
            })
        }
        None => {
            warn!(
                "snapshot backend: in-memory (REDIS_URL not set); snapshots are not shared \
                 across processes and are lost on restart"
            );
            Ok(SnapshotBackend {
                store: Arc::new(InMemorySnapshotStore::new()),
                redis_client: None,
            })
        }
    }
}
