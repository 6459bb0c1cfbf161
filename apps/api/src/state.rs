use tagpulse_application::{CountService, RefreshService, SnapshotStore};
use tagpulse_domain::CachePolicy;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub count_service: CountService,
    pub snapshot_store: SnapshotStore,
    pub refresh_service: RefreshService,
    pub on_demand_cache: CachePolicy,
    pub snapshot_cache: CachePolicy,
    pub cron_secret: Option<String>,
    pub redis_client: Option<redis::Client>,
}
