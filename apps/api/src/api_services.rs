use tagpulse_core::AppError;
use tagpulse_infrastructure::{Pipeline, build_http_client, connect_snapshot_backend};

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let backend = connect_snapshot_backend(config.redis_url.as_deref())?;
    let http_client = build_http_client(config.pipeline.upstream_timeout)?;

    let pipeline = Pipeline::build(&config.pipeline, http_client, backend.store)?;

    Ok(AppState {
        count_service: pipeline.count_service,
        snapshot_store: pipeline.snapshot_store,
        refresh_service: pipeline.refresh_service,
        on_demand_cache: config.pipeline.on_demand_cache,
        snapshot_cache: config.pipeline.snapshot_cache,
        cron_secret: config.cron_secret.clone(),
        redis_client: backend.redis_client,
    })
}
