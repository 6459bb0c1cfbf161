//! Tagpulse scheduled refresh worker.

#![forbid(unsafe_code)]

use std::env;
use std::time::Duration;

use tagpulse_application::{RefreshOutcome, RefreshService};
use tagpulse_core::{AppError, AppResult};
use tagpulse_infrastructure::{
    Pipeline, PipelineSettings, build_http_client, connect_snapshot_backend,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_REFRESH_INTERVAL_SECONDS: u64 = 900;

#[derive(Debug, Clone)]
struct WorkerConfig {
    run_once: bool,
    redis_url: String,
    refresh_interval_seconds: u64,
    pipeline: PipelineSettings,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let backend = connect_snapshot_backend(Some(config.redis_url.as_str()))?;
    let http_client = build_http_client(config.pipeline.upstream_timeout)?;
    let pipeline = Pipeline::build(&config.pipeline, http_client, backend.store)?;
    let refresh_service = pipeline.refresh_service;

    info!(
        hashtag = %config.pipeline.hashtag,
        evaluated_query = %refresh_service.query().evaluated_query(),
        refresh_interval_seconds = config.refresh_interval_seconds,
        run_once = config.run_once,
        "tagpulse-worker started"
    );

    if config.run_once {
        return run_refresh(&refresh_service).await.map(|_| ());
    }

    let mut interval = tokio::time::interval(Duration::from_secs(config.refresh_interval_seconds));
    loop {
        interval.tick().await;

        if let Err(error) = run_refresh(&refresh_service).await {
            error!(error = %error, "snapshot refresh failed");
        }
    }
}

async fn run_refresh(refresh_service: &RefreshService) -> AppResult<RefreshOutcome> {
    let outcome = refresh_service.run().await?;

    match &outcome {
        RefreshOutcome::Persisted { total, rate_limit } => info!(
            total = *total,
            remaining = ?rate_limit.remaining,
            reset = ?rate_limit.reset,
            "snapshot refresh persisted"
        ),
        RefreshOutcome::SkippedThrottled { rate_limit, retry } => info!(
            retry_at = %retry.retry_at,
            retry_after_seconds = retry.retry_after_seconds,
            reset = ?rate_limit.reset,
            "snapshot refresh skipped: rate limited"
        ),
        RefreshOutcome::UpstreamError(failure) => warn!(
            status = ?failure.status,
            body = %failure.body,
            remaining = ?failure.rate_limit.remaining,
            "snapshot refresh failed upstream"
        ),
        RefreshOutcome::ConfigError(message) => warn!(
            message = %message,
            "snapshot refresh not configured"
        ),
    }

    Ok(outcome)
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let run_once = env::args().nth(1).as_deref() == Some("once");
        Self::from_lookup(run_once, |name| env::var(name).ok())
    }

    fn from_lookup<F>(run_once: bool, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // The read path lives in another process, so snapshots must be shared.
        let redis_url = lookup("REDIS_URL")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AppError::Config("REDIS_URL is required by the refresh worker".to_owned())
            })?;

        let refresh_interval_seconds = match lookup("REFRESH_INTERVAL_SECONDS") {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Config(format!(
                    "invalid REFRESH_INTERVAL_SECONDS value '{value}': {error}"
                ))
            })?,
            None => DEFAULT_REFRESH_INTERVAL_SECONDS,
        };
        if refresh_interval_seconds == 0 {
            return Err(AppError::Config(
                "REFRESH_INTERVAL_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            run_once,
            redis_url,
            refresh_interval_seconds,
            pipeline: PipelineSettings::from_lookup(&lookup)?,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
